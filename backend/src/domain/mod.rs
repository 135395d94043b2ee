//! Domain layer: entities and the services that orchestrate them.

pub mod account_service;
pub mod export_service;
pub mod models;
