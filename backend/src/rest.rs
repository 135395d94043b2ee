use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use crate::domain::account_service::{
    AccountService, AccountView, CreateAccountCommand, TransferOutcome,
};
use crate::domain::export_service::ExportService;
use crate::domain::models::account::AccountPolicy;
use crate::domain::models::customer::Customer as DomainCustomer;
use crate::domain::models::transaction::Transaction as DomainTransaction;
use crate::error::BankError;
use crate::storage::SqliteStore;

/// Application state containing the account and export services.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService<SqliteStore>,
    pub export: ExportService<SqliteStore>,
}

impl AppState {
    pub fn new(store: SqliteStore) -> Self {
        Self {
            accounts: AccountService::new(store.clone()),
            export: ExportService::new(store),
        }
    }
}

/// Build the full application router over the given state.
pub fn router(state: AppState) -> Router {
    // Static segments are registered alongside `/accounts/:id` and take
    // precedence, so "export" and "ping" never parse as account ids.
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/export", get(export_accounts))
        .route("/accounts/ping", get(ping))
        .route("/accounts/:id", get(get_account))
        .route("/accounts/:id/deposit", post(deposit))
        .route("/accounts/:id/withdraw", post(withdraw))
        .route("/accounts/:id/transactions", get(list_account_transactions))
        .route("/transfers", post(transfer))
        .with_state(state)
}

/// Axum handler for GET /accounts
pub async fn list_accounts(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, BankError> {
    info!("GET /accounts");
    let views = state.accounts.list_accounts().await?;
    let accounts: Vec<shared::Account> = views.into_iter().map(account_to_dto).collect();
    Ok(Json(accounts))
}

/// Axum handler for POST /accounts
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<shared::CreateAccountRequest>,
) -> Result<impl IntoResponse, BankError> {
    info!("POST /accounts - nationalId: {}", request.national_id);
    let view = state
        .accounts
        .create_account(CreateAccountCommand {
            customer_name: request.customer_name,
            national_id: request.national_id,
            initial_balance: request.initial_balance,
            kind: request.kind,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(account_to_dto(view))))
}

/// Axum handler for GET /accounts/:id
pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, BankError> {
    info!("GET /accounts/{}", id);
    let view = state.accounts.get_account(id).await?;
    Ok(Json(account_to_dto(view)))
}

/// Axum handler for POST /accounts/:id/deposit
pub async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<shared::OperationRequest>,
) -> Result<impl IntoResponse, BankError> {
    info!("POST /accounts/{}/deposit - amount: {}", id, request.amount);
    let view = state
        .accounts
        .deposit(id, request.amount, request.description)
        .await?;
    Ok(Json(account_to_dto(view)))
}

/// Axum handler for POST /accounts/:id/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<shared::OperationRequest>,
) -> Result<impl IntoResponse, BankError> {
    info!("POST /accounts/{}/withdraw - amount: {}", id, request.amount);
    let view = state
        .accounts
        .withdraw(id, request.amount, request.description)
        .await?;
    Ok(Json(account_to_dto(view)))
}

/// Axum handler for POST /transfers
pub async fn transfer(
    State(state): State<AppState>,
    Json(request): Json<shared::TransferRequest>,
) -> Result<impl IntoResponse, BankError> {
    info!(
        "POST /transfers - {} -> {} amount: {}",
        request.source_id, request.dest_id, request.amount
    );
    let outcome = state
        .accounts
        .transfer(
            request.source_id,
            request.dest_id,
            request.amount,
            request.description,
        )
        .await?;
    Ok(Json(transfer_to_dto(outcome)))
}

/// Axum handler for GET /accounts/:id/transactions
pub async fn list_account_transactions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, BankError> {
    info!("GET /accounts/{}/transactions", id);
    let entries = state.accounts.history(id).await?;
    let transactions: Vec<shared::Transaction> =
        entries.into_iter().map(transaction_to_dto).collect();
    Ok(Json(transactions))
}

/// Axum handler for GET /accounts/export
pub async fn export_accounts(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, BankError> {
    info!("GET /accounts/export");
    let csv = state.export.export_accounts_csv().await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        csv,
    ))
}

/// Axum handler for GET /accounts/ping
pub async fn ping() -> &'static str {
    "Banking service is up"
}

fn account_to_dto(view: AccountView) -> shared::Account {
    let AccountView { account, customer } = view;
    let kind = account.kind().as_str().to_string();
    let (overdraft_limit, maintenance_fee, yield_rate, anniversary_day) = match &account.policy {
        AccountPolicy::Checking(p) => {
            (Some(p.overdraft_limit), Some(p.maintenance_fee), None, None)
        }
        AccountPolicy::Savings(p) => (None, None, Some(p.yield_rate), Some(p.anniversary_day)),
    };
    shared::Account {
        id: account.id,
        number: account.number,
        kind,
        balance: account.balance,
        active: account.active,
        created_at: account.created_at,
        customer: customer_to_dto(customer),
        overdraft_limit,
        maintenance_fee,
        yield_rate,
        anniversary_day,
    }
}

fn customer_to_dto(customer: DomainCustomer) -> shared::Customer {
    shared::Customer {
        id: customer.id,
        name: customer.name,
        national_id: customer.national_id,
        created_at: customer.created_at,
    }
}

fn transaction_to_dto(entry: DomainTransaction) -> shared::Transaction {
    shared::Transaction {
        id: entry.id,
        kind: entry.kind.as_str().to_string(),
        amount: entry.amount,
        description: entry.description,
        occurred_at: entry.occurred_at,
        source_account_id: entry.source_account_id,
        destination_account_id: entry.destination_account_id,
    }
}

fn transfer_to_dto(outcome: TransferOutcome) -> shared::TransferResponse {
    shared::TransferResponse {
        amount: outcome.entry.amount,
        description: outcome.entry.description.clone(),
        occurred_at: outcome.entry.occurred_at,
        source_account: account_to_dto(outcome.source),
        destination_account: account_to_dto(outcome.destination),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    async fn setup_test_app() -> Router {
        let store = SqliteStore::init_test().await.expect("test db");
        router(AppState::new(store))
    }

    async fn send_json(
        app: &Router,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    async fn get_raw(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    async fn create_checking(app: &Router, national_id: &str, balance: &str) -> serde_json::Value {
        let (status, body) = send_json(
            app,
            "POST",
            "/accounts",
            serde_json::json!({
                "customerName": "Ana Souza",
                "nationalId": national_id,
                "initialBalance": balance,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    #[tokio::test]
    async fn create_account_returns_201_with_camel_case_body() {
        let app = setup_test_app().await;
        let body = create_checking(&app, "12345678901", "100.00").await;

        assert_eq!(body["kind"], "CHECKING");
        assert_eq!(body["balance"], "100.00");
        assert_eq!(body["active"], true);
        assert_eq!(body["customer"]["nationalId"], "12345678901");
        assert_eq!(body["overdraftLimit"], "1000.00");
        assert_eq!(body["maintenanceFee"], "15.00");
        // Savings-only fields are absent, not null.
        assert!(body.get("yieldRate").is_none());
    }

    #[tokio::test]
    async fn savings_account_exposes_yield_fields_only() {
        let app = setup_test_app().await;
        let (status, body) = send_json(
            &app,
            "POST",
            "/accounts",
            serde_json::json!({
                "customerName": "Ana Souza",
                "nationalId": "12345678901",
                "initialBalance": "0.00",
                "kind": "savings",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["kind"], "SAVINGS");
        assert_eq!(body["yieldRate"], "0.0070");
        assert!(body.get("overdraftLimit").is_none());
    }

    #[tokio::test]
    async fn invalid_national_id_maps_to_400_payload() {
        let app = setup_test_app().await;
        let (status, body) = send_json(
            &app,
            "POST",
            "/accounts",
            serde_json::json!({
                "customerName": "Ana Souza",
                "nationalId": "11111111111",
                "initialBalance": "0.00",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["code"], "INVALID_NATIONAL_ID");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unknown_account_maps_to_404_payload() {
        let app = setup_test_app().await;
        let (status, body) = get_raw(&app, "/accounts/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["code"], "RESOURCE_NOT_FOUND");
    }

    #[tokio::test]
    async fn deposit_and_withdraw_round_trip_via_http() {
        let app = setup_test_app().await;
        let account = create_checking(&app, "12345678901", "100.00").await;
        let id = account["id"].as_i64().unwrap();

        let (status, body) = send_json(
            &app,
            "POST",
            &format!("/accounts/{id}/deposit"),
            serde_json::json!({"amount": "25.50", "description": "top up"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], "125.50");

        let (status, body) = send_json(
            &app,
            "POST",
            &format!("/accounts/{id}/withdraw"),
            serde_json::json!({"amount": "25.50"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], "100.00");
    }

    #[tokio::test]
    async fn insufficient_savings_withdrawal_is_a_400() {
        let app = setup_test_app().await;
        let (_, account) = send_json(
            &app,
            "POST",
            "/accounts",
            serde_json::json!({
                "customerName": "Ana Souza",
                "nationalId": "12345678901",
                "initialBalance": "100.00",
                "kind": "SAVINGS",
            }),
        )
        .await;
        let id = account["id"].as_i64().unwrap();

        let (status, body) = send_json(
            &app,
            "POST",
            &format!("/accounts/{id}/withdraw"),
            serde_json::json!({"amount": "150.00"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INSUFFICIENT_FUNDS");
    }

    #[tokio::test]
    async fn transfer_returns_both_accounts_and_history_shows_one_record() {
        let app = setup_test_app().await;
        let source = create_checking(&app, "12345678901", "200.00").await;
        let dest = create_checking(&app, "10987654321", "10.00").await;
        let source_id = source["id"].as_i64().unwrap();
        let dest_id = dest["id"].as_i64().unwrap();

        let (status, body) = send_json(
            &app,
            "POST",
            "/transfers",
            serde_json::json!({
                "sourceId": source_id,
                "destId": dest_id,
                "amount": "50.00",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["sourceAccount"]["balance"], "150.00");
        assert_eq!(body["destinationAccount"]["balance"], "60.00");

        for id in [source_id, dest_id] {
            let (status, history) = get_raw(&app, &format!("/accounts/{id}/transactions")).await;
            assert_eq!(status, StatusCode::OK);
            let entries: Vec<serde_json::Value> = serde_json::from_str(&history).unwrap();
            let transfers: Vec<_> = entries
                .iter()
                .filter(|t| t["kind"] == "TRANSFER")
                .collect();
            assert_eq!(transfers.len(), 1);
            assert_eq!(transfers[0]["sourceAccountId"].as_i64(), Some(source_id));
            assert_eq!(transfers[0]["destinationAccountId"].as_i64(), Some(dest_id));
        }
    }

    #[tokio::test]
    async fn transfer_to_same_account_is_a_400() {
        let app = setup_test_app().await;
        let account = create_checking(&app, "12345678901", "100.00").await;
        let id = account["id"].as_i64().unwrap();

        let (status, body) = send_json(
            &app,
            "POST",
            "/transfers",
            serde_json::json!({"sourceId": id, "destId": id, "amount": "10.00"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "SAME_ACCOUNT");
    }

    #[tokio::test]
    async fn export_is_plain_text_csv_and_does_not_shadow_account_routes() {
        let app = setup_test_app().await;
        create_checking(&app, "12345678901", "123.45").await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/accounts/export")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let csv = String::from_utf8_lossy(&bytes);
        assert!(csv.starts_with("ID,Number,Balance,Customer,NationalId,CreatedAt\n"));
        assert!(csv.contains("123.45"));
    }

    #[tokio::test]
    async fn ping_answers_on_the_static_route() {
        let app = setup_test_app().await;
        let (status, body) = get_raw(&app, "/accounts/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Banking service is up");
    }

    #[tokio::test]
    async fn list_accounts_returns_every_active_account() {
        let app = setup_test_app().await;
        create_checking(&app, "12345678901", "1.00").await;
        create_checking(&app, "10987654321", "2.00").await;

        let (status, body) = get_raw(&app, "/accounts").await;
        assert_eq!(status, StatusCode::OK);
        let accounts: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(accounts.len(), 2);
    }
}
