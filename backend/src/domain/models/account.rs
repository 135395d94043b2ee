//! Account domain entity with a kind-specific policy.
//!
//! Checking and savings accounts share the same balance state machine but
//! differ in overdraft, fee and yield rules. The policy is a tagged variant
//! carried on the account; every rule that varies by kind matches on it.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BankError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    Checking,
    Savings,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Checking => "CHECKING",
            AccountKind::Savings => "SAVINGS",
        }
    }

    /// Parse a wire-level kind string, case-insensitively.
    pub fn parse(value: &str) -> Result<Self, BankError> {
        match value.to_ascii_uppercase().as_str() {
            "CHECKING" => Ok(AccountKind::Checking),
            "SAVINGS" => Ok(AccountKind::Savings),
            _ => Err(BankError::UnknownAccountKind(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckingPolicy {
    /// How far below zero the balance may go.
    pub overdraft_limit: Decimal,
    /// Monthly fee; informational only, never deducted automatically.
    pub maintenance_fee: Decimal,
}

impl Default for CheckingPolicy {
    fn default() -> Self {
        Self {
            overdraft_limit: Decimal::new(100_000, 2), // 1000.00
            maintenance_fee: Decimal::new(1_500, 2),   // 15.00
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsPolicy {
    /// Monthly yield rate, e.g. 0.0070 for 0.70%.
    pub yield_rate: Decimal,
    pub last_yield_applied_at: Option<DateTime<Utc>>,
    /// Day of month (1-28) the account earns its yield.
    pub anniversary_day: u8,
}

impl SavingsPolicy {
    /// Defaults for a savings account opened at `now`. Months shorter than
    /// 31 days force the anniversary into the 1-28 range.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            yield_rate: Decimal::new(70, 4), // 0.0070 monthly
            last_yield_applied_at: None,
            anniversary_day: now.day().min(28) as u8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AccountPolicy {
    Checking(CheckingPolicy),
    Savings(SavingsPolicy),
}

impl AccountPolicy {
    pub fn for_kind(kind: AccountKind, now: DateTime<Utc>) -> Self {
        match kind {
            AccountKind::Checking => AccountPolicy::Checking(CheckingPolicy::default()),
            AccountKind::Savings => AccountPolicy::Savings(SavingsPolicy::new(now)),
        }
    }

    pub fn kind(&self) -> AccountKind {
        match self {
            AccountPolicy::Checking(_) => AccountKind::Checking,
            AccountPolicy::Savings(_) => AccountKind::Savings,
        }
    }
}

/// Fields for an account that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub number: String,
    pub customer_id: i64,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub policy: AccountPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    /// System-generated, unique, immutable once assigned.
    pub number: String,
    pub customer_id: i64,
    /// Scale-2 decimal. May go negative only within the overdraft limit.
    pub balance: Decimal,
    /// Soft-delete marker; inactive accounts reject every operation.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub policy: AccountPolicy,
}

impl Account {
    pub fn kind(&self) -> AccountKind {
        self.policy.kind()
    }

    /// Overdraft headroom for the kind; zero for savings.
    pub fn overdraft_limit(&self) -> Decimal {
        match &self.policy {
            AccountPolicy::Checking(p) => p.overdraft_limit,
            AccountPolicy::Savings(_) => Decimal::ZERO,
        }
    }

    /// Balance plus overdraft headroom: the most that can be withdrawn.
    pub fn available_balance(&self) -> Decimal {
        self.balance + self.overdraft_limit()
    }

    pub fn deposit(&mut self, amount: Decimal) -> Result<(), BankError> {
        ensure_positive(amount)?;
        self.ensure_active()?;
        self.balance += amount;
        Ok(())
    }

    /// Debit `amount`, honoring the kind's overdraft rule. Savings has zero
    /// overdraft, so its balance can never go negative here.
    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), BankError> {
        ensure_positive(amount)?;
        self.ensure_active()?;
        if self.available_balance() < amount {
            return Err(BankError::InsufficientFunds {
                available: self.available_balance(),
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Transfer eligibility: active, positive amount, enough headroom.
    pub fn can_transfer(&self, amount: Decimal) -> bool {
        self.active && amount > Decimal::ZERO && self.available_balance() >= amount
    }

    /// Monthly maintenance fee; zero for savings. Never auto-deducted.
    pub fn maintenance_fee(&self) -> Decimal {
        match &self.policy {
            AccountPolicy::Checking(p) => p.maintenance_fee,
            AccountPolicy::Savings(_) => Decimal::ZERO,
        }
    }

    pub fn is_overdrawn(&self) -> bool {
        self.balance < Decimal::ZERO
    }

    /// Portion of the overdraft limit currently consumed.
    pub fn overdraft_in_use(&self) -> Decimal {
        if self.is_overdrawn() {
            self.balance.abs()
        } else {
            Decimal::ZERO
        }
    }

    /// Change the overdraft limit of a checking account.
    pub fn set_overdraft_limit(&mut self, limit: Decimal) -> Result<(), BankError> {
        if limit < Decimal::ZERO {
            return Err(BankError::validation(
                "overdraftLimit",
                "overdraft limit must be zero or positive",
            ));
        }
        match &mut self.policy {
            AccountPolicy::Checking(p) => {
                p.overdraft_limit = limit;
                Ok(())
            }
            AccountPolicy::Savings(_) => Err(BankError::UnsupportedForKind { kind: "savings" }),
        }
    }

    /// One month of yield on the current balance, rounded to cents. Pure.
    pub fn projected_yield(&self) -> Result<Decimal, BankError> {
        match &self.policy {
            AccountPolicy::Savings(p) => Ok((self.balance * p.yield_rate).round_dp(2)),
            AccountPolicy::Checking(_) => Err(BankError::UnsupportedForKind { kind: "checking" }),
        }
    }

    /// Credit one month of yield and stamp the application time. Only
    /// positive balances earn; zero or negative balances are a no-op.
    /// Callable on demand only, there is no scheduler.
    pub fn apply_yield(&mut self, now: DateTime<Utc>) -> Result<Decimal, BankError> {
        let earned = self.projected_yield()?;
        if self.balance <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        self.balance += earned;
        if let AccountPolicy::Savings(p) = &mut self.policy {
            p.last_yield_applied_at = Some(now);
        }
        Ok(earned)
    }

    /// Compound yield projection over `months`, without mutating the balance.
    pub fn accumulated_yield(&self, months: u32) -> Result<Decimal, BankError> {
        let rate = match &self.policy {
            AccountPolicy::Savings(p) => p.yield_rate,
            AccountPolicy::Checking(_) => {
                return Err(BankError::UnsupportedForKind { kind: "checking" })
            }
        };
        let mut balance = self.balance;
        let mut total = Decimal::ZERO;
        for _ in 0..months {
            let earned = (balance * rate).round_dp(2);
            total += earned;
            balance += earned;
        }
        Ok(total)
    }

    /// Whether `today` is the savings anniversary day. Always false for
    /// checking accounts.
    pub fn is_anniversary(&self, today: DateTime<Utc>) -> bool {
        matches!(&self.policy, AccountPolicy::Savings(p) if u32::from(p.anniversary_day) == today.day())
    }

    fn ensure_active(&self) -> Result<(), BankError> {
        if !self.active {
            return Err(BankError::AccountInactive);
        }
        Ok(())
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), BankError> {
    if amount <= Decimal::ZERO {
        return Err(BankError::InvalidAmount);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn checking(balance_cents: i64) -> Account {
        Account {
            id: 1,
            number: "0000000001".to_string(),
            customer_id: 1,
            balance: dec(balance_cents),
            active: true,
            created_at: Utc::now(),
            policy: AccountPolicy::Checking(CheckingPolicy::default()),
        }
    }

    fn savings(balance_cents: i64) -> Account {
        Account {
            id: 2,
            number: "0000000002".to_string(),
            customer_id: 1,
            balance: dec(balance_cents),
            active: true,
            created_at: Utc::now(),
            policy: AccountPolicy::Savings(SavingsPolicy::new(Utc::now())),
        }
    }

    #[test]
    fn deposit_then_withdraw_restores_balance_exactly() {
        let mut account = checking(10_000);
        account.deposit(dec(3_333)).unwrap();
        account.withdraw(dec(3_333)).unwrap();
        assert_eq!(account.balance, dec(10_000));
    }

    #[test]
    fn deposit_rejects_non_positive_amounts() {
        let mut account = checking(10_000);
        assert!(matches!(account.deposit(Decimal::ZERO), Err(BankError::InvalidAmount)));
        assert!(matches!(account.deposit(dec(-500)), Err(BankError::InvalidAmount)));
        assert_eq!(account.balance, dec(10_000));
    }

    #[test]
    fn withdraw_rejects_non_positive_amounts_regardless_of_balance() {
        let mut account = checking(1_000_000);
        assert!(matches!(account.withdraw(Decimal::ZERO), Err(BankError::InvalidAmount)));
        assert!(matches!(account.withdraw(dec(-1)), Err(BankError::InvalidAmount)));
    }

    #[test]
    fn inactive_account_rejects_both_directions() {
        let mut account = checking(10_000);
        account.active = false;
        assert!(matches!(account.deposit(dec(100)), Err(BankError::AccountInactive)));
        assert!(matches!(account.withdraw(dec(100)), Err(BankError::AccountInactive)));
        assert!(!account.can_transfer(dec(100)));
    }

    #[test]
    fn checking_can_dip_into_overdraft() {
        // Balance 100.00, limit 1000.00, withdraw 500.00 -> -400.00
        let mut account = checking(10_000);
        account.withdraw(dec(50_000)).unwrap();
        assert_eq!(account.balance, dec(-40_000));
        assert!(account.is_overdrawn());
        assert_eq!(account.overdraft_in_use(), dec(40_000));
    }

    #[test]
    fn checking_cannot_exceed_overdraft() {
        let mut account = checking(10_000);
        let err = account.withdraw(dec(110_001)).unwrap_err();
        match err {
            BankError::InsufficientFunds { available } => assert_eq!(available, dec(110_000)),
            other => panic!("expected insufficient funds, got {other:?}"),
        }
        assert_eq!(account.balance, dec(10_000));
    }

    #[test]
    fn savings_never_goes_negative() {
        // Balance 100.00, withdraw 150.00 -> rejected, balance unchanged.
        let mut account = savings(10_000);
        let err = account.withdraw(dec(15_000)).unwrap_err();
        match err {
            BankError::InsufficientFunds { available } => assert_eq!(available, dec(10_000)),
            other => panic!("expected insufficient funds, got {other:?}"),
        }
        assert_eq!(account.balance, dec(10_000));
    }

    #[test]
    fn savings_can_spend_down_to_zero() {
        let mut account = savings(10_000);
        account.withdraw(dec(10_000)).unwrap();
        assert_eq!(account.balance, Decimal::ZERO);
    }

    #[test]
    fn balance_never_drops_below_negative_overdraft_limit() {
        let mut account = checking(0);
        account.withdraw(dec(100_000)).unwrap();
        assert_eq!(account.balance, -account.overdraft_limit());
        assert!(matches!(
            account.withdraw(dec(1)),
            Err(BankError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn can_transfer_matches_withdraw_headroom() {
        let checking = checking(10_000);
        assert!(checking.can_transfer(dec(110_000)));
        assert!(!checking.can_transfer(dec(110_001)));
        assert!(!checking.can_transfer(Decimal::ZERO));
        assert!(!checking.can_transfer(dec(-100)));

        let savings = savings(10_000);
        assert!(savings.can_transfer(dec(10_000)));
        assert!(!savings.can_transfer(dec(10_001)));
    }

    #[test]
    fn fees_depend_on_kind() {
        assert_eq!(checking(0).maintenance_fee(), dec(1_500));
        assert_eq!(savings(0).maintenance_fee(), Decimal::ZERO);
        assert_eq!(savings(0).overdraft_limit(), Decimal::ZERO);
    }

    #[test]
    fn projected_yield_is_pure_and_rounded() {
        let account = savings(100_000); // 1000.00 * 0.0070 = 7.00
        assert_eq!(account.projected_yield().unwrap(), dec(700));
        assert_eq!(account.balance, dec(100_000));
    }

    #[test]
    fn apply_yield_credits_and_stamps() {
        let mut account = savings(100_000);
        let now = Utc::now();
        let earned = account.apply_yield(now).unwrap();
        assert_eq!(earned, dec(700));
        assert_eq!(account.balance, dec(100_700));
        match &account.policy {
            AccountPolicy::Savings(p) => assert_eq!(p.last_yield_applied_at, Some(now)),
            other => panic!("expected savings policy, got {other:?}"),
        }
    }

    #[test]
    fn apply_yield_skips_non_positive_balances() {
        let mut account = savings(0);
        assert_eq!(account.apply_yield(Utc::now()).unwrap(), Decimal::ZERO);
        assert_eq!(account.balance, Decimal::ZERO);
        match &account.policy {
            AccountPolicy::Savings(p) => assert!(p.last_yield_applied_at.is_none()),
            other => panic!("expected savings policy, got {other:?}"),
        }
    }

    #[test]
    fn yield_operations_reject_checking_accounts() {
        let mut account = checking(100_000);
        assert!(matches!(
            account.projected_yield(),
            Err(BankError::UnsupportedForKind { .. })
        ));
        assert!(matches!(
            account.apply_yield(Utc::now()),
            Err(BankError::UnsupportedForKind { .. })
        ));
        assert!(matches!(
            account.accumulated_yield(3),
            Err(BankError::UnsupportedForKind { .. })
        ));
    }

    #[test]
    fn accumulated_yield_compounds_monthly() {
        let account = savings(100_000);
        // 7.00 + 7.05 (0.0070 * 1007.00, rounded) = 14.05
        assert_eq!(account.accumulated_yield(2).unwrap(), dec(1_405));
        assert_eq!(account.balance, dec(100_000));
        assert_eq!(account.accumulated_yield(0).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn overdraft_limit_can_be_raised_on_checking_only() {
        let mut account = checking(0);
        account.set_overdraft_limit(dec(200_000)).unwrap();
        assert_eq!(account.overdraft_limit(), dec(200_000));
        assert!(account.set_overdraft_limit(dec(-1)).is_err());

        let mut savings = savings(0);
        assert!(matches!(
            savings.set_overdraft_limit(dec(100)),
            Err(BankError::UnsupportedForKind { .. })
        ));
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(AccountKind::parse("checking").unwrap(), AccountKind::Checking);
        assert_eq!(AccountKind::parse("SAVINGS").unwrap(), AccountKind::Savings);
        assert_eq!(AccountKind::parse("Savings").unwrap(), AccountKind::Savings);
        assert!(matches!(
            AccountKind::parse("premium"),
            Err(BankError::UnknownAccountKind(_))
        ));
    }

    #[test]
    fn anniversary_day_stays_within_month_bounds() {
        let policy = SavingsPolicy::new(Utc::now());
        assert!((1..=28).contains(&policy.anniversary_day));
    }
}
