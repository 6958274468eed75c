//! Ledger domain types for accounts and income/expense transactions.

use chrono::{DateTime, Utc};
use fintrack_shared::types::{AccountId, TransactionId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::recurring::RecurringInterval;

/// Kind of account a user holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    /// Everyday current (checking) account.
    Current,
    /// Savings account.
    Savings,
}

/// Direction of a transaction's effect on its account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Money in: balance increases by the amount.
    Income,
    /// Money out: balance decreases by the amount.
    Expense,
}

impl TransactionType {
    /// Signed balance effect of `amount` for this direction.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }
}

/// Lifecycle status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// A settled, non-recurring transaction.
    Active,
    /// A recurring template waiting for its next occurrence.
    Scheduled,
    /// A recurring template whose catch-up hit the safety bound.
    ///
    /// The scheduler no longer picks it up; it needs manual attention.
    OverdueTruncated,
}

/// A user's financial account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Account kind.
    pub account_type: AccountType,
    /// Current balance.
    pub balance: Decimal,
    /// Balance the account was opened with.
    pub opening_balance: Decimal,
    /// Whether this is the user's default account.
    pub is_default: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Optimistic-concurrency version, bumped on every committed change.
    pub version: i64,
}

/// Account annotated with how many transactions reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    /// The account.
    #[serde(flatten)]
    pub account: Account,
    /// Number of transactions recorded against the account.
    pub transaction_count: u64,
}

/// Caller-supplied fields of a transaction, used for create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFields {
    /// Account the transaction is recorded against.
    pub account_id: AccountId,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Open-ended category label.
    pub category: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// When the transaction happened.
    pub date: DateTime<Utc>,
    /// Whether the transaction repeats.
    pub is_recurring: bool,
    /// Repeat interval, present iff `is_recurring`.
    pub recurring_interval: Option<RecurringInterval>,
}

impl TransactionFields {
    /// Creates fields for a one-off transaction.
    #[must_use]
    pub fn one_off(
        account_id: AccountId,
        transaction_type: TransactionType,
        amount: Decimal,
        category: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            transaction_type,
            amount,
            category: category.into(),
            description: None,
            date,
            is_recurring: false,
            recurring_interval: None,
        }
    }

    /// Turns these fields into a recurring template.
    #[must_use]
    pub fn recurring(mut self, interval: RecurringInterval) -> Self {
        self.is_recurring = true;
        self.recurring_interval = Some(interval);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Signed balance effect of these fields.
    #[must_use]
    pub fn signed_delta(&self) -> Decimal {
        self.transaction_type.signed(self.amount)
    }
}

/// A recorded income or expense transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Owning user.
    pub user_id: UserId,
    /// Account the transaction is recorded against.
    pub account_id: AccountId,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Open-ended category label.
    pub category: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// When the transaction happened.
    pub date: DateTime<Utc>,
    /// Whether the transaction repeats.
    pub is_recurring: bool,
    /// Repeat interval, present iff `is_recurring`.
    pub recurring_interval: Option<RecurringInterval>,
    /// Next occurrence to materialize, present only when `is_recurring`.
    pub next_occurrence_date: Option<DateTime<Utc>>,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// When the scheduler last materialized an occurrence of this template.
    pub last_processed: Option<DateTime<Utc>>,
    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
    /// When the transaction was last updated.
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency version, bumped on every committed change.
    pub version: i64,
}
