//! Ledger error types for input validation.
//!
//! Every variant describes malformed input. They are raised before any
//! mutation is attempted and surface to callers as validation errors.

use chrono::NaiveDate;
use fintrack_shared::AppError;
use fintrack_shared::types::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while validating ledger input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Amount Errors ==========
    /// Amount is zero after rounding to cents.
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Amount is negative.
    #[error("Amount cannot be negative")]
    NegativeAmount,

    /// Amount text is not a finite decimal number.
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    /// Opening balance is negative.
    #[error("Opening balance cannot be negative: {0}")]
    NegativeOpeningBalance(Decimal),

    /// Amount or balance magnitude exceeds the supported limit.
    #[error("Amount {0} exceeds the maximum of 1000000000000.00")]
    AmountTooLarge(Decimal),

    /// Applying a change would push a balance out of the representable range.
    #[error("Balance of account {0} would overflow")]
    BalanceOverflow(AccountId),

    // ========== Field Errors ==========
    /// Account name is empty or whitespace.
    #[error("Account name cannot be blank")]
    BlankAccountName,

    /// Category is empty or whitespace.
    #[error("Category cannot be blank")]
    BlankCategory,

    /// A required field is missing from an untrusted hint.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    // ========== Recurring Errors ==========
    /// Transaction is recurring but has no interval.
    #[error("Recurring transaction requires a recurring interval")]
    MissingRecurringInterval,

    /// Transaction is not recurring but carries an interval.
    #[error("Recurring interval given for a non-recurring transaction")]
    UnexpectedRecurringInterval,

    // ========== Date Errors ==========
    /// Date text could not be parsed.
    #[error("Invalid date: {0:?}")]
    InvalidDate(String),

    /// Date lies outside the supported calendar range.
    #[error("Date {0} is outside the supported range")]
    DateOutOfRange(NaiveDate),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::NegativeOpeningBalance(_) => "NEGATIVE_OPENING_BALANCE",
            Self::AmountTooLarge(_) => "AMOUNT_TOO_LARGE",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            Self::BlankAccountName => "BLANK_ACCOUNT_NAME",
            Self::BlankCategory => "BLANK_CATEGORY",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::MissingRecurringInterval => "MISSING_RECURRING_INTERVAL",
            Self::UnexpectedRecurringInterval => "UNEXPECTED_RECURRING_INTERVAL",
            Self::InvalidDate(_) => "INVALID_DATE",
            Self::DateOutOfRange(_) => "DATE_OUT_OF_RANGE",
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        Self::Validation(err.to_string())
    }
}
