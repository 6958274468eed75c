//! Business rule validation for ledger input.
//!
//! Validation both checks and normalises: amounts come back rounded to
//! cents, text fields come back trimmed. Callers persist the returned values,
//! never the raw input.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use fintrack_shared::types::{MAX_AMOUNT, normalize_money};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::TransactionFields;

/// Earliest calendar year accepted for transaction dates.
pub const MIN_SUPPORTED_YEAR: i32 = 1900;
/// Latest calendar year accepted for transaction dates.
pub const MAX_SUPPORTED_YEAR: i32 = 9999;

/// Parses untrusted amount text into a decimal.
///
/// # Errors
///
/// Returns `InvalidAmount` for anything that is not a finite decimal number.
pub fn parse_amount(text: &str) -> Result<Decimal, LedgerError> {
    text.trim()
        .parse::<Decimal>()
        .map_err(|_| LedgerError::InvalidAmount(text.to_string()))
}

/// Validates a transaction amount and rounds it to cents.
///
/// # Errors
///
/// Returns an error if the amount is negative, rounds to zero, or exceeds
/// [`MAX_AMOUNT`].
pub fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::NegativeAmount);
    }
    let normalized = normalize_money(amount);
    if normalized.is_zero() {
        return Err(LedgerError::ZeroAmount);
    }
    ensure_within_limit(normalized)
}

/// Validates a signed manual balance correction and rounds it to cents.
///
/// # Errors
///
/// Returns `AmountTooLarge` if its magnitude exceeds [`MAX_AMOUNT`].
pub fn validate_adjustment(delta: Decimal) -> Result<Decimal, LedgerError> {
    let normalized = normalize_money(delta);
    if normalized.abs() > MAX_AMOUNT {
        return Err(LedgerError::AmountTooLarge(delta));
    }
    Ok(normalized)
}

fn ensure_within_limit(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount > MAX_AMOUNT {
        return Err(LedgerError::AmountTooLarge(amount));
    }
    Ok(amount)
}

/// Validates an account's opening balance and rounds it to cents.
///
/// # Errors
///
/// Returns an error if the balance is negative or exceeds [`MAX_AMOUNT`].
pub fn validate_opening_balance(balance: Decimal) -> Result<Decimal, LedgerError> {
    let normalized = normalize_money(balance);
    if normalized < Decimal::ZERO {
        return Err(LedgerError::NegativeOpeningBalance(balance));
    }
    ensure_within_limit(normalized)
}

/// Validates and trims an account name.
///
/// # Errors
///
/// Returns an error if the name is blank.
pub fn validate_account_name(name: &str) -> Result<String, LedgerError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::BlankAccountName);
    }
    Ok(trimmed.to_string())
}

/// Validates that a date lies inside the supported calendar range.
///
/// # Errors
///
/// Returns `DateOutOfRange` for years outside
/// [`MIN_SUPPORTED_YEAR`]..=[`MAX_SUPPORTED_YEAR`].
pub fn validate_date(date: DateTime<Utc>) -> Result<DateTime<Utc>, LedgerError> {
    let year = date.year();
    if !(MIN_SUPPORTED_YEAR..=MAX_SUPPORTED_YEAR).contains(&year) {
        return Err(LedgerError::DateOutOfRange(date.date_naive()));
    }
    Ok(date)
}

/// Parses untrusted date text.
///
/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
///
/// # Errors
///
/// Returns `InvalidDate` if neither format matches.
pub fn parse_date(text: &str) -> Result<DateTime<Utc>, LedgerError> {
    let trimmed = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return validate_date(parsed.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| LedgerError::InvalidDate(text.to_string()))?;
    validate_date(day.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Validates transaction fields and returns their normalised form.
///
/// Checks, in order: amount, category, date, recurring consistency.
/// Account ownership is checked by the caller against the store.
///
/// # Errors
///
/// Returns the first rule the fields violate.
pub fn validate_fields(fields: TransactionFields) -> Result<TransactionFields, LedgerError> {
    let amount = validate_amount(fields.amount)?;

    let category = fields.category.trim().to_string();
    if category.is_empty() {
        return Err(LedgerError::BlankCategory);
    }

    let description = fields
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let date = validate_date(fields.date)?;

    match (fields.is_recurring, fields.recurring_interval) {
        (true, None) => return Err(LedgerError::MissingRecurringInterval),
        (false, Some(_)) => return Err(LedgerError::UnexpectedRecurringInterval),
        _ => {}
    }

    Ok(TransactionFields {
        amount,
        category,
        description,
        date,
        ..fields
    })
}
