//! Intake for receipt-scanner hints.
//!
//! A hint is best-effort output from an external scanner. It is turned into
//! ordinary [`TransactionFields`] and then goes through the same validation as
//! any other caller input; nothing in it is trusted.

use chrono::{DateTime, Utc};
use fintrack_shared::types::AccountId;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::types::{TransactionFields, TransactionType};
use super::validation::{parse_amount, parse_date};

/// Loosely-typed record produced by the receipt scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptHint {
    /// Amount as read from the receipt.
    pub amount: Option<String>,
    /// Date as read from the receipt (`YYYY-MM-DD` or RFC 3339).
    pub date: Option<String>,
    /// Merchant or line-item text.
    pub description: Option<String>,
    /// Suggested category.
    pub category: Option<String>,
}

impl ReceiptHint {
    /// Converts the hint into one-off transaction fields.
    ///
    /// A missing date falls back to `fallback_date`. Blank strings count as
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount or category is missing, or if the amount
    /// or date text cannot be parsed.
    pub fn into_fields(
        self,
        account_id: AccountId,
        transaction_type: TransactionType,
        fallback_date: DateTime<Utc>,
    ) -> Result<TransactionFields, LedgerError> {
        let amount_text = present(self.amount).ok_or(LedgerError::MissingField("amount"))?;
        let amount = parse_amount(&amount_text)?;
        let category = present(self.category).ok_or(LedgerError::MissingField("category"))?;
        let date = match present(self.date) {
            Some(text) => parse_date(&text)?,
            None => fallback_date,
        };

        Ok(TransactionFields {
            account_id,
            transaction_type,
            amount,
            category,
            description: present(self.description),
            date,
            is_recurring: false,
            recurring_interval: None,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
