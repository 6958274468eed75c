//! Transaction construction and field updates.
//!
//! These functions expect fields that already passed
//! [`validate_fields`](super::validation::validate_fields).

use chrono::{DateTime, Utc};
use fintrack_shared::types::{TransactionId, UserId};
use rust_decimal::Decimal;

use super::balance::BalanceChange;
use super::types::{Transaction, TransactionFields, TransactionStatus};
use crate::recurring::RecurringScheduler;

impl Transaction {
    /// Builds a new transaction from validated fields.
    ///
    /// Recurring transactions start `SCHEDULED` with their next occurrence one
    /// interval after `fields.date`; everything else starts `ACTIVE`.
    #[must_use]
    pub fn from_fields(user_id: UserId, fields: TransactionFields, now: DateTime<Utc>) -> Self {
        let (status, next_occurrence_date) = schedule_for(&fields);

        Self {
            id: TransactionId::new(),
            user_id,
            account_id: fields.account_id,
            transaction_type: fields.transaction_type,
            amount: fields.amount,
            category: fields.category,
            description: fields.description,
            date: fields.date,
            is_recurring: fields.is_recurring,
            recurring_interval: fields.recurring_interval,
            next_occurrence_date,
            status,
            last_processed: None,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Returns a copy of this transaction carrying `fields`.
    ///
    /// If the transaction stays recurring on the same date and interval, its
    /// schedule (next occurrence and status) is kept. Any other change to the
    /// recurring fields restarts the schedule from the new date.
    #[must_use]
    pub fn with_fields(&self, fields: TransactionFields, now: DateTime<Utc>) -> Self {
        let schedule_unchanged = self.is_recurring
            && fields.is_recurring
            && self.date == fields.date
            && self.recurring_interval == fields.recurring_interval;

        let (status, next_occurrence_date) = if schedule_unchanged {
            (self.status, self.next_occurrence_date)
        } else {
            schedule_for(&fields)
        };

        Self {
            id: self.id,
            user_id: self.user_id,
            account_id: fields.account_id,
            transaction_type: fields.transaction_type,
            amount: fields.amount,
            category: fields.category,
            description: fields.description,
            date: fields.date,
            is_recurring: fields.is_recurring,
            recurring_interval: fields.recurring_interval,
            next_occurrence_date,
            status,
            last_processed: self.last_processed,
            created_at: self.created_at,
            updated_at: now,
            version: self.version,
        }
    }

    /// Fields of a one-off occurrence of this template dated `date`.
    #[must_use]
    pub fn occurrence_fields(&self, date: DateTime<Utc>) -> TransactionFields {
        TransactionFields {
            date,
            is_recurring: false,
            recurring_interval: None,
            ..self.fields()
        }
    }

    /// Caller-editable fields of this transaction.
    #[must_use]
    pub fn fields(&self) -> TransactionFields {
        TransactionFields {
            account_id: self.account_id,
            transaction_type: self.transaction_type,
            amount: self.amount,
            category: self.category.clone(),
            description: self.description.clone(),
            date: self.date,
            is_recurring: self.is_recurring,
            recurring_interval: self.recurring_interval,
        }
    }

    /// Signed balance effect of this transaction.
    #[must_use]
    pub fn signed_delta(&self) -> Decimal {
        self.transaction_type.signed(self.amount)
    }

    /// Balance effect currently applied to the owning account.
    #[must_use]
    pub fn balance_effect(&self) -> BalanceChange {
        BalanceChange::new(self.account_id, self.signed_delta())
    }

    /// Returns true if this is a scheduled template with an occurrence due at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == TransactionStatus::Scheduled
            && self.next_occurrence_date.is_some_and(|next| next <= now)
    }
}

fn schedule_for(fields: &TransactionFields) -> (TransactionStatus, Option<DateTime<Utc>>) {
    match (fields.is_recurring, fields.recurring_interval) {
        (true, Some(interval)) => (
            TransactionStatus::Scheduled,
            Some(RecurringScheduler::compute_next_date(fields.date, interval)),
        ),
        _ => (TransactionStatus::Active, None),
    }
}
