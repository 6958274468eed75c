//! Exclusive, expiring claims on recurring templates.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fintrack_shared::types::{TransactionId, WorkerId};

use crate::error::StoreError;

/// Lease store keyed by template id.
///
/// A lease is held by one worker until it is released or its TTL runs out,
/// after which any worker may take it over.
#[async_trait]
pub trait LeaseRepo: Send + Sync {
    /// Tries to claim `key` for `holder` until `now + ttl`.
    ///
    /// Returns `false` if another worker holds an unexpired lease. A holder
    /// re-acquiring its own lease extends it.
    async fn try_acquire(
        &self,
        key: TransactionId,
        holder: WorkerId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Releases `key` if `holder` still owns it.
    async fn release(&self, key: TransactionId, holder: WorkerId) -> Result<(), StoreError>;
}
