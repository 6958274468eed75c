//! Ledger consistency engine.
//!
//! Wires the pure rules from `fintrack-core` to a persistence collaborator:
//! - [`AccountStore`] - accounts, default flag, balance adjustments
//! - [`TransactionLedger`] - transaction CRUD paired with balance changes
//! - [`RecurringProcessor`] - lease-guarded catch-up of recurring templates
//! - [`ChartReports`] - read-only chart reports per account
//!
//! Every store call is bounded by a timeout and every write goes through one
//! atomic commit unit, retried on optimistic-concurrency conflicts.

pub mod accounts;
pub mod gateway;
pub mod ledger;
pub mod recurring;
pub mod reports;
pub mod retry;

use std::sync::Arc;

use fintrack_shared::AppConfig;
use fintrack_shared::types::WorkerId;

pub use accounts::{AccountStore, NewAccount};
pub use gateway::{Backend, Gateway};
pub use ledger::TransactionLedger;
pub use recurring::{RecurringProcessor, RecurringRunSummary};
pub use reports::ChartReports;
pub use retry::RetryPolicy;

/// All engine services over one shared store.
pub struct Engine<S> {
    /// Account operations.
    pub accounts: AccountStore<S>,
    /// Transaction operations.
    pub ledger: TransactionLedger<S>,
    /// Recurring template processing.
    pub recurring: RecurringProcessor<S>,
    /// Chart reports.
    pub reports: ChartReports<S>,
}

impl<S: Backend> Engine<S> {
    /// Builds the engine with a fresh worker identity.
    pub fn new(store: Arc<S>, config: &AppConfig) -> Self {
        Self::with_worker(store, config, WorkerId::new())
    }

    /// Builds the engine with an explicit worker identity for leases.
    pub fn with_worker(store: Arc<S>, config: &AppConfig, worker_id: WorkerId) -> Self {
        let gateway = Gateway::new(store, config.engine.store_timeout());
        let retry = RetryPolicy::from(&config.engine.retry);
        let accounts = AccountStore::new(gateway.clone(), retry.clone());
        let ledger = TransactionLedger::new(gateway.clone(), accounts.clone(), retry.clone());
        let recurring = RecurringProcessor::new(
            gateway.clone(),
            accounts.clone(),
            retry,
            config.recurring.clone(),
            worker_id,
        );
        let reports = ChartReports::new(gateway);

        Self {
            accounts,
            ledger,
            recurring,
            reports,
        }
    }
}
