//! Recurring template processing.
//!
//! Each due template is claimed with a lease, then caught up one occurrence
//! per commit. A commit creates the occurrence, moves the account balance and
//! advances the template under a version check, so even two workers holding
//! the same template cannot materialize one occurrence twice.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use fintrack_core::ledger::{Transaction, TransactionStatus, balance_changes, validate_fields};
use fintrack_core::recurring::{CatchUpPlan, RecurringScheduler};
use fintrack_db::CommitUnit;
use fintrack_shared::{AppError, AppResult};
use fintrack_shared::config::RecurringConfig;
use fintrack_shared::types::{TransactionId, UserId, WorkerId};
use serde::{Deserialize, Serialize};

use crate::accounts::AccountStore;
use crate::gateway::{Backend, Gateway};
use crate::retry::RetryPolicy;

/// Outcome of one `process_due_recurring` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringRunSummary {
    /// Occurrences created across all templates, including those of
    /// templates that failed partway through catch-up.
    pub occurrences_materialized: u64,
    /// Templates this worker claimed and finished.
    pub templates_processed: u64,
    /// Templates whose lease was held by another worker.
    pub templates_skipped: u64,
    /// Templates that failed and were left for the next run.
    pub templates_failed: u64,
    /// Templates moved to `OVERDUE_TRUNCATED` by this run.
    pub truncated: Vec<TransactionId>,
}

#[derive(Debug, Default)]
struct TemplateOutcome {
    materialized: u64,
    truncated: bool,
}

/// One planned occurrence of a template.
#[derive(Debug, Clone, Copy)]
struct Step {
    due: DateTime<Utc>,
    following: DateTime<Utc>,
    truncate: bool,
}

/// Materializes due occurrences of recurring templates.
pub struct RecurringProcessor<S> {
    gateway: Gateway<S>,
    accounts: AccountStore<S>,
    retry: RetryPolicy,
    config: RecurringConfig,
    worker_id: WorkerId,
}

impl<S: Backend> RecurringProcessor<S> {
    /// Creates a processor that claims templates as `worker_id`.
    pub fn new(
        gateway: Gateway<S>,
        accounts: AccountStore<S>,
        retry: RetryPolicy,
        config: RecurringConfig,
        worker_id: WorkerId,
    ) -> Self {
        Self {
            gateway,
            accounts,
            retry,
            config,
            worker_id,
        }
    }

    /// Identity this processor uses for leases.
    pub const fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    /// Materializes every occurrence due at `now`.
    ///
    /// Due templates are fetched in pages until none is left that this run
    /// has not already visited. A failing template is logged and counted, and
    /// the run moves on. An integrity violation stops the run.
    pub async fn process_due_recurring(&self, now: DateTime<Utc>) -> AppResult<RecurringRunSummary> {
        let mut summary = RecurringRunSummary::default();
        let mut visited: HashSet<TransactionId> = HashSet::new();

        loop {
            // Skipped and failed templates stay due, so fetch past them.
            let limit = visited.len().saturating_add(self.config.due_batch());
            let due = self.gateway.list_due(now, limit).await?;
            let exhausted = due.len() < limit;
            let fresh: Vec<Transaction> = due
                .into_iter()
                .filter(|template| visited.insert(template.id))
                .collect();
            if fresh.is_empty() {
                break;
            }

            for template in fresh {
                self.claim_and_process(&template, now, &mut summary).await?;
            }
            if exhausted {
                break;
            }
        }

        tracing::info!(
            worker_id = %self.worker_id,
            materialized = summary.occurrences_materialized,
            processed = summary.templates_processed,
            skipped = summary.templates_skipped,
            failed = summary.templates_failed,
            truncated = summary.truncated.len(),
            "Recurring run finished"
        );
        Ok(summary)
    }

    /// Leases one template, processes it and records the outcome.
    ///
    /// Only an integrity violation is returned as an error.
    async fn claim_and_process(
        &self,
        template: &Transaction,
        now: DateTime<Utc>,
        summary: &mut RecurringRunSummary,
    ) -> AppResult<()> {
        let claimed = match self
            .gateway
            .try_acquire(template.id, self.worker_id, now, self.config.lease_ttl())
            .await
        {
            Ok(claimed) => claimed,
            Err(err) => {
                tracing::warn!(transaction_id = %template.id, error = %err, "Lease acquisition failed");
                summary.templates_failed += 1;
                return Ok(());
            }
        };
        if !claimed {
            tracing::debug!(transaction_id = %template.id, "Template leased by another worker");
            summary.templates_skipped += 1;
            return Ok(());
        }

        let mut outcome = TemplateOutcome::default();
        let result = self.process_template(template, now, &mut outcome).await;

        if let Err(err) = self.gateway.release(template.id, self.worker_id).await {
            tracing::warn!(transaction_id = %template.id, error = %err, "Lease release failed");
        }

        // Occurrences committed before a failure stay committed.
        summary.occurrences_materialized += outcome.materialized;

        match result {
            Ok(()) => {
                summary.templates_processed += 1;
                if outcome.truncated {
                    tracing::warn!(
                        user_id = %template.user_id,
                        transaction_id = %template.id,
                        cap = self.config.max_catch_up,
                        "Catch-up cap reached, template needs manual attention"
                    );
                    summary.truncated.push(template.id);
                }
                Ok(())
            }
            Err(err @ AppError::Integrity(_)) => {
                tracing::error!(
                    user_id = %template.user_id,
                    transaction_id = %template.id,
                    error = %err,
                    "Integrity violation, halting recurring run"
                );
                Err(err)
            }
            Err(err) => {
                tracing::error!(
                    user_id = %template.user_id,
                    transaction_id = %template.id,
                    materialized = outcome.materialized,
                    error = %err,
                    "Recurring template failed"
                );
                summary.templates_failed += 1;
                Ok(())
            }
        }
    }

    async fn process_template(
        &self,
        template: &Transaction,
        now: DateTime<Utc>,
        outcome: &mut TemplateOutcome,
    ) -> AppResult<()> {
        let (Some(next), Some(interval)) = (template.next_occurrence_date, template.recurring_interval)
        else {
            return Err(AppError::Integrity(format!(
                "scheduled transaction {} has no next occurrence or interval",
                template.id
            )));
        };

        let plan = RecurringScheduler::plan_catch_up(next, interval, now, self.config.max_catch_up);
        let (user_id, template_id) = (template.user_id, template.id);

        for step in steps(&plan) {
            let landed = self
                .retry
                .run("materialize_occurrence", move || {
                    self.try_materialize(user_id, template_id, step, now)
                })
                .await?;
            if !landed {
                // Another worker advanced or changed the template.
                return Ok(());
            }
            outcome.materialized += 1;
            outcome.truncated = step.truncate;
        }

        if plan.occurrences.is_empty() && plan.truncated {
            outcome.truncated = self
                .retry
                .run("truncate_template", move || {
                    self.try_truncate(user_id, template_id, next, now)
                })
                .await?;
        }
        Ok(())
    }

    /// Creates one occurrence and advances the template past it.
    ///
    /// Returns `false` without writing if the template is no longer
    /// scheduled at `step.due`.
    async fn try_materialize(
        &self,
        user_id: UserId,
        template_id: TransactionId,
        step: Step,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let Some(template) = self.gateway.get_transaction(user_id, template_id).await? else {
            return Ok(false);
        };
        if template.status != TransactionStatus::Scheduled
            || template.next_occurrence_date != Some(step.due)
        {
            return Ok(false);
        }

        let fields = validate_fields(template.occurrence_fields(step.due))?;
        let occurrence = Transaction::from_fields(user_id, fields, now);

        let mut advanced = template.clone();
        advanced.next_occurrence_date = Some(step.following);
        advanced.last_processed = Some(now);
        advanced.updated_at = now;
        if step.truncate {
            advanced.status = TransactionStatus::OverdueTruncated;
        }

        let mut unit = CommitUnit::new();
        self.accounts
            .stage_adjustments(
                &mut unit,
                user_id,
                &balance_changes(None, Some(occurrence.balance_effect())),
            )
            .await?;
        unit.create_transaction(occurrence.clone())
            .update_transaction(advanced, template.version);
        self.gateway.commit(unit).await?;

        tracing::debug!(
            user_id = %user_id,
            account_id = %occurrence.account_id,
            transaction_id = %occurrence.id,
            template_id = %template_id,
            due = %step.due,
            "Recurring occurrence materialized"
        );
        Ok(true)
    }

    /// Flags a template as truncated without materializing anything.
    async fn try_truncate(
        &self,
        user_id: UserId,
        template_id: TransactionId,
        expected_next: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let Some(template) = self.gateway.get_transaction(user_id, template_id).await? else {
            return Ok(false);
        };
        if template.status != TransactionStatus::Scheduled
            || template.next_occurrence_date != Some(expected_next)
        {
            return Ok(false);
        }

        let version = template.version;
        let mut flagged = template;
        flagged.status = TransactionStatus::OverdueTruncated;
        flagged.updated_at = now;

        let mut unit = CommitUnit::new();
        unit.update_transaction(flagged, version);
        self.gateway.commit(unit).await?;
        Ok(true)
    }
}

/// Turns a plan into steps, each knowing the date that follows it.
fn steps(plan: &CatchUpPlan) -> impl Iterator<Item = Step> + '_ {
    let last = plan.occurrences.len().saturating_sub(1);
    plan.occurrences.iter().enumerate().map(move |(i, &due)| Step {
        due,
        following: plan
            .occurrences
            .get(i + 1)
            .copied()
            .unwrap_or(plan.next_occurrence),
        truncate: plan.truncated && i == last,
    })
}
