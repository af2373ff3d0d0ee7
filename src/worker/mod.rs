//! Withdrawal Settlement Worker
//!
//! Drives each due withdrawal through the three-phase protocol:
//! reserve under row locks, call the settlement provider with no locks
//! held, then finalize or compensate. Owns the retry, backoff and refund
//! policy. Safe to run concurrently with other invocations: correctness
//! rests on per-row locks and guarded transitions, not mutual exclusion.

#[cfg(test)]
mod integration_tests;

use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::WorkerSettings;
use crate::error::LedgerError;
use crate::ledger::{TransactionLedger, TxRecord, TxStatus, TxType};
use crate::provider::{SettleOutcome, SettlementProvider};
use crate::wallet::WalletStore;

/// What to do with the rest of a batch after a transient provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    /// End the invocation; remaining due ids wait for the delayed re-run
    /// or the next scheduled tick, whichever comes first
    AbortBatch,
    /// Keep processing remaining due ids, then request the delayed re-run
    Continue,
}

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Scheduling interval between settlement ticks
    pub poll_interval: Duration,
    /// Retry budget per withdrawal before refund + dead-letter
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    pub on_transient: BatchPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_retries: 5,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(300),
            on_transient: BatchPolicy::AbortBatch,
        }
    }
}

impl From<&WorkerSettings> for WorkerConfig {
    fn from(settings: &WorkerSettings) -> Self {
        Self {
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            max_retries: settings.max_retries,
            backoff_base: Duration::from_secs(settings.backoff_base_secs),
            backoff_cap: Duration::from_secs(settings.backoff_cap_secs),
            on_transient: if settings.abort_batch_on_transient {
                BatchPolicy::AbortBatch
            } else {
                BatchPolicy::Continue
            },
        }
    }
}

/// Result of processing a single due withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Provider accepted; transaction is SUCCESS
    Settled,
    /// Insufficient funds at due time; terminal FAILED, nothing reserved
    Rejected,
    /// A concurrent invocation already advanced this transaction
    Skipped,
    /// Retry budget exhausted; funds refunded, transaction dead + FAILED
    DeadLettered,
    /// Transient failure, reservation intact; retried on a later tick
    RetryScheduled,
}

/// Result of one worker invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed,
    /// A transient failure occurred; re-run the invocation after backoff
    RetryLater,
}

pub struct SettlementWorker {
    pool: PgPool,
    provider: Arc<dyn SettlementProvider>,
    config: WorkerConfig,
}

impl SettlementWorker {
    pub fn new(pool: PgPool, provider: Arc<dyn SettlementProvider>, config: WorkerConfig) -> Self {
        Self {
            pool,
            provider,
            config,
        }
    }

    /// Run the settlement loop forever
    ///
    /// Ticks every `poll_interval`; after a `RetryLater` the next tick is
    /// delayed by exponential backoff with full jitter instead.
    pub async fn run(&self) -> ! {
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            max_retries = self.config.max_retries,
            "Starting withdrawal settlement worker"
        );

        let mut consecutive_retries: u32 = 0;

        loop {
            let delay = match self.run_once(Utc::now()).await {
                Ok(TickOutcome::Completed) => {
                    consecutive_retries = 0;
                    self.config.poll_interval
                }
                Ok(TickOutcome::RetryLater) => {
                    consecutive_retries += 1;
                    let delay = backoff_delay(
                        consecutive_retries,
                        self.config.backoff_base,
                        self.config.backoff_cap,
                    );
                    debug!(
                        attempt = consecutive_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure, delaying next invocation"
                    );
                    delay
                }
                Err(e) => {
                    error!(error = %e, "Settlement tick failed");
                    consecutive_retries = 0;
                    self.config.poll_interval
                }
            };

            tokio::time::sleep(delay).await;
        }
    }

    /// Run a single invocation over the current due snapshot
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<TickOutcome, LedgerError> {
        let due = TransactionLedger::due_withdrawals(&self.pool, now).await?;

        if due.is_empty() {
            debug!("No due withdrawals");
            return Ok(TickOutcome::Completed);
        }

        info!(count = due.len(), "Settling due withdrawals");

        let mut saw_transient = false;

        for (idx, tx_id) in due.iter().enumerate() {
            match self.process_one(*tx_id).await {
                Ok(ProcessOutcome::RetryScheduled) => {
                    saw_transient = true;
                    if self.config.on_transient == BatchPolicy::AbortBatch {
                        debug!(
                            tx_id = %tx_id,
                            remaining = due.len() - idx - 1,
                            "Ending invocation after transient failure"
                        );
                        return Ok(TickOutcome::RetryLater);
                    }
                }
                Ok(outcome) => {
                    debug!(tx_id = %tx_id, outcome = ?outcome, "Withdrawal processed");
                }
                Err(e) => {
                    // Left in place; the next due snapshot picks it up.
                    error!(tx_id = %tx_id, error = %e, "Failed to process withdrawal");
                }
            }
        }

        if saw_transient {
            Ok(TickOutcome::RetryLater)
        } else {
            Ok(TickOutcome::Completed)
        }
    }

    /// Drive one withdrawal through reserve, settle and finalize
    pub async fn process_one(&self, tx_id: Uuid) -> Result<ProcessOutcome, LedgerError> {
        // Phase 1: reserve under lock. Lock order is transaction row first,
        // wallet row second, on every path.
        let mut db_tx = self.pool.begin().await?;

        let Some(record) = TransactionLedger::lock(&mut db_tx, tx_id).await? else {
            let _ = db_tx.rollback().await;
            return Ok(ProcessOutcome::Skipped);
        };

        if record.is_dead || !record.status.is_live() || record.tx_type != TxType::Withdraw {
            let _ = db_tx.rollback().await;
            return Ok(ProcessOutcome::Skipped);
        }

        let wallet = WalletStore::lock(&mut db_tx, record.wallet_id).await?;

        if record.status == TxStatus::Pending {
            if wallet.balance < record.amount {
                // Rejected at due time: terminal, nothing reserved, the
                // provider is never called.
                TransactionLedger::transition(&mut db_tx, tx_id, TxStatus::Pending, TxStatus::Failed)
                    .await?;
                db_tx.commit().await?;
                warn!(
                    tx_id = %tx_id,
                    wallet_id = %record.wallet_id,
                    balance = wallet.balance,
                    amount = record.amount,
                    "Withdrawal rejected: insufficient funds"
                );
                return Ok(ProcessOutcome::Rejected);
            }

            // Reservation and status transition commit as one unit, so a
            // withdrawal can never reserve twice.
            WalletStore::debit(&mut db_tx, record.wallet_id, record.amount).await?;
            TransactionLedger::transition(&mut db_tx, tx_id, TxStatus::Pending, TxStatus::Processing)
                .await?;
        }
        // Already PROCESSING: a prior attempt reserved the funds; resume
        // at the provider call.
        db_tx.commit().await?;

        // Phase 2: external settlement with no row locks held.
        match self
            .provider
            .settle(record.amount, record.idempotency_key)
            .await
        {
            SettleOutcome::Accepted => self.finalize(tx_id).await,
            SettleOutcome::Transient(reason) => self.record_failure(&record, &reason).await,
        }
    }

    /// Phase 3: mark the withdrawal SUCCESS if it is still PROCESSING
    async fn finalize(&self, tx_id: Uuid) -> Result<ProcessOutcome, LedgerError> {
        let mut db_tx = self.pool.begin().await?;
        let applied =
            TransactionLedger::transition(&mut db_tx, tx_id, TxStatus::Processing, TxStatus::Success)
                .await?;
        db_tx.commit().await?;

        if applied {
            info!(tx_id = %tx_id, "Withdrawal settled");
            Ok(ProcessOutcome::Settled)
        } else {
            // Changed state concurrently; should not occur under the
            // locking discipline but guarded anyway.
            debug!(tx_id = %tx_id, "Finalize skipped, transaction already advanced");
            Ok(ProcessOutcome::Skipped)
        }
    }

    /// Failure path: count the attempt; refund and dead-letter once the
    /// retry budget is exhausted
    async fn record_failure(
        &self,
        record: &TxRecord,
        reason: &str,
    ) -> Result<ProcessOutcome, LedgerError> {
        let mut db_tx = self.pool.begin().await?;

        let Some(current) = TransactionLedger::lock(&mut db_tx, record.id).await? else {
            let _ = db_tx.rollback().await;
            return Ok(ProcessOutcome::Skipped);
        };

        if current.is_dead || current.status != TxStatus::Processing {
            let _ = db_tx.rollback().await;
            return Ok(ProcessOutcome::Skipped);
        }

        let retries = TransactionLedger::increment_retry(&mut db_tx, record.id).await?;

        if retries >= self.config.max_retries as i32 {
            // Give up: restore the reservation and retire the transaction.
            WalletStore::lock(&mut db_tx, current.wallet_id).await?;
            WalletStore::credit(&mut db_tx, current.wallet_id, current.amount).await?;
            TransactionLedger::mark_dead(&mut db_tx, record.id).await?;
            db_tx.commit().await?;

            warn!(
                tx_id = %record.id,
                wallet_id = %current.wallet_id,
                amount = current.amount,
                retries = retries,
                reason = reason,
                "Retries exhausted, withdrawal refunded and dead-lettered"
            );
            return Ok(ProcessOutcome::DeadLettered);
        }

        db_tx.commit().await?;

        info!(
            tx_id = %record.id,
            retries = retries,
            reason = reason,
            "Transient settlement failure, will retry"
        );
        Ok(ProcessOutcome::RetryScheduled)
    }
}

/// Exponential backoff ceiling: `base * 2^(attempt-1)`, capped
fn backoff_ceiling(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let exp = attempt.saturating_sub(1).min(31);
    let scaled = base.saturating_mul(1u32 << exp);
    scaled.min(cap)
}

/// Backoff with full jitter: uniform in `[0, ceiling]`
fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let ceiling_ms = backoff_ceiling(attempt, base, cap).as_millis() as u64;
    if ceiling_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=ceiling_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_ceiling_doubles_until_cap() {
        let base = Duration::from_secs(1);
        let cap = Duration::from_secs(300);

        assert_eq!(backoff_ceiling(1, base, cap), Duration::from_secs(1));
        assert_eq!(backoff_ceiling(2, base, cap), Duration::from_secs(2));
        assert_eq!(backoff_ceiling(3, base, cap), Duration::from_secs(4));
        assert_eq!(backoff_ceiling(9, base, cap), Duration::from_secs(256));
        assert_eq!(backoff_ceiling(10, base, cap), Duration::from_secs(300));
        assert_eq!(backoff_ceiling(100, base, cap), Duration::from_secs(300));
    }

    #[test]
    fn test_backoff_delay_within_ceiling() {
        let base = Duration::from_secs(1);
        let cap = Duration::from_secs(300);

        for attempt in 1..=12 {
            let delay = backoff_delay(attempt, base, cap);
            assert!(delay <= backoff_ceiling(attempt, base, cap));
        }
    }

    #[test]
    fn test_worker_config_default() {
        let config = WorkerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.backoff_cap, Duration::from_secs(300));
        assert_eq!(config.on_transient, BatchPolicy::AbortBatch);
    }

    #[test]
    fn test_worker_config_from_settings() {
        let settings = WorkerSettings {
            poll_interval_secs: 10,
            max_retries: 3,
            backoff_base_secs: 2,
            backoff_cap_secs: 60,
            abort_batch_on_transient: false,
        };

        let config = WorkerConfig::from(&settings);
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.backoff_base, Duration::from_secs(2));
        assert_eq!(config.on_transient, BatchPolicy::Continue);
    }
}
