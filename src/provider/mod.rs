//! Settlement Provider Client
//!
//! The external bank-like endpoint that performs the actual fund movement
//! for a withdrawal. Every attempt carries the transaction's idempotency
//! key so the provider deduplicates repeated calls across retries.

mod http;
mod mock;

pub use http::HttpSettlementProvider;
pub use mock::MockProvider;

use async_trait::async_trait;
use uuid::Uuid;

/// Outcome of a settlement attempt
///
/// There is no permanent-failure variant: every provider-side problem is
/// retryable, and the retry budget is the worker's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Provider accepted the settlement
    Accepted,
    /// Network error, timeout, non-success status or unparseable body
    Transient(String),
}

#[async_trait]
pub trait SettlementProvider: Send + Sync {
    /// Request settlement of `amount`, deduplicated by `idempotency_key`
    async fn settle(&self, amount: i64, idempotency_key: Uuid) -> SettleOutcome;
}
