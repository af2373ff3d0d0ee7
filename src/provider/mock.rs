//! Mock Settlement Provider
//!
//! Scriptable provider for worker tests: fails the first N attempts with a
//! transient outcome, then accepts. Counts calls so tests can assert how
//! often the external endpoint was hit.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

use super::{SettleOutcome, SettlementProvider};

#[derive(Default)]
pub struct MockProvider {
    fail_first: u32,
    calls: AtomicU32,
    keys: Mutex<Vec<Uuid>>,
}

impl MockProvider {
    /// Provider that accepts every attempt
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Provider that fails the first `n` attempts transiently
    pub fn failing_first(n: u32) -> Self {
        Self {
            fail_first: n,
            ..Self::default()
        }
    }

    /// Provider that never accepts
    pub fn always_failing() -> Self {
        Self::failing_first(u32::MAX)
    }

    /// Number of settle calls observed
    pub fn settle_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Idempotency keys seen, in call order
    pub fn seen_keys(&self) -> Vec<Uuid> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl SettlementProvider for MockProvider {
    async fn settle(&self, _amount: i64, idempotency_key: Uuid) -> SettleOutcome {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(idempotency_key);

        if attempt < self.fail_first {
            SettleOutcome::Transient("Mock provider failure".to_string())
        } else {
            SettleOutcome::Accepted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accepting_provider() {
        let provider = MockProvider::accepting();
        let key = Uuid::new_v4();

        assert_eq!(provider.settle(100, key).await, SettleOutcome::Accepted);
        assert_eq!(provider.settle_count(), 1);
        assert_eq!(provider.seen_keys(), vec![key]);
    }

    #[tokio::test]
    async fn test_failing_then_accepting() {
        let provider = MockProvider::failing_first(2);
        let key = Uuid::new_v4();

        assert!(matches!(
            provider.settle(100, key).await,
            SettleOutcome::Transient(_)
        ));
        assert!(matches!(
            provider.settle(100, key).await,
            SettleOutcome::Transient(_)
        ));
        assert_eq!(provider.settle(100, key).await, SettleOutcome::Accepted);
        assert_eq!(provider.settle_count(), 3);
    }
}
