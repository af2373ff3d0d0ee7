//! HTTP Settlement Provider
//!
//! reqwest-based client for the external settlement endpoint. Sends the
//! idempotency key as the `Idempotency-Key` header with a JSON body
//! `{"amount": n}` and a bounded timeout.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::{SettleOutcome, SettlementProvider};
use crate::config::ProviderConfig;

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Serialize)]
struct SettleRequest {
    amount: i64,
}

pub struct HttpSettlementProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpSettlementProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl SettlementProvider for HttpSettlementProvider {
    async fn settle(&self, amount: i64, idempotency_key: Uuid) -> SettleOutcome {
        let response = self
            .client
            .post(&self.url)
            .header(IDEMPOTENCY_HEADER, idempotency_key.to_string())
            .json(&SettleRequest { amount })
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                debug!(idempotency_key = %idempotency_key, error = %e, "Settlement request failed");
                return SettleOutcome::Transient(format!("Request error: {}", e));
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                return SettleOutcome::Transient(format!("Failed to read response body: {}", e));
            }
        };

        classify(status, &body)
    }
}

/// Classify a provider response: accepted only when the status is 2xx AND
/// the body parses as JSON. An unparseable body on a 2xx response is
/// treated as transient, never silently accepted.
fn classify(status: StatusCode, body: &[u8]) -> SettleOutcome {
    if !status.is_success() {
        return SettleOutcome::Transient(format!("Provider returned {}", status));
    }

    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(_) => SettleOutcome::Accepted,
        Err(e) => SettleOutcome::Transient(format!("Non-JSON response body: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_status_with_json_body_accepted() {
        let outcome = classify(StatusCode::OK, br#"{"status": "ok"}"#);
        assert_eq!(outcome, SettleOutcome::Accepted);
    }

    #[test]
    fn test_any_2xx_accepted() {
        let outcome = classify(StatusCode::CREATED, br#"{"id": 42}"#);
        assert_eq!(outcome, SettleOutcome::Accepted);
    }

    #[test]
    fn test_non_success_status_is_transient() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::BAD_REQUEST,
        ] {
            let outcome = classify(status, br#"{"status": "error"}"#);
            assert!(matches!(outcome, SettleOutcome::Transient(_)), "{status}");
        }
    }

    #[test]
    fn test_unparseable_body_on_success_is_transient() {
        let outcome = classify(StatusCode::OK, b"<html>not json</html>");
        assert!(matches!(outcome, SettleOutcome::Transient(_)));
    }

    #[test]
    fn test_empty_body_on_success_is_transient() {
        let outcome = classify(StatusCode::OK, b"");
        assert!(matches!(outcome, SettleOutcome::Transient(_)));
    }
}
