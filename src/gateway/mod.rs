//! HTTP gateway: wallet and transaction endpoints in front of the ledger.
//!
//! The gateway only produces work; settlement is the worker's job. A
//! scheduled withdrawal leaves here as a PENDING row and nothing more.

pub mod handlers;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::db::Database;
use crate::error::LedgerError;

pub struct AppState {
    pub db: Database,
}

/// Error body returned by every endpoint on failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Maps domain errors onto HTTP responses via their stable code and
/// status. Database details are logged, never leaked to the caller.
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match &self.0 {
            LedgerError::Database(e) => {
                tracing::error!(error = %e, "database error in gateway");
                "internal error".to_string()
            }
            LedgerError::CorruptRecord(detail) => {
                tracing::error!(detail, "corrupt record served to gateway");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            code: self.0.code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/wallets", post(handlers::create_wallet))
        .route("/wallets/{id}", get(handlers::get_wallet))
        .route("/deposits", post(handlers::create_deposit))
        .route("/withdrawals", post(handlers::schedule_withdrawal))
        .route("/transactions/{id}", get(handlers::get_transaction))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(config: &GatewayConfig, db: Database) -> anyhow::Result<()> {
    let state = Arc::new(AppState { db });
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "gateway listening");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_errors_are_not_leaked() {
        let err = ApiError(LedgerError::Database(sqlx::Error::PoolTimedOut));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_domain_errors_map_to_their_status() {
        let cases = [
            (LedgerError::InvalidAmount, StatusCode::BAD_REQUEST),
            (LedgerError::ExecuteAtNotFuture, StatusCode::BAD_REQUEST),
            (
                LedgerError::InsufficientFunds,
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LedgerError::WalletNotFound(uuid::Uuid::new_v4()),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).into_response().status(), expected);
        }
    }
}
