use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::ledger::{TransactionLedger, TxRecord, producer};
use crate::wallet::WalletStore;

use super::{ApiError, AppState};

// --- Requests ---

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub wallet_id: Uuid,
    /// Amount in the smallest currency unit.
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalRequest {
    pub wallet_id: Uuid,
    pub amount: i64,
    /// ISO-8601, strictly in the future.
    pub execute_at: DateTime<Utc>,
}

// --- Responses ---

#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub id: Uuid,
    pub balance: i64,
}

#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub transaction_id: Uuid,
    pub balance: i64,
}

#[derive(Debug, Serialize)]
pub struct WithdrawalResponse {
    pub transaction_id: Uuid,
    pub execute_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub tx_type: String,
    pub status: String,
    pub amount: i64,
    pub execute_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub is_dead: bool,
    pub created_at: DateTime<Utc>,
}

impl From<TxRecord> for TransactionResponse {
    fn from(r: TxRecord) -> Self {
        Self {
            id: r.id,
            wallet_id: r.wallet_id,
            tx_type: r.tx_type.as_str().to_string(),
            status: r.status.as_str().to_string(),
            amount: r.amount,
            execute_at: r.execute_at,
            retry_count: r.retry_count,
            is_dead: r.is_dead,
            created_at: r.created_at,
        }
    }
}

// --- Handlers ---

/// POST /wallets
pub async fn create_wallet(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<WalletResponse>), ApiError> {
    let wallet = WalletStore::create(state.db.pool()).await?;
    Ok((
        StatusCode::CREATED,
        Json(WalletResponse {
            id: wallet.id,
            balance: wallet.balance,
        }),
    ))
}

/// GET /wallets/{id}
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WalletResponse>, ApiError> {
    let wallet = WalletStore::get(state.db.pool(), id).await?;
    Ok(Json(WalletResponse {
        id: wallet.id,
        balance: wallet.balance,
    }))
}

/// POST /deposits
///
/// Settles immediately: credit and SUCCESS record commit together, no
/// worker involvement.
pub async fn create_deposit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DepositRequest>,
) -> Result<(StatusCode, Json<DepositResponse>), ApiError> {
    let (record, balance) = producer::deposit(state.db.pool(), req.wallet_id, req.amount).await?;

    tracing::info!(
        wallet_id = %req.wallet_id,
        transaction_id = %record.id,
        amount = req.amount,
        "deposit settled"
    );

    Ok((
        StatusCode::CREATED,
        Json(DepositResponse {
            transaction_id: record.id,
            balance,
        }),
    ))
}

/// POST /withdrawals
///
/// Only schedules: the row leaves here PENDING and the settlement worker
/// picks it up once `execute_at` passes.
pub async fn schedule_withdrawal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WithdrawalRequest>,
) -> Result<(StatusCode, Json<WithdrawalResponse>), ApiError> {
    let record =
        producer::schedule_withdrawal(state.db.pool(), req.wallet_id, req.amount, req.execute_at)
            .await?;

    tracing::info!(
        wallet_id = %req.wallet_id,
        transaction_id = %record.id,
        amount = req.amount,
        execute_at = %req.execute_at,
        "withdrawal scheduled"
    );

    Ok((
        StatusCode::CREATED,
        Json(WithdrawalResponse {
            transaction_id: record.id,
            execute_at: req.execute_at,
        }),
    ))
}

/// GET /transactions/{id}
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let record = TransactionLedger::get(state.db.pool(), id).await?;
    Ok(Json(TransactionResponse::from(record)))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Result<&'static str, ApiError> {
    state
        .db
        .health_check()
        .await
        .map_err(LedgerError::Database)?;
    Ok("ok")
}
