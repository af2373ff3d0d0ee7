//! Error Types
//!
//! One error enum shared by the wallet store, the transaction ledger, the
//! worker and the gateway. Error codes are stable strings for API responses.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum LedgerError {
    // === Validation Errors ===
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("execute_at must be in the future")]
    ExecuteAtNotFuture,

    // === Balance Errors ===
    #[error("Insufficient funds")]
    InsufficientFunds,

    // === Lookup Errors ===
    #[error("Wallet not found: {0}")]
    WalletNotFound(Uuid),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    // === System Errors ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

impl LedgerError {
    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount => "INVALID_AMOUNT",
            LedgerError::ExecuteAtNotFuture => "EXECUTE_AT_NOT_FUTURE",
            LedgerError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            LedgerError::WalletNotFound(_) => "WALLET_NOT_FOUND",
            LedgerError::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            LedgerError::Database(_) => "DATABASE_ERROR",
            LedgerError::CorruptRecord(_) => "CORRUPT_RECORD",
        }
    }

    /// HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::InvalidAmount | LedgerError::ExecuteAtNotFuture => 400,
            LedgerError::InsufficientFunds => 422,
            LedgerError::WalletNotFound(_) | LedgerError::TransactionNotFound(_) => 404,
            LedgerError::Database(_) | LedgerError::CorruptRecord(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::InvalidAmount.code(), "INVALID_AMOUNT");
        assert_eq!(LedgerError::InsufficientFunds.code(), "INSUFFICIENT_FUNDS");
        assert_eq!(
            LedgerError::WalletNotFound(Uuid::nil()).code(),
            "WALLET_NOT_FOUND"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(LedgerError::InvalidAmount.http_status(), 400);
        assert_eq!(LedgerError::ExecuteAtNotFuture.http_status(), 400);
        assert_eq!(LedgerError::InsufficientFunds.http_status(), 422);
        assert_eq!(LedgerError::WalletNotFound(Uuid::nil()).http_status(), 404);
        assert_eq!(
            LedgerError::CorruptRecord("bad status".into()).http_status(),
            500
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            LedgerError::InsufficientFunds.to_string(),
            "Insufficient funds"
        );
    }
}
