//! Wallet Settlement - Ledgered Wallet Service
//!
//! A single-currency wallet ledger with an asynchronous withdrawal
//! settlement worker in front of an external, bank-like endpoint.
//!
//! # Modules
//!
//! - [`wallet`] - Wallet balances: locked read, credit, debit
//! - [`ledger`] - Transaction records and guarded lifecycle transitions
//! - [`provider`] - Settlement provider client (HTTP + mock)
//! - [`worker`] - The withdrawal settlement worker (reserve / settle /
//!   finalize, retry and refund policy)
//! - [`gateway`] - HTTP API for wallets, deposits and withdrawals
//! - [`db`] - PostgreSQL pool wrapper
//! - [`config`] - YAML application config
//! - [`logging`] - tracing setup
//! - [`error`] - Crate-wide error type

pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod provider;
pub mod wallet;
pub mod worker;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use db::Database;
pub use error::LedgerError;
pub use ledger::{TransactionLedger, TxRecord, TxStatus, TxType};
pub use provider::{HttpSettlementProvider, MockProvider, SettleOutcome, SettlementProvider};
pub use wallet::{Wallet, WalletStore};
pub use worker::{BatchPolicy, SettlementWorker, WorkerConfig};
