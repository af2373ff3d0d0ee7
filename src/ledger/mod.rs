//! Transaction Ledger
//!
//! Deposit/withdrawal records, their lifecycle state, and the producer
//! entry points. Rows are never deleted; the ledger is an append-mostly
//! audit trail.

pub mod producer;
mod status;
mod store;

pub use status::{TxStatus, TxType};
pub use store::{TransactionLedger, TxRecord};
