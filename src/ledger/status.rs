//! Transaction Type and Status Definitions
//!
//! Stored in PostgreSQL as SMALLINT ids. Terminal statuses: SUCCESS (20)
//! and FAILED (-10).

use std::fmt;

/// Transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum TxType {
    Deposit = 1,
    Withdraw = 2,
}

impl TxType {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TxType::Deposit),
            2 => Some(TxType::Withdraw),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Deposit => "DEPOSIT",
            TxType::Withdraw => "WITHDRAW",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction lifecycle status
///
/// A withdrawal is created PENDING; only the settlement worker advances it.
/// PROCESSING means the reservation has been taken from the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum TxStatus {
    Pending = 0,

    /// Funds reserved, external settlement not yet confirmed
    Processing = 10,

    /// Terminal: settlement confirmed
    Success = 20,

    /// Terminal: rejected at due time, or dead after exhausted retries
    Failed = -10,
}

impl TxStatus {
    /// No more transitions possible from this status
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxStatus::Success | TxStatus::Failed)
    }

    /// The worker may act on this status
    #[inline]
    pub fn is_live(&self) -> bool {
        matches!(self, TxStatus::Pending | TxStatus::Processing)
    }

    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(TxStatus::Pending),
            10 => Some(TxStatus::Processing),
            20 => Some(TxStatus::Success),
            -10 => Some(TxStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "PENDING",
            TxStatus::Processing => "PROCESSING",
            TxStatus::Success => "SUCCESS",
            TxStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(TxStatus::Success.is_terminal());
        assert!(TxStatus::Failed.is_terminal());
        assert!(!TxStatus::Pending.is_terminal());
        assert!(!TxStatus::Processing.is_terminal());
    }

    #[test]
    fn test_live_statuses() {
        assert!(TxStatus::Pending.is_live());
        assert!(TxStatus::Processing.is_live());
        assert!(!TxStatus::Success.is_live());
        assert!(!TxStatus::Failed.is_live());
    }

    #[test]
    fn test_status_id_roundtrip() {
        let statuses = [
            TxStatus::Pending,
            TxStatus::Processing,
            TxStatus::Success,
            TxStatus::Failed,
        ];

        for status in statuses {
            assert_eq!(TxStatus::from_id(status.id()), Some(status));
        }
    }

    #[test]
    fn test_type_id_roundtrip() {
        assert_eq!(TxType::from_id(TxType::Deposit.id()), Some(TxType::Deposit));
        assert_eq!(
            TxType::from_id(TxType::Withdraw.id()),
            Some(TxType::Withdraw)
        );
        assert_eq!(TxType::from_id(99), None);
    }

    #[test]
    fn test_invalid_status_id() {
        assert_eq!(TxStatus::from_id(999), None);
        assert_eq!(TxStatus::from_id(-999), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(TxStatus::Pending.to_string(), "PENDING");
        assert_eq!(TxStatus::Failed.to_string(), "FAILED");
        assert_eq!(TxType::Withdraw.to_string(), "WITHDRAW");
    }
}
