//! Error types for the EbakusDB client
//!
//! Every failure surfaced to callers is classified into one of four kinds:
//! configuration problems, node reply failures, transactions the node
//! executed but reported as failed, and read cursor failures.

use thiserror::Error;

use crate::models::Receipt;

/// EbakusDB error type
#[derive(Error, Debug)]
pub enum EbakusDbError {
    /// Invalid or missing construction options, unknown table schema,
    /// malformed parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Talking to the node failed while assembling or submitting a request
    #[error("Reply from Ebakus node failed: {0}")]
    Reply(String),

    /// The node executed the transaction but reported a non-success status
    #[error("{message}")]
    TransactionFailure {
        /// Failure description
        message: String,

        /// Receipt returned by the node
        receipt: Box<Receipt>,
    },

    /// Opening or advancing a select cursor failed
    #[error("Query error: {0}")]
    Query(String),
}

impl EbakusDbError {
    /// Build a transaction failure carrying the node receipt
    pub fn transaction_failure(receipt: Receipt) -> Self {
        EbakusDbError::TransactionFailure {
            message: "Transaction failed".to_string(),
            receipt: Box::new(receipt),
        }
    }

    /// Whether this is a transaction the node executed and rejected
    pub fn is_transaction_failure(&self) -> bool {
        matches!(self, EbakusDbError::TransactionFailure { .. })
    }

    /// Receipt attached to a transaction failure
    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            EbakusDbError::TransactionFailure { receipt, .. } => Some(&**receipt),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EbakusDbError {
    fn from(err: serde_json::Error) -> Self {
        EbakusDbError::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for EbakusDbError {
    fn from(err: std::io::Error) -> Self {
        EbakusDbError::Configuration(err.to_string())
    }
}

/// Result type for EbakusDB operations
pub type Result<T> = std::result::Result<T, EbakusDbError>;

/// Convert a displayable error to a Configuration error
pub fn to_config_error<E: std::fmt::Display>(err: E) -> EbakusDbError {
    EbakusDbError::Configuration(err.to_string())
}

/// Convert a displayable error to a Reply error
pub fn to_reply_error<E: std::fmt::Display>(err: E) -> EbakusDbError {
    EbakusDbError::Reply(err.to_string())
}

/// Convert a displayable error to a Query error
pub fn to_query_error<E: std::fmt::Display>(err: E) -> EbakusDbError {
    EbakusDbError::Query(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "keystore not found");
        let err: EbakusDbError = io_err.into();
        match err {
            EbakusDbError::Configuration(msg) => assert_eq!(msg, "keystore not found"),
            _ => panic!("Expected Configuration variant"),
        }

        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: EbakusDbError = json_err.into();
        assert!(matches!(err, EbakusDbError::Configuration(_)));

        match to_reply_error("connection refused") {
            EbakusDbError::Reply(msg) => assert_eq!(msg, "connection refused"),
            _ => panic!("Expected Reply variant"),
        }

        match to_query_error("cursor expired") {
            EbakusDbError::Query(msg) => assert_eq!(msg, "cursor expired"),
            _ => panic!("Expected Query variant"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = EbakusDbError::Configuration("Please define table schema".to_string());
        assert_eq!(err.to_string(), "Configuration error: Please define table schema");

        let err = EbakusDbError::Reply("timeout".to_string());
        assert_eq!(err.to_string(), "Reply from Ebakus node failed: timeout");

        let err = EbakusDbError::transaction_failure(Receipt::default());
        assert_eq!(err.to_string(), "Transaction failed");
    }

    #[test]
    fn test_transaction_failure_carries_receipt() {
        let receipt = Receipt {
            status: Some(false),
            ..Receipt::default()
        };
        let err = EbakusDbError::transaction_failure(receipt);

        assert!(err.is_transaction_failure());
        assert_eq!(err.receipt().and_then(|r| r.status), Some(false));

        let other = to_config_error("bad");
        assert!(!other.is_transaction_failure());
        assert!(other.receipt().is_none());
    }
}
