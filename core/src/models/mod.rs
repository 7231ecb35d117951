//! Data models for EbakusDB
//!
//! Table schemas, transaction payloads and node receipts.

mod table;
mod transaction;

pub use table::{FieldSchema, TableSchema, ID_FIELD};
pub use transaction::{PendingTransaction, Receipt, TxPayload};

/// A record as stored in and read from an EbakusDB table
pub type Record = serde_json::Map<String, serde_json::Value>;
