//! # EbakusDB Core
//!
//! Schema, configuration and error types shared by the EbakusDB client.
//! This crate performs no I/O against the node; it turns caller records and
//! table definitions into the call data the EbakusDB contract expects.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod contract;
pub mod error;
pub mod models;
pub mod schema;

/// Re-export common types for ease of use
pub use config::{ClientConfig, ClientOptions, KeystoreSource, SigningMode};
pub use contract::EBAKUS_DB_CONTRACT_ADDRESS;
pub use error::{EbakusDbError, Result};
pub use models::{
    FieldSchema, PendingTransaction, Receipt, Record, TableSchema, TxPayload, ID_FIELD,
};
pub use schema::{AbiParams, Schema};

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
