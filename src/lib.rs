//! EbakusDB - client library for the Ebakus blockchain table store
//!
//! This is the root crate re-exporting the public API of the subcrates:
//! - `ebakusdb-core`: schemas, configuration, ABI mapping and errors
//! - `ebakusdb-client`: node connection, signing, table commands and cursors

pub use ebakusdb_client::{Connection, Cursor, EbakusDbClient, LocalAccount};
pub use ebakusdb_core::{
    ClientConfig, ClientOptions, EbakusDbError, FieldSchema, KeystoreSource, Record, Result,
    Schema, SigningMode, TableSchema,
};

/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
