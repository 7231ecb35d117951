//! Client library for EbakusDB
//!
//! EbakusDB is a table store living inside an Ebakus node. Writes are
//! contract calls submitted as transactions, signed either locally from a
//! V3 keystore or by the node itself. Reads use the node's `db_*` RPC
//! extensions and do not cost a transaction.

pub mod client;
pub mod commands;
pub mod connection;
pub mod cursor;
pub mod signing;

pub use client::EbakusDbClient;
pub use connection::{Connection, ConnectionError};
pub use cursor::Cursor;
pub use signing::{LocalAccount, SigningError};
