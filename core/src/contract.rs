//! EbakusDB system contract
//!
//! Table writes are calls to a contract deployed at a fixed address on every
//! Ebakus chain. This module builds the call data for its three functions.

use ethers::abi::{parse_abi, Abi, Token};
use ethers::types::{Address, Bytes, H160};

use crate::error::{to_config_error, Result};

/// Address of the EbakusDB system contract, `0x…0102`
pub const EBAKUS_DB_CONTRACT_ADDRESS: Address = H160([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0x02,
]);

const EBAKUS_DB_ABI: &[&str] = &[
    "function createTable(string tableName, string indexes, string abi)",
    "function insertObj(string tableName, bytes data) returns (bool)",
    "function deleteObj(string tableName, bytes id) returns (bool)",
];

fn ebakus_db_abi() -> Result<Abi> {
    parse_abi(EBAKUS_DB_ABI).map_err(to_config_error)
}

fn encode_call(function: &str, args: &[Token]) -> Result<Bytes> {
    let abi = ebakus_db_abi()?;
    let data = abi
        .function(function)
        .and_then(|f| f.encode_input(args))
        .map_err(to_config_error)?;
    Ok(Bytes::from(data))
}

/// Call data for `createTable(tableName, indexes, abi)`
pub fn encode_create_table(table_name: &str, indexes: &str, schema_json: &str) -> Result<Bytes> {
    encode_call(
        "createTable",
        &[
            Token::String(table_name.to_string()),
            Token::String(indexes.to_string()),
            Token::String(schema_json.to_string()),
        ],
    )
}

/// Call data for `insertObj(tableName, data)`
pub fn encode_insert_obj(table_name: &str, data: &Bytes) -> Result<Bytes> {
    encode_call(
        "insertObj",
        &[Token::String(table_name.to_string()), Token::Bytes(data.to_vec())],
    )
}

/// Call data for `deleteObj(tableName, id)`
pub fn encode_delete_obj(table_name: &str, id: &Bytes) -> Result<Bytes> {
    encode_call(
        "deleteObj",
        &[Token::String(table_name.to_string()), Token::Bytes(id.to_vec())],
    )
}
