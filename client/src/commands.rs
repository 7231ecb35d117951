//! Table commands
//!
//! Writes (`create_table`, `insert_obj`, `delete_obj`) are encoded as calls
//! to the EbakusDB contract and submitted through `send_command`. Reads
//! (`get`, `select`) go straight to the node's `db_*` endpoints.
//!
//! Where clauses have the form `<field> <op> <literal>` with `op` one of
//! `<`, `>`, `=`, `==`, `<=`, `>=`, `!=`, `LIKE`, for example
//! `Phone = "555-1111"` or `Id >= 3`. Order clauses have the form
//! `<field> ASC|DESC`. Both are interpreted by the node.

use ebakusdb_core::contract::{encode_create_table, encode_delete_obj, encode_insert_obj};
use ebakusdb_core::error::to_reply_error;
use ebakusdb_core::{
    EbakusDbError, Record, Result, Schema, TxPayload, EBAKUS_DB_CONTRACT_ADDRESS, ID_FIELD,
};
use ethers::types::{BlockNumber, Bytes};
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::EbakusDbClient;
use crate::cursor::Cursor;

/// Serialize a caller value into a record
fn to_record<T: Serialize + ?Sized>(value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(record) => Ok(record),
        other => Err(EbakusDbError::Configuration(format!(
            "Expected an object, got {}",
            other
        ))),
    }
}

/// Call data for `createTable`
pub fn create_table_call(schema: &Schema, table_name: &str, indexes: &[&str]) -> Result<Bytes> {
    let table = schema.table(table_name)?;

    if let Some(unknown) = indexes.iter().find(|index| !table.has_field(index)) {
        return Err(EbakusDbError::Configuration(format!(
            "Index field \"{}\" is not declared in table \"{}\"",
            unknown, table_name
        )));
    }

    // The node expects the table definition wrapped in an array
    let schema_json = serde_json::to_string(&[table])?;
    encode_create_table(table_name, &indexes.join(","), &schema_json)
}

/// Call data for `insertObj`
pub fn insert_obj_call(schema: &Schema, table_name: &str, record: &Record) -> Result<Bytes> {
    let data = schema.to_abi_data(table_name, record, None)?.encode()?;
    encode_insert_obj(table_name, &data)
}

/// Call data for `deleteObj`
///
/// `input` is either an object carrying the `Id` field or the Id itself.
pub fn delete_obj_call(schema: &Schema, table_name: &str, input: &Value) -> Result<Bytes> {
    let record = match input {
        Value::Object(record) if record.contains_key(ID_FIELD) => record.clone(),
        id => {
            let mut record = Record::new();
            record.insert(ID_FIELD.to_string(), id.clone());
            record
        }
    };

    let id = schema.to_abi_data(table_name, &record, Some(&[ID_FIELD]))?.encode()?;
    encode_delete_obj(table_name, &id)
}

impl EbakusDbClient {
    async fn submit(&self, data: Bytes) -> Result<bool> {
        let receipt = self
            .send_command(TxPayload::new(EBAKUS_DB_CONTRACT_ADDRESS, data))
            .await?;
        Ok(receipt.is_success())
    }

    /// Create a table
    ///
    /// Has to be called once per table. Creating a table that already exists
    /// fails with a transaction failure.
    pub async fn create_table(&self, table_name: &str, indexes: &[&str]) -> Result<bool> {
        let data = create_table_call(self.schema(), table_name, indexes)?;
        let created = self.submit(data).await?;
        info!("Table {} created with indexes [{}]", table_name, indexes.join(","));
        Ok(created)
    }

    /// Insert or update an entry, keyed by its `Id`
    pub async fn insert_obj<T: Serialize + ?Sized>(
        &self,
        table_name: &str,
        obj: &T,
    ) -> Result<bool> {
        let record = to_record(obj)?;
        let data = insert_obj_call(self.schema(), table_name, &record)?;
        let inserted = self.submit(data).await?;
        info!("Entry inserted into {}", table_name);
        Ok(inserted)
    }

    /// Delete an entry by Id
    ///
    /// Accepts either an object with an `Id` field or the Id value itself.
    pub async fn delete_obj<T: Serialize + ?Sized>(
        &self,
        table_name: &str,
        input: &T,
    ) -> Result<bool> {
        let input = serde_json::to_value(input)?;
        let data = delete_obj_call(self.schema(), table_name, &input)?;
        let deleted = self.submit(data).await?;
        info!("Entry deleted from {}", table_name);
        Ok(deleted)
    }

    /// Read a single entry, `None` when nothing matches
    ///
    /// `block` selects the state to read from and defaults to the latest.
    pub async fn get(
        &self,
        table_name: &str,
        where_clause: &str,
        order_clause: &str,
        block: Option<BlockNumber>,
    ) -> Result<Option<Record>> {
        let value = self
            .connection()
            .db_get(
                self.address(),
                table_name,
                where_clause,
                order_clause,
                block.unwrap_or(BlockNumber::Latest),
            )
            .await
            .map_err(to_reply_error)?;

        serde_json::from_value(value).map_err(to_reply_error)
    }

    /// Read a single entry into a caller type
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        table_name: &str,
        where_clause: &str,
        order_clause: &str,
        block: Option<BlockNumber>,
    ) -> Result<Option<T>> {
        match self.get(table_name, where_clause, order_clause, block).await? {
            Some(record) => serde_json::from_value(Value::Object(record))
                .map(Some)
                .map_err(to_reply_error),
            None => Ok(None),
        }
    }

    /// Open a cursor over every matching entry
    ///
    /// `block` fixes the state read for the whole lifetime of the cursor and
    /// defaults to the latest.
    pub async fn select(
        &self,
        table_name: &str,
        where_clause: &str,
        order_clause: &str,
        block: Option<BlockNumber>,
    ) -> Result<Cursor<'_>> {
        let handle = self
            .connection()
            .db_select(
                self.address(),
                table_name,
                where_clause,
                order_clause,
                block.unwrap_or(BlockNumber::Latest),
            )
            .await
            .map_err(|e| EbakusDbError::Query(format!("Failed to query table: {}", e)))?;

        Ok(Cursor::new(self.connection(), handle))
    }
}
