//! Table schema registry
//!
//! Holds the caller-declared table schemas and maps named records onto the
//! positional ABI parameters the EbakusDB contract expects.

mod abi;
mod validator;

pub use abi::{parse_type, tokenize, AbiParams};
pub use validator::{SchemaValidator, ValidationError, ValidationResult};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EbakusDbError, Result};
use crate::models::{Record, TableSchema};

/// Tables known to a client, keyed by table name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: HashMap<String, TableSchema>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under its own name
    pub fn with_table(mut self, table: TableSchema) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Get a table by name
    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// Get a table by name or fail with a configuration error
    pub fn table(&self, name: &str) -> Result<&TableSchema> {
        self.get_table(name).ok_or_else(|| {
            EbakusDbError::Configuration(format!("Schema for table \"{}\" not found", name))
        })
    }

    /// Check if the schema has a table
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Get the number of tables in the schema
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Whether no tables are declared
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Validate every table
    pub fn validate(&self) -> ValidationResult<()> {
        if self.tables.is_empty() {
            return Err(ValidationError::EmptySchema);
        }

        for (key, table) in &self.tables {
            SchemaValidator::validate_table(key, table)?;
        }

        Ok(())
    }

    /// Project `record` onto the declared fields of `table_name`
    ///
    /// Fields are visited in declaration order. With an `include` filter only
    /// the listed fields are kept. Keys of `record` that the table does not
    /// declare are ignored, declared fields the record lacks map to `None`.
    pub fn to_abi_data(
        &self,
        table_name: &str,
        record: &Record,
        include: Option<&[&str]>,
    ) -> Result<AbiParams> {
        let table = self.table(table_name)?;

        let mut params = AbiParams::default();
        for field in &table.inputs {
            if let Some(include) = include {
                if !include.contains(&field.name.as_str()) {
                    continue;
                }
            }

            params.push(&field.field_type, record.get(&field.name).cloned());
        }

        Ok(params)
    }
}

impl FromIterator<TableSchema> for Schema {
    fn from_iter<I: IntoIterator<Item = TableSchema>>(iter: I) -> Self {
        iter.into_iter().fold(Schema::new(), Schema::with_table)
    }
}
