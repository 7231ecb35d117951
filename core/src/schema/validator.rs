//! Schema validation
//!
//! Checks run once when a client is constructed so malformed tables are
//! rejected before any transaction is built.

use std::collections::HashSet;

use log::warn;
use thiserror::Error;

use super::abi::parse_type;
use crate::models::{TableSchema, ID_FIELD};

/// Schema validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No tables were declared
    #[error("Please define table schema")]
    EmptySchema,

    /// Table declares no fields
    #[error("Table {0} declares no fields")]
    NoFields(String),

    /// Table lacks the Id field
    #[error("Table {0} must declare an \"Id\" field")]
    MissingIdField(String),

    /// Field declared twice
    #[error("Field {0} is declared more than once in table {1}")]
    DuplicateField(String, String),

    /// Field type is not a valid ABI type
    #[error("Invalid type {2} for field {0} in table {1}")]
    InvalidFieldType(String, String, String),

    /// Registry key and table name disagree
    #[error("Table registered as {0} is named {1}")]
    NameMismatch(String, String),
}

/// Schema validation result
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Schema validator
#[derive(Debug, Clone)]
pub struct SchemaValidator;

impl SchemaValidator {
    /// Validate a table schema registered under `key`
    pub fn validate_table(key: &str, table: &TableSchema) -> ValidationResult<()> {
        if table.name != key {
            return Err(ValidationError::NameMismatch(
                key.to_string(),
                table.name.clone(),
            ));
        }

        if table.inputs.is_empty() {
            return Err(ValidationError::NoFields(table.name.clone()));
        }

        let mut seen = HashSet::new();
        for field in &table.inputs {
            if !seen.insert(field.name.as_str()) {
                return Err(ValidationError::DuplicateField(
                    field.name.clone(),
                    table.name.clone(),
                ));
            }

            if parse_type(&field.field_type).is_err() {
                return Err(ValidationError::InvalidFieldType(
                    field.name.clone(),
                    table.name.clone(),
                    field.field_type.clone(),
                ));
            }
        }

        if !table.has_field(ID_FIELD) {
            return Err(ValidationError::MissingIdField(table.name.clone()));
        }

        if table.inputs[0].name != ID_FIELD {
            warn!(
                "Table {} declares \"{}\" before \"{}\"",
                table.name, table.inputs[0].name, ID_FIELD
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldSchema;

    fn users() -> TableSchema {
        TableSchema::new(
            "Users",
            vec![
                FieldSchema::new("Id", "uint64"),
                FieldSchema::new("Name", "string"),
            ],
        )
    }

    #[test]
    fn test_validate_table() {
        assert!(SchemaValidator::validate_table("Users", &users()).is_ok());

        let mut table = users();
        table.inputs.remove(0);
        assert_eq!(
            SchemaValidator::validate_table("Users", &table),
            Err(ValidationError::MissingIdField("Users".to_string()))
        );

        let mut table = users();
        table.inputs.push(FieldSchema::new("Name", "string"));
        assert!(matches!(
            SchemaValidator::validate_table("Users", &table),
            Err(ValidationError::DuplicateField(_, _))
        ));

        let mut table = users();
        table.inputs[1].field_type = "text".to_string();
        assert!(matches!(
            SchemaValidator::validate_table("Users", &table),
            Err(ValidationError::InvalidFieldType(_, _, _))
        ));

        let mut table = users();
        table.inputs.push(FieldSchema::new("Balance", "int0"));
        assert!(matches!(
            SchemaValidator::validate_table("Users", &table),
            Err(ValidationError::InvalidFieldType(_, _, _))
        ));
    }

    #[test]
    fn test_id_field_need_not_be_first() {
        let table = TableSchema::new(
            "Phonebook",
            vec![FieldSchema::new("Phone", "string"), FieldSchema::new("Id", "uint64")],
        );
        assert!(SchemaValidator::validate_table("Phonebook", &table).is_ok());
    }

    #[test]
    fn test_registry_key_must_match_name() {
        assert_eq!(
            SchemaValidator::validate_table("People", &users()),
            Err(ValidationError::NameMismatch("People".to_string(), "Users".to_string()))
        );

        let table = TableSchema::new("Empty", vec![]);
        assert_eq!(
            SchemaValidator::validate_table("Empty", &table),
            Err(ValidationError::NoFields("Empty".to_string()))
        );
    }
}
