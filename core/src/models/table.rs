//! Table schema representation
//!
//! A table is described by an ordered list of named, ABI-typed fields. The
//! same JSON shape is sent to the node when the table is created.

use serde::{Deserialize, Serialize};

/// Name of the field every table is keyed on
pub const ID_FIELD: &str = "Id";

fn table_kind() -> String {
    "table".to_string()
}

/// Definition of a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field name
    pub name: String,

    /// ABI type tag, e.g. `uint64` or `string`
    #[serde(rename = "type")]
    pub field_type: String,
}

impl FieldSchema {
    /// Create a new field definition
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
        }
    }
}

/// Schema of an EbakusDB table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Always `table`
    #[serde(rename = "type", default = "table_kind")]
    pub kind: String,

    /// Table name
    pub name: String,

    /// Fields in declaration order
    pub inputs: Vec<FieldSchema>,
}

impl TableSchema {
    /// Create a new table schema
    pub fn new(name: impl Into<String>, inputs: Vec<FieldSchema>) -> Self {
        Self {
            kind: table_kind(),
            name: name.into(),
            inputs,
        }
    }

    /// Get a field by name
    pub fn get_field(&self, name: &str) -> Option<&FieldSchema> {
        self.inputs.iter().find(|field| field.name == name)
    }

    /// Check if the table declares a field
    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|field| field.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_schema_json_shape() {
        let schema = TableSchema::new(
            "Users",
            vec![FieldSchema::new("Id", "uint64"), FieldSchema::new("Name", "string")],
        );

        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "table",
                "name": "Users",
                "inputs": [
                    { "name": "Id", "type": "uint64" },
                    { "name": "Name", "type": "string" },
                ],
            })
        );
    }

    #[test]
    fn test_table_kind_defaults() {
        let schema: TableSchema = serde_json::from_value(json!({
            "name": "Phonebook",
            "inputs": [{ "name": "Id", "type": "uint64" }],
        }))
        .unwrap();

        assert_eq!(schema.kind, "table");
        assert!(schema.has_field(ID_FIELD));
        assert!(!schema.has_field("Phone"));
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["Id"]);
    }
}
