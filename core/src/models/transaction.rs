//! Transaction representation
//!
//! Payloads sent to the EbakusDB contract and the receipts the node returns
//! for them.

use ethers::types::{Address, Bytes, H256, U256, U64};
use serde::{Deserialize, Deserializer, Serialize};

/// Contract call produced by a table command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPayload {
    /// Target contract
    pub to: Address,

    /// ABI-encoded call data
    pub data: Bytes,
}

impl TxPayload {
    /// Create a new payload
    pub fn new(to: Address, data: Bytes) -> Self {
        Self { to, data }
    }
}

/// Transaction assembled for a single send
///
/// Optional fields are filled in by the local signing flow; remote signing
/// submits it with only `from`, `to` and `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    /// Sender address
    pub from: Address,

    /// Target contract
    pub to: Address,

    /// Call data
    pub data: Bytes,

    /// Account nonce
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,

    /// Gas limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,

    /// Proof-of-work nonce
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_nonce: Option<U256>,
}

impl PendingTransaction {
    /// Build a transaction for `from` out of a payload
    pub fn new(from: Address, payload: TxPayload) -> Self {
        Self {
            from,
            to: payload.to,
            data: payload.data,
            nonce: None,
            gas: None,
            work_nonce: None,
        }
    }
}

/// Transaction receipt returned by the node
///
/// Only the fields the client inspects are typed, everything else the node
/// reports is kept in `other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Execution status
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: Option<bool>,

    /// Transaction hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<H256>,

    /// Block the transaction was included in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<U64>,

    /// Remaining node-defined fields
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl Receipt {
    /// Success flag, false when the node reported none
    pub fn is_success(&self) -> bool {
        self.status.unwrap_or(false)
    }
}

/// Nodes report status either as a boolean or as a hex quantity
fn deserialize_status<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(flag)),
        Some(Value::Number(n)) => Ok(Some(n.as_u64().unwrap_or(0) != 0)),
        Some(Value::String(s)) => {
            let digits = s.trim_start_matches("0x");
            let value = u64::from_str_radix(if digits.is_empty() { "0" } else { digits }, 16)
                .map_err(|e| D::Error::custom(format!("invalid receipt status {}: {}", s, e)))?;
            Ok(Some(value != 0))
        }
        Some(other) => Err(D::Error::custom(format!("invalid receipt status {}", other))),
    }
}
