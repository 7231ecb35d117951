//! ABI parameter mapping
//!
//! Projects named record fields onto the positional `(types, values)` pair
//! the contract expects, and encodes that pair into call data.

use ethers::abi::{self, HumanReadableParser, ParamType, Token};
use ethers::types::{Address, Bytes, I256, U256};
use serde_json::Value;

use crate::error::{EbakusDbError, Result};

/// Parse an ABI type tag such as `uint64` or `string[]`
pub fn parse_type(type_tag: &str) -> Result<ParamType> {
    let param = HumanReadableParser::parse_type(type_tag).map_err(|e| {
        EbakusDbError::Configuration(format!("Invalid ABI type \"{}\": {}", type_tag, e))
    })?;

    if !has_valid_widths(&param) {
        return Err(EbakusDbError::Configuration(format!(
            "Invalid ABI type \"{}\": unsupported width",
            type_tag
        )));
    }

    Ok(param)
}

/// Integer widths are multiples of 8 up to 256, fixed bytes hold 1 to 32
fn has_valid_widths(param: &ParamType) -> bool {
    match param {
        ParamType::Int(bits) | ParamType::Uint(bits) => *bits > 0 && *bits <= 256 && bits % 8 == 0,
        ParamType::FixedBytes(size) => *size > 0 && *size <= 32,
        ParamType::Array(inner) | ParamType::FixedArray(inner, _) => has_valid_widths(inner),
        ParamType::Tuple(members) => members.iter().all(has_valid_widths),
        _ => true,
    }
}

/// Positional ABI parameters in schema declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbiParams {
    /// Declared type of each parameter
    pub types: Vec<String>,

    /// Record value of each parameter, `None` when the record omits it
    pub values: Vec<Option<Value>>,
}

impl AbiParams {
    /// Number of parameters
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether there are no parameters
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub(crate) fn push(&mut self, type_tag: &str, value: Option<Value>) {
        self.types.push(type_tag.to_string());
        self.values.push(value);
    }

    /// Convert every value into an ABI token of its declared type
    pub fn tokens(&self) -> Result<Vec<Token>> {
        self.types
            .iter()
            .zip(&self.values)
            .enumerate()
            .map(|(position, (type_tag, value))| {
                let param = parse_type(type_tag)?;
                let value = value.as_ref().ok_or_else(|| {
                    EbakusDbError::Configuration(format!(
                        "Missing value for parameter {} of type {}",
                        position, type_tag
                    ))
                })?;
                tokenize(&param, value)
            })
            .collect()
    }

    /// ABI-encode the parameters
    pub fn encode(&self) -> Result<Bytes> {
        let tokens = self.tokens()?;
        Ok(Bytes::from(abi::encode(&tokens)))
    }
}

fn mismatch(param: &ParamType, value: &Value) -> EbakusDbError {
    EbakusDbError::Configuration(format!("Value {} is not a valid {}", value, param))
}

/// Convert a JSON value into a token of the given type
pub fn tokenize(param: &ParamType, value: &Value) -> Result<Token> {
    match param {
        ParamType::Bool => value
            .as_bool()
            .map(Token::Bool)
            .ok_or_else(|| mismatch(param, value)),
        ParamType::String => value
            .as_str()
            .map(|s| Token::String(s.to_string()))
            .ok_or_else(|| mismatch(param, value)),
        ParamType::Address => value
            .as_str()
            .and_then(|s| s.parse::<Address>().ok())
            .map(Token::Address)
            .ok_or_else(|| mismatch(param, value)),
        ParamType::Uint(0) | ParamType::Int(0) => Err(mismatch(param, value)),
        ParamType::Uint(bits) => {
            let number = parse_uint(value).ok_or_else(|| mismatch(param, value))?;
            if *bits < 256 && number.bits() > *bits {
                return Err(mismatch(param, value));
            }
            Ok(Token::Uint(number))
        }
        ParamType::Int(bits) => {
            let number = parse_int(value).ok_or_else(|| mismatch(param, value))?;
            if *bits < 256 {
                let limit = I256::from_raw(U256::one() << (*bits - 1));
                if number >= limit || number < -limit {
                    return Err(mismatch(param, value));
                }
            }
            Ok(Token::Int(number.into_raw()))
        }
        ParamType::Bytes => parse_hex(value)
            .map(Token::Bytes)
            .ok_or_else(|| mismatch(param, value)),
        ParamType::FixedBytes(size) => {
            let mut bytes = parse_hex(value).ok_or_else(|| mismatch(param, value))?;
            if bytes.len() > *size {
                return Err(mismatch(param, value));
            }
            bytes.resize(*size, 0);
            Ok(Token::FixedBytes(bytes))
        }
        ParamType::Array(inner) => {
            let items = value.as_array().ok_or_else(|| mismatch(param, value))?;
            let tokens = items
                .iter()
                .map(|item| tokenize(inner, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Token::Array(tokens))
        }
        ParamType::FixedArray(inner, size) => {
            let items = value
                .as_array()
                .filter(|items| items.len() == *size)
                .ok_or_else(|| mismatch(param, value))?;
            let tokens = items
                .iter()
                .map(|item| tokenize(inner, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Token::FixedArray(tokens))
        }
        ParamType::Tuple(members) => {
            let items = value
                .as_array()
                .filter(|items| items.len() == members.len())
                .ok_or_else(|| mismatch(param, value))?;
            let tokens = members
                .iter()
                .zip(items)
                .map(|(member, item)| tokenize(member, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Token::Tuple(tokens))
        }
    }
}

fn parse_uint(value: &Value) -> Option<U256> {
    match value {
        Value::Number(n) => n.as_u64().map(U256::from),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex_digits) => U256::from_str_radix(hex_digits, 16).ok(),
            None => U256::from_dec_str(s).ok(),
        },
        _ => None,
    }
}

fn parse_int(value: &Value) -> Option<I256> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|v| I256::from_dec_str(&v.to_string()).ok()),
        Value::String(s) => I256::from_dec_str(s).ok(),
        _ => None,
    }
}

fn parse_hex(value: &Value) -> Option<Vec<u8>> {
    let s = value.as_str()?;
    hex::decode(s.strip_prefix("0x").unwrap_or(s)).ok()
}
