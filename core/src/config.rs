//! Client configuration
//!
//! `ClientOptions` is the loosely typed set of construction options as they
//! appear in a JSON file. `ClientConfig` is the validated form, with the
//! signing mode expressed as a tagged union.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::error::{EbakusDbError, Result};
use crate::schema::Schema;

/// Default node host
pub const DEFAULT_HOST: &str = "localhost";

/// Default node RPC port
pub const DEFAULT_PORT: u16 = 8545;

/// Where the V3 keystore comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeystoreSource {
    /// Path to a keystore file
    Path(PathBuf),

    /// Keystore JSON, an object or an array holding one
    Json(serde_json::Value),
}

/// How transactions get signed
#[derive(Debug, Clone, PartialEq)]
pub enum SigningMode {
    /// Sign locally with a decrypted keystore account
    Local {
        /// Keystore material
        keystore: KeystoreSource,

        /// Keystore password
        password: String,
    },

    /// Let the node sign with an address it holds unlocked
    Remote {
        /// Unlocked address on the node
        address: Address,
    },
}

impl SigningMode {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            SigningMode::Local { .. } => "local",
            SigningMode::Remote { .. } => "remote",
        }
    }
}

/// Validated client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Use https instead of http
    pub secure: bool,

    /// Node host
    pub host: String,

    /// Node RPC port
    pub port: u16,

    /// Table schemas
    pub schema: Schema,

    /// Signing mode
    pub signing: SigningMode,

    /// How often to poll for a transaction receipt
    pub receipt_poll_interval: Duration,

    /// How long to wait for a transaction receipt
    pub receipt_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with default connection settings
    pub fn new(schema: Schema, signing: SigningMode) -> Self {
        Self {
            secure: false,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            schema,
            signing,
            receipt_poll_interval: Duration::from_secs(1),
            receipt_timeout: Duration::from_secs(750),
        }
    }

    /// Set whether to use https
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set the node host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the node RPC port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the receipt polling interval
    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    /// Set the receipt timeout
    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    /// Check the configuration before a client is built from it
    pub fn validate(&self) -> Result<()> {
        self.schema
            .validate()
            .map_err(|e| EbakusDbError::Configuration(e.to_string()))?;

        if self.host.is_empty() {
            return Err(EbakusDbError::Configuration("Host must not be empty".to_string()));
        }

        if let SigningMode::Local { password, .. } = &self.signing {
            if password.is_empty() {
                return Err(EbakusDbError::Configuration(
                    "For using localSigning please provide both keystoreV3 and keystoreV3Pass"
                        .to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Load and validate a configuration from a JSON options file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let options: ClientOptions = serde_json::from_reader(file)?;
        ClientConfig::try_from(options)
    }
}

/// Construction options as accepted from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientOptions {
    /// Use https
    pub secure: Option<bool>,

    /// Node host
    pub host: Option<String>,

    /// Node RPC port
    pub port: Option<u16>,

    /// Table schemas
    pub schema: Option<Schema>,

    /// Sign transactions locally
    pub local_signing: Option<bool>,

    /// Unlocked address on the remote node
    pub address: Option<String>,

    /// Keystore object or path
    #[serde(rename = "keystoreV3")]
    pub keystore_v3: Option<KeystoreSource>,

    /// Keystore password
    #[serde(rename = "keystoreV3Pass")]
    pub keystore_v3_pass: Option<String>,
}

impl TryFrom<ClientOptions> for ClientConfig {
    type Error = EbakusDbError;

    fn try_from(options: ClientOptions) -> Result<Self> {
        let schema = options
            .schema
            .filter(|schema| !schema.is_empty())
            .ok_or_else(|| EbakusDbError::Configuration("Please define table schema".to_string()))?;

        let signing = if options.local_signing.unwrap_or(false) {
            match (options.keystore_v3, options.keystore_v3_pass) {
                (Some(keystore), Some(password)) => SigningMode::Local { keystore, password },
                _ => {
                    return Err(EbakusDbError::Configuration(
                        "For using localSigning please provide both keystoreV3 and keystoreV3Pass"
                            .to_string(),
                    ))
                }
            }
        } else {
            let address = options.address.filter(|a| !a.is_empty()).ok_or_else(|| {
                EbakusDbError::Configuration(
                    "Please set the address to be used on the remote Ebakus node".to_string(),
                )
            })?;
            let address = address.parse::<Address>().map_err(|e| {
                EbakusDbError::Configuration(format!("Invalid address {}: {}", address, e))
            })?;
            SigningMode::Remote { address }
        };

        let mut config = ClientConfig::new(schema, signing)
            .with_secure(options.secure.unwrap_or(false))
            .with_port(options.port.unwrap_or(DEFAULT_PORT));
        if let Some(host) = options.host.filter(|h| !h.is_empty()) {
            config = config.with_host(host);
        }

        config.validate()?;
        Ok(config)
    }
}
