//! RPC connection to an Ebakus node
//!
//! Wraps an `ethers` HTTP provider with the transaction endpoints the client
//! needs and the `db_*` extensions used for reads.

use std::time::Duration;

use ebakusdb_core::{ClientConfig, PendingTransaction, Receipt};
use ethers::providers::{Http, Provider, ProviderError};
use ethers::types::{Address, BlockNumber, Bytes, H256, U256};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;

/// Error type for connection operations
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Endpoint could not be parsed
    #[error("Invalid endpoint {0}: {1}")]
    InvalidUrl(String, String),

    /// Transport or node error
    #[error("{0}")]
    Rpc(#[from] ProviderError),

    /// The node answered with a value the client cannot use
    #[error("Invalid {0} returned by node")]
    InvalidResponse(String),

    /// The node did not produce a receipt in time
    #[error("Transaction {0:?} was not mined within {1:?}")]
    ReceiptTimeout(H256, Duration),
}

/// Result type for connection operations
pub type Result<T> = std::result::Result<T, ConnectionError>;

/// Build the node endpoint URL
pub fn rpc_url(secure: bool, host: &str, port: u16) -> String {
    let scheme = if secure { "https" } else { "http" };
    if port == 0 {
        format!("{}://{}", scheme, host)
    } else {
        format!("{}://{}:{}", scheme, host, port)
    }
}

/// Connection to an Ebakus node
#[derive(Debug, Clone)]
pub struct Connection {
    /// Node endpoint
    url: String,

    /// JSON-RPC provider
    provider: Provider<Http>,

    /// How often to poll for receipts
    receipt_poll_interval: Duration,

    /// How long to wait for a receipt
    receipt_timeout: Duration,
}

impl Connection {
    /// Create a new connection, no request is made until the first call
    pub fn new(secure: bool, host: &str, port: u16) -> Result<Self> {
        let url = rpc_url(secure, host, port);
        let provider = Provider::<Http>::try_from(url.as_str())
            .map_err(|e| ConnectionError::InvalidUrl(url.clone(), e.to_string()))?;

        Ok(Self {
            url,
            provider,
            receipt_poll_interval: Duration::from_secs(1),
            receipt_timeout: Duration::from_secs(750),
        })
    }

    /// Create a connection from a client configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(config.secure, &config.host, config.port)?
            .with_receipt_polling(config.receipt_poll_interval, config.receipt_timeout))
    }

    /// Set receipt polling
    pub fn with_receipt_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self.receipt_timeout = timeout;
        self
    }

    /// Node endpoint
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: std::fmt::Debug + Serialize + Send + Sync,
        R: std::fmt::Debug + Serialize + DeserializeOwned + Send,
    {
        debug!("RPC {} -> {}", method, self.url);
        let result = self.provider.request(method, params).await?;
        Ok(result)
    }

    /// Number of transactions sent from `address`
    pub async fn transaction_count(&self, address: Address) -> Result<U256> {
        self.call("eth_getTransactionCount", (address, BlockNumber::Latest))
            .await
    }

    /// Gas estimate for a transaction
    pub async fn estimate_gas(&self, tx: &PendingTransaction) -> Result<U256> {
        self.call("eth_estimateGas", [tx]).await
    }

    /// Chain id used for replay protected signatures
    pub async fn chain_id(&self) -> Result<u64> {
        let chain_id: U256 = self.call("eth_chainId", ()).await?;
        u64::try_from(chain_id)
            .map_err(|_| ConnectionError::InvalidResponse(format!("chain id {}", chain_id)))
    }

    /// Proof-of-work difficulty the node suggests for `address`
    pub async fn suggest_difficulty(&self, address: Address) -> Result<Value> {
        self.call("eth_suggestDifficulty", [address]).await
    }

    /// Transaction augmented with a proof-of-work nonce for `difficulty`
    pub async fn calculate_work(
        &self,
        tx: &PendingTransaction,
        difficulty: &Value,
    ) -> Result<PendingTransaction> {
        self.call("eth_calculateWorkForTransaction", (tx, difficulty))
            .await
    }

    /// Submit a signed transaction
    pub async fn send_raw_transaction(&self, raw: &Bytes) -> Result<H256> {
        debug!("Submitting signed transaction 0x{}", hex::encode(raw));
        self.call("eth_sendRawTransaction", [raw]).await
    }

    /// Submit a transaction for the node to sign
    pub async fn send_transaction(&self, tx: &PendingTransaction) -> Result<H256> {
        self.call("eth_sendTransaction", [tx]).await
    }

    /// Receipt of a transaction, `None` while it is pending
    pub async fn transaction_receipt(&self, hash: H256) -> Result<Option<Receipt>> {
        self.call("eth_getTransactionReceipt", [hash]).await
    }

    /// Poll until the transaction has a receipt
    pub async fn wait_for_receipt(&self, hash: H256) -> Result<Receipt> {
        let deadline = Instant::now() + self.receipt_timeout;
        loop {
            if let Some(receipt) = self.transaction_receipt(hash).await? {
                return Ok(receipt);
            }

            if Instant::now() >= deadline {
                return Err(ConnectionError::ReceiptTimeout(hash, self.receipt_timeout));
            }

            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }

    /// Fetch a single record
    pub async fn db_get(
        &self,
        address: Address,
        table: &str,
        where_clause: &str,
        order_clause: &str,
        block: BlockNumber,
    ) -> Result<Value> {
        self.call("db_get", (address, table, where_clause, order_clause, block))
            .await
    }

    /// Open a cursor, returning the node's opaque handle
    pub async fn db_select(
        &self,
        address: Address,
        table: &str,
        where_clause: &str,
        order_clause: &str,
        block: BlockNumber,
    ) -> Result<Value> {
        self.call("db_select", (address, table, where_clause, order_clause, block))
            .await
    }

    /// Advance a cursor
    pub async fn db_next(&self, handle: &Value) -> Result<Value> {
        self.call("db_next", [handle]).await
    }
}
