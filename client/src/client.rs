//! EbakusDB client
//!
//! Holds the connection, the table schemas and the signing account, and
//! provides `send_command`, the single transaction submission path every
//! table write goes through.

use std::sync::atomic::{AtomicU64, Ordering};

use ebakusdb_core::error::{to_config_error, to_reply_error};
use ebakusdb_core::{
    AbiParams, ClientConfig, EbakusDbError, PendingTransaction, Receipt, Record, Result, Schema,
    SigningMode, TxPayload,
};
use ethers::types::Address;
use log::{debug, info, warn};

use crate::connection::{Connection, ConnectionError};
use crate::signing::LocalAccount;

/// Process-wide counter handing out connection ids
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(0);

/// Resolved signing capability
#[derive(Debug)]
enum Signer {
    /// Sign in-process
    Local(LocalAccount),

    /// The node signs
    Remote,
}

/// Client for an EbakusDB instance on an Ebakus node
#[derive(Debug)]
pub struct EbakusDbClient {
    /// Client configuration
    config: ClientConfig,

    /// Node connection
    connection: Connection,

    /// Signing capability
    signer: Signer,

    /// Address transactions are sent from
    address: Address,

    /// Unique id of this client within the process
    connection_id: u64,
}

impl EbakusDbClient {
    /// Create a new client
    ///
    /// Validates the configuration and, for local signing, decrypts the
    /// keystore. No request is made to the node.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let (signer, address) = match &config.signing {
            SigningMode::Local { keystore, password } => {
                let account = LocalAccount::from_keystore(keystore, password)
                    .map_err(to_config_error)?;
                let address = account.address();
                (Signer::Local(account), address)
            }
            SigningMode::Remote { address } => (Signer::Remote, *address),
        };

        let connection = Connection::from_config(&config).map_err(to_config_error)?;
        let connection_id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::SeqCst);

        info!(
            "EbakusDB client {} connected to {} ({} signing as {:?})",
            connection_id,
            connection.url(),
            config.signing.name(),
            address
        );

        Ok(Self {
            config,
            connection,
            signer,
            address,
            connection_id,
        })
    }

    /// Unique, increasing id of this client within the process
    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// Address transactions are sent from and reads are made as
    pub fn address(&self) -> Address {
        self.address
    }

    /// Whether transactions are signed in-process
    pub fn is_local_signing(&self) -> bool {
        matches!(self.signer, Signer::Local(_))
    }

    /// Table schemas
    pub fn schema(&self) -> &Schema {
        &self.config.schema
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Map a record onto the ABI parameters of `table_name`
    pub fn to_abi_data(
        &self,
        table_name: &str,
        record: &Record,
        include: Option<&[&str]>,
    ) -> Result<AbiParams> {
        self.config.schema.to_abi_data(table_name, record, include)
    }

    /// Submit a transaction and wait for its receipt
    ///
    /// Fails with `TransactionFailure` if the node reports a non-success
    /// status, and with `Reply` for anything that goes wrong on the way.
    pub async fn send_command(&self, payload: TxPayload) -> Result<Receipt> {
        let tx = PendingTransaction::new(self.address, payload);

        let hash = match &self.signer {
            Signer::Local(account) => {
                let (tx, chain_id) = self.prepare_local(tx).await.map_err(|e| {
                    EbakusDbError::Reply(format!(
                        "Failed to create locally signed transaction: {}",
                        e
                    ))
                })?;
                let raw = account
                    .sign_transaction(&tx, chain_id)
                    .map_err(to_reply_error)?;
                self.connection
                    .send_raw_transaction(&raw)
                    .await
                    .map_err(to_reply_error)?
            }
            Signer::Remote => self
                .connection
                .send_transaction(&tx)
                .await
                .map_err(to_reply_error)?,
        };

        debug!("Transaction {:?} submitted by client {}", hash, self.connection_id);

        let receipt = self
            .connection
            .wait_for_receipt(hash)
            .await
            .map_err(to_reply_error)?;

        if !receipt.is_success() {
            warn!("Transaction {:?} failed", hash);
            return Err(EbakusDbError::transaction_failure(receipt));
        }

        Ok(receipt)
    }

    /// Fill in nonce, gas and proof-of-work, returning the chain id to sign for
    async fn prepare_local(
        &self,
        mut tx: PendingTransaction,
    ) -> std::result::Result<(PendingTransaction, u64), ConnectionError> {
        tx.nonce = Some(self.connection.transaction_count(tx.from).await?);
        tx.gas = Some(self.connection.estimate_gas(&tx).await?);
        let chain_id = self.connection.chain_id().await?;

        let difficulty = self.connection.suggest_difficulty(tx.from).await?;
        let mut with_work = self.connection.calculate_work(&tx, &difficulty).await?;

        // Only the work nonce is taken from the node's answer
        tx.work_nonce = with_work.work_nonce.take();
        debug!("Proof-of-work for nonce {:?} at difficulty {}", tx.nonce, difficulty);

        Ok((tx, chain_id))
    }
}
