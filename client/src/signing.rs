//! Local transaction signing
//!
//! Decrypts a V3 keystore into a wallet and signs Ebakus transactions with
//! it. Ebakus transactions carry a proof-of-work nonce right after the
//! account nonce and no gas price:
//!
//! `rlp([nonce, workNonce, gas, to, value, data, v, r, s])`
//!
//! with an EIP-155 `v`. The signed hash is taken over the first six fields
//! followed by `[chainId, 0, 0]`.

use std::io::Write;
use std::path::Path;

use ebakusdb_core::{KeystoreSource, PendingTransaction};
use ethers::signers::{LocalWallet, Signer, WalletError};
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use ethers::utils::rlp::RlpStream;
use serde_json::Value;
use thiserror::Error;

/// Error type for signing operations
#[derive(Error, Debug)]
pub enum SigningError {
    /// Keystore could not be read
    #[error("Failed to read keystore: {0}")]
    Io(#[from] std::io::Error),

    /// Keystore is not usable JSON
    #[error("Invalid keystore: {0}")]
    InvalidKeystore(String),

    /// Decryption or signing failed
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    /// The transaction is missing a field filled in during preparation
    #[error("Transaction is missing {0}")]
    MissingField(&'static str),
}

/// Result type for signing operations
pub type Result<T> = std::result::Result<T, SigningError>;

/// Account decrypted from a keystore
#[derive(Debug, Clone)]
pub struct LocalAccount {
    wallet: LocalWallet,
}

impl LocalAccount {
    /// Decrypt a keystore with `password`
    pub fn from_keystore(source: &KeystoreSource, password: &str) -> Result<Self> {
        let keystore = match source {
            KeystoreSource::Path(path) => read_keystore(path)?,
            KeystoreSource::Json(value) => value.clone(),
        };
        let keystore = normalize_keystore(keystore)?;

        // The decryptor only reads from disk
        let mut file = tempfile::NamedTempFile::new()?;
        let contents = serde_json::to_vec(&keystore)
            .map_err(|e| SigningError::InvalidKeystore(e.to_string()))?;
        file.write_all(&contents)?;
        file.flush()?;

        let wallet = LocalWallet::decrypt_keystore(file.path(), password)?;
        Ok(Self { wallet })
    }

    /// Wrap an existing wallet
    pub fn from_wallet(wallet: LocalWallet) -> Self {
        Self { wallet }
    }

    /// Account address
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Sign a prepared transaction, returning the raw bytes to submit
    pub fn sign_transaction(&self, tx: &PendingTransaction, chain_id: u64) -> Result<Bytes> {
        let hash = signing_hash(tx, chain_id)?;
        let signature = self.wallet.sign_hash(hash)?;

        let v = signature.v - 27 + chain_id * 2 + 35;
        let mut stream = RlpStream::new_list(9);
        append_fields(&mut stream, tx)?;
        stream.append(&v);
        stream.append(&signature.r);
        stream.append(&signature.s);

        Ok(Bytes::from(stream.out().to_vec()))
    }
}

/// Hash signed for an Ebakus transaction on `chain_id`
pub fn signing_hash(tx: &PendingTransaction, chain_id: u64) -> Result<H256> {
    let mut stream = RlpStream::new_list(9);
    append_fields(&mut stream, tx)?;
    stream.append(&chain_id);
    stream.append(&0u8);
    stream.append(&0u8);

    Ok(H256::from(keccak256(stream.out())))
}

fn append_fields(stream: &mut RlpStream, tx: &PendingTransaction) -> Result<()> {
    stream.append(&tx.nonce.ok_or(SigningError::MissingField("nonce"))?);
    stream.append(&tx.work_nonce.ok_or(SigningError::MissingField("workNonce"))?);
    stream.append(&tx.gas.ok_or(SigningError::MissingField("gas"))?);
    stream.append(&tx.to);
    stream.append(&U256::zero());
    stream.append(&tx.data.to_vec());
    Ok(())
}

fn read_keystore(path: &Path) -> Result<Value> {
    let contents = std::fs::read(path)?;
    serde_json::from_slice(&contents).map_err(|e| SigningError::InvalidKeystore(e.to_string()))
}

/// Inline keystores may be wrapped in an array, the first entry is used
fn normalize_keystore(keystore: Value) -> Result<Value> {
    match keystore {
        Value::Object(_) => Ok(keystore),
        Value::Array(mut entries) if !entries.is_empty() => {
            normalize_keystore(entries.swap_remove(0))
        }
        other => Err(SigningError::InvalidKeystore(format!(
            "expected a keystore object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ethers::types::Signature;
    use ethers::utils::rlp::Rlp;
    use serde_json::json;
    use std::path::PathBuf;

    /// Write a fresh keystore into `dir`, returning its path and address
    pub(crate) fn create_keystore(dir: &Path, password: &str) -> (PathBuf, Address) {
        let mut rng = rand::thread_rng();
        let (wallet, name) = LocalWallet::new_keystore(dir, &mut rng, password, None).unwrap();
        (dir.join(name), wallet.address())
    }

    /// Recover the signer of a raw transaction produced by `sign_transaction`
    pub(crate) fn recover_signer(raw: &Bytes, tx: &PendingTransaction, chain_id: u64) -> Address {
        let rlp = Rlp::new(raw.as_ref());
        let v: u64 = rlp.val_at(6).unwrap();
        let signature = Signature {
            r: rlp.val_at(7).unwrap(),
            s: rlp.val_at(8).unwrap(),
            v: v - chain_id * 2 - 35 + 27,
        };

        signature.recover(signing_hash(tx, chain_id).unwrap()).unwrap()
    }

    fn prepared_tx() -> PendingTransaction {
        PendingTransaction {
            from: Address::repeat_byte(0x01),
            to: ebakusdb_core::EBAKUS_DB_CONTRACT_ADDRESS,
            data: Bytes::from(vec![0xca, 0xfe]),
            nonce: Some(U256::from(3)),
            gas: Some(U256::from(100_000)),
            work_nonce: Some(U256::from(42)),
        }
    }

    #[test]
    fn test_decrypt_keystore_from_path_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let (path, address) = create_keystore(dir.path(), "123");

        let account =
            LocalAccount::from_keystore(&KeystoreSource::Path(path.clone()), "123").unwrap();
        assert_eq!(account.address(), address);

        let inline: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let account =
            LocalAccount::from_keystore(&KeystoreSource::Json(json!([inline])), "123").unwrap();
        assert_eq!(account.address(), address);
    }

    #[test]
    fn test_wrong_password() {
        let dir = tempfile::tempdir().unwrap();
        let (path, _) = create_keystore(dir.path(), "123");

        let result = LocalAccount::from_keystore(&KeystoreSource::Path(path), "456");
        assert!(matches!(result, Err(SigningError::Wallet(_))));
    }

    #[test]
    fn test_invalid_keystore_json() {
        let result = LocalAccount::from_keystore(&KeystoreSource::Json(json!([])), "123");
        assert!(matches!(result, Err(SigningError::InvalidKeystore(_))));

        let result = LocalAccount::from_keystore(
            &KeystoreSource::Path(PathBuf::from("/nonexistent/keystore.json")),
            "123",
        );
        assert!(matches!(result, Err(SigningError::Io(_))));
    }

    #[test]
    fn test_signature_recovers_account() {
        let wallet = LocalWallet::new(&mut rand::thread_rng());
        let account = LocalAccount::from_wallet(wallet);
        let tx = prepared_tx();

        let raw = account.sign_transaction(&tx, 10).unwrap();
        assert_eq!(recover_signer(&raw, &tx, 10), account.address());

        let rlp = Rlp::new(raw.as_ref());
        assert_eq!(rlp.item_count().unwrap(), 9);
        assert_eq!(rlp.val_at::<U256>(1).unwrap(), U256::from(42));
        assert_eq!(rlp.val_at::<Address>(3).unwrap(), tx.to);
        let v = rlp.val_at::<u64>(6).unwrap();
        assert!(v == 55 || v == 56);
    }

    #[test]
    fn test_unprepared_transaction_is_rejected() {
        let account = LocalAccount::from_wallet(LocalWallet::new(&mut rand::thread_rng()));
        let mut tx = prepared_tx();
        tx.work_nonce = None;

        let result = account.sign_transaction(&tx, 10);
        assert!(matches!(result, Err(SigningError::MissingField("workNonce"))));
    }
}
