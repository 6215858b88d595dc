use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use cashew_core::error::WalletError;
use cashew_core::mint::{Mint, MintKeys};
use cashew_core::proof::Proof;
use cashew_core::transaction::{
    NewTransaction, TransactionData, TransactionRecord, TransactionStatus,
};
use cashew_core::types::{Amount, TransactionId};
use cashew_crypto::{seed_hash, Seed};

use crate::store::{
    screen_proofs, AddedProofs, Balances, KeyStorage, MintRegistry, ProofStore, TransactionLedger,
};

const MNEMONIC_KEY: &str = "mnemonic";
const SEED_KEY: &str = "seed";
const SEED_HASH_KEY: &str = "seed_hash";

/// Persistent wallet database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees:
///   transactions — TransactionId (big-endian) → bincode(TransactionRecord)
///   proofs       — secret utf8 bytes          → bincode(Proof)
///   mints        — mint URL utf8 bytes        → bincode(Mint)
///   secrets      — utf8 key bytes             → raw bytes
///
/// `secrets` is stored unencrypted; this backend serves the CLI and local
/// development, not a device keychain.
pub struct WalletDb {
    db: sled::Db,
    transactions: sled::Tree,
    proofs: sled::Tree,
    mints: sled::Tree,
    secrets: sled::Tree,
}

impl WalletDb {
    /// Open or create the wallet database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let db = sled::open(path).map_err(|e| WalletError::Storage(e.to_string()))?;
        let transactions = db.open_tree("transactions").map_err(|e| WalletError::Storage(e.to_string()))?;
        let proofs       = db.open_tree("proofs").map_err(|e| WalletError::Storage(e.to_string()))?;
        let mints        = db.open_tree("mints").map_err(|e| WalletError::Storage(e.to_string()))?;
        let secrets      = db.open_tree("secrets").map_err(|e| WalletError::Storage(e.to_string()))?;
        Ok(Self { db, transactions, proofs, mints, secrets })
    }

    // ── Transactions ─────────────────────────────────────────────────────────

    pub fn get_transaction_sync(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, WalletError> {
        get_decoded(&self.transactions, id.to_be_bytes())
    }

    fn put_transaction(&self, tx: &TransactionRecord) -> Result<(), WalletError> {
        put_encoded(&self.transactions, tx.id.to_be_bytes(), tx)
    }

    /// Load, change and store one transaction.
    fn modify_transaction(
        &self,
        id: TransactionId,
        change: impl FnOnce(&mut TransactionRecord),
    ) -> Result<TransactionRecord, WalletError> {
        let mut tx = self
            .get_transaction_sync(id)?
            .ok_or(WalletError::TransactionNotFound(id))?;
        change(&mut tx);
        self.put_transaction(&tx)?;
        Ok(tx)
    }

    // ── Proofs ───────────────────────────────────────────────────────────────

    pub fn all_proofs(&self) -> Result<Vec<Proof>, WalletError> {
        let mut proofs = Vec::new();
        for item in self.proofs.iter() {
            let (_, bytes) = item.map_err(|e| WalletError::Storage(e.to_string()))?;
            let proof = bincode::deserialize(&bytes)
                .map_err(|e| WalletError::Serialization(e.to_string()))?;
            proofs.push(proof);
        }
        Ok(proofs)
    }

    // ── Mints ────────────────────────────────────────────────────────────────

    pub fn get_mint(&self, mint_url: &str) -> Result<Option<Mint>, WalletError> {
        get_decoded(&self.mints, mint_url.as_bytes())
    }

    pub fn put_mint(&self, mint: &Mint) -> Result<(), WalletError> {
        put_encoded(&self.mints, mint.mint_url.as_bytes(), mint)
    }

    fn modify_mint<T>(
        &self,
        mint_url: &str,
        change: impl FnOnce(&mut Mint) -> T,
    ) -> Result<T, WalletError> {
        let mut mint = self
            .get_mint(mint_url)?
            .ok_or_else(|| WalletError::UnknownMint(mint_url.to_string()))?;
        let out = change(&mut mint);
        self.put_mint(&mint)?;
        Ok(out)
    }

    fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>, WalletError> {
        self.secrets
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(|e| WalletError::KeyStorage(e.to_string()))
    }

    fn put_secret(&self, key: &str, value: &[u8]) -> Result<(), WalletError> {
        self.secrets
            .insert(key.as_bytes(), value)
            .map_err(|e| WalletError::KeyStorage(e.to_string()))?;
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), WalletError> {
        self.db.flush().map_err(|e| WalletError::Storage(e.to_string()))?;
        Ok(())
    }
}

fn get_decoded<K: AsRef<[u8]>, T: DeserializeOwned>(
    tree: &sled::Tree,
    key: K,
) -> Result<Option<T>, WalletError> {
    match tree.get(key).map_err(|e| WalletError::Storage(e.to_string()))? {
        Some(bytes) => {
            let value = bincode::deserialize(&bytes)
                .map_err(|e| WalletError::Serialization(e.to_string()))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

fn put_encoded<K: AsRef<[u8]>, T: Serialize>(
    tree: &sled::Tree,
    key: K,
    value: &T,
) -> Result<(), WalletError> {
    let bytes = bincode::serialize(value).map_err(|e| WalletError::Serialization(e.to_string()))?;
    tree.insert(key.as_ref(), bytes)
        .map_err(|e| WalletError::Storage(e.to_string()))?;
    Ok(())
}

// ── Repository impls ─────────────────────────────────────────────────────────

#[async_trait]
impl TransactionLedger for WalletDb {
    async fn add_transaction(&self, tx: NewTransaction) -> Result<TransactionRecord, WalletError> {
        // sled ids start at 0; ledger ids start at 1.
        let id = self
            .db
            .generate_id()
            .map_err(|e| WalletError::Storage(e.to_string()))?
            + 1;
        let record = TransactionRecord::from_new(id, tx);
        self.put_transaction(&record)?;
        debug!(tx_id = id, status = %record.status, "transaction added");
        Ok(record)
    }

    async fn update_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        data: TransactionData,
    ) -> Result<TransactionRecord, WalletError> {
        self.modify_transaction(id, |tx| tx.transition(status, data))
    }

    async fn update_received_amount(
        &self,
        id: TransactionId,
        amount: Amount,
    ) -> Result<TransactionRecord, WalletError> {
        self.modify_transaction(id, |tx| tx.amount = amount)
    }

    async fn update_balance_after(
        &self,
        id: TransactionId,
        balance: Amount,
    ) -> Result<TransactionRecord, WalletError> {
        self.modify_transaction(id, |tx| tx.balance_after = Some(balance))
    }

    async fn get_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, WalletError> {
        self.get_transaction_sync(id)
    }

    async fn recent_transactions(
        &self,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        let mut out = Vec::new();
        for item in self.transactions.iter().rev().take(limit) {
            let (_, bytes) = item.map_err(|e| WalletError::Storage(e.to_string()))?;
            let tx = bincode::deserialize(&bytes)
                .map_err(|e| WalletError::Serialization(e.to_string()))?;
            out.push(tx);
        }
        Ok(out)
    }
}

#[async_trait]
impl ProofStore for WalletDb {
    async fn add_proofs(
        &self,
        proofs: Vec<Proof>,
        is_pending: bool,
    ) -> Result<AddedProofs, WalletError> {
        let added = screen_proofs(proofs, is_pending, |secret| {
            self.proofs
                .contains_key(secret.as_bytes())
                .map_err(|e| WalletError::Storage(e.to_string()))
        })?;

        // All or nothing: a failed write leaves no partial set behind.
        let mut batch = sled::Batch::default();
        for proof in &added.added_proofs {
            let bytes = bincode::serialize(proof)
                .map_err(|e| WalletError::Serialization(e.to_string()))?;
            batch.insert(proof.secret.as_bytes(), bytes);
        }
        self.proofs
            .apply_batch(batch)
            .map_err(|e| WalletError::Storage(e.to_string()))?;
        Ok(added)
    }

    async fn proofs(&self, is_pending: bool) -> Result<Vec<Proof>, WalletError> {
        Ok(self
            .all_proofs()?
            .into_iter()
            .filter(|p| p.is_pending == is_pending)
            .collect())
    }

    async fn balances(&self) -> Result<Balances, WalletError> {
        Ok(Balances::from_proofs(&self.all_proofs()?))
    }
}

#[async_trait]
impl MintRegistry for WalletDb {
    async fn all_mints(&self) -> Result<Vec<Mint>, WalletError> {
        let mut mints = Vec::new();
        for item in self.mints.iter() {
            let (_, bytes) = item.map_err(|e| WalletError::Storage(e.to_string()))?;
            let mint = bincode::deserialize(&bytes)
                .map_err(|e| WalletError::Serialization(e.to_string()))?;
            mints.push(mint);
        }
        Ok(mints)
    }

    async fn find_by_url(&self, mint_url: &str) -> Result<Option<Mint>, WalletError> {
        self.get_mint(mint_url)
    }

    async fn add_mint(&self, mint: Mint) -> Result<(), WalletError> {
        self.put_mint(&mint)
    }

    async fn update_keys(
        &self,
        mint_url: &str,
        keyset_id: &str,
        keys: MintKeys,
    ) -> Result<(), WalletError> {
        self.modify_mint(mint_url, |mint| mint.update_keys(keyset_id, keys))
    }

    async fn increase_proofs_counter(
        &self,
        mint_url: &str,
        delta: u32,
    ) -> Result<u32, WalletError> {
        self.modify_mint(mint_url, |mint| mint.increase_proofs_counter(delta))
    }
}

#[async_trait]
impl KeyStorage for WalletDb {
    async fn save_mnemonic(&self, phrase: &str) -> Result<(), WalletError> {
        self.put_secret(MNEMONIC_KEY, phrase.as_bytes())
    }

    async fn load_mnemonic(&self) -> Result<Option<String>, WalletError> {
        self.get_secret(MNEMONIC_KEY)?
            .map(|bytes| String::from_utf8(bytes).map_err(|e| WalletError::KeyStorage(e.to_string())))
            .transpose()
    }

    async fn save_seed(&self, seed: &Seed) -> Result<(), WalletError> {
        self.put_secret(SEED_KEY, seed.as_bytes())?;
        self.put_secret(SEED_HASH_KEY, seed_hash(seed).as_bytes())
    }

    async fn load_seed_hash(&self) -> Result<Option<String>, WalletError> {
        self.get_secret(SEED_HASH_KEY)?
            .map(|bytes| String::from_utf8(bytes).map_err(|e| WalletError::KeyStorage(e.to_string())))
            .transpose()
    }
}
