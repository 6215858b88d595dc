use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

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

#[derive(Default)]
struct Secrets {
    mnemonic: Option<String>,
    seed: Option<Seed>,
    seed_hash: Option<String>,
}

/// Wallet repositories held in memory. Clones share state.
///
/// Backs tests and short-lived sessions; nothing survives the process.
#[derive(Clone, Default)]
pub struct MemoryWallet {
    transactions: Arc<RwLock<BTreeMap<TransactionId, TransactionRecord>>>,
    /// Insertion-ordered; secrets are unique.
    proofs: Arc<RwLock<Vec<Proof>>>,
    mints: Arc<RwLock<Vec<Mint>>>,
    secrets: Arc<RwLock<Secrets>>,
}

impl MemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A wallet that already trusts `mints`.
    pub fn with_mints(mints: Vec<Mint>) -> Self {
        Self {
            mints: Arc::new(RwLock::new(mints)),
            ..Self::default()
        }
    }

    /// Whether a seed has been saved.
    pub async fn has_seed(&self) -> bool {
        self.secrets.read().await.seed.is_some()
    }

    async fn modify_transaction(
        &self,
        id: TransactionId,
        change: impl FnOnce(&mut TransactionRecord),
    ) -> Result<TransactionRecord, WalletError> {
        let mut transactions = self.transactions.write().await;
        let tx = transactions
            .get_mut(&id)
            .ok_or(WalletError::TransactionNotFound(id))?;
        change(tx);
        Ok(tx.clone())
    }

    async fn modify_mint<T>(
        &self,
        mint_url: &str,
        change: impl FnOnce(&mut Mint) -> T,
    ) -> Result<T, WalletError> {
        let mut mints = self.mints.write().await;
        let mint = mints
            .iter_mut()
            .find(|m| m.mint_url == mint_url)
            .ok_or_else(|| WalletError::UnknownMint(mint_url.to_string()))?;
        Ok(change(mint))
    }
}

#[async_trait]
impl TransactionLedger for MemoryWallet {
    async fn add_transaction(&self, tx: NewTransaction) -> Result<TransactionRecord, WalletError> {
        let mut transactions = self.transactions.write().await;
        let id = transactions.keys().next_back().map_or(1, |last| last + 1);
        let record = TransactionRecord::from_new(id, tx);
        transactions.insert(id, record.clone());
        Ok(record)
    }

    async fn update_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        data: TransactionData,
    ) -> Result<TransactionRecord, WalletError> {
        self.modify_transaction(id, |tx| tx.transition(status, data)).await
    }

    async fn update_received_amount(
        &self,
        id: TransactionId,
        amount: Amount,
    ) -> Result<TransactionRecord, WalletError> {
        self.modify_transaction(id, |tx| tx.amount = amount).await
    }

    async fn update_balance_after(
        &self,
        id: TransactionId,
        balance: Amount,
    ) -> Result<TransactionRecord, WalletError> {
        self.modify_transaction(id, |tx| tx.balance_after = Some(balance))
            .await
    }

    async fn get_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, WalletError> {
        Ok(self.transactions.read().await.get(&id).cloned())
    }

    async fn recent_transactions(
        &self,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        let transactions = self.transactions.read().await;
        Ok(transactions.values().rev().take(limit).cloned().collect())
    }
}

#[async_trait]
impl ProofStore for MemoryWallet {
    async fn add_proofs(
        &self,
        proofs: Vec<Proof>,
        is_pending: bool,
    ) -> Result<AddedProofs, WalletError> {
        let mut stored = self.proofs.write().await;
        let added = screen_proofs(proofs, is_pending, |secret| {
            Ok(stored.iter().any(|p| p.secret == secret))
        })?;
        stored.extend(added.added_proofs.iter().cloned());
        Ok(added)
    }

    async fn proofs(&self, is_pending: bool) -> Result<Vec<Proof>, WalletError> {
        let stored = self.proofs.read().await;
        Ok(stored
            .iter()
            .filter(|p| p.is_pending == is_pending)
            .cloned()
            .collect())
    }

    async fn balances(&self) -> Result<Balances, WalletError> {
        Ok(Balances::from_proofs(self.proofs.read().await.iter()))
    }
}

#[async_trait]
impl MintRegistry for MemoryWallet {
    async fn all_mints(&self) -> Result<Vec<Mint>, WalletError> {
        Ok(self.mints.read().await.clone())
    }

    async fn find_by_url(&self, mint_url: &str) -> Result<Option<Mint>, WalletError> {
        let mints = self.mints.read().await;
        Ok(mints.iter().find(|m| m.mint_url == mint_url).cloned())
    }

    async fn add_mint(&self, mint: Mint) -> Result<(), WalletError> {
        let mut mints = self.mints.write().await;
        match mints.iter_mut().find(|m| m.mint_url == mint.mint_url) {
            Some(existing) => *existing = mint,
            None => mints.push(mint),
        }
        Ok(())
    }

    async fn update_keys(
        &self,
        mint_url: &str,
        keyset_id: &str,
        keys: MintKeys,
    ) -> Result<(), WalletError> {
        self.modify_mint(mint_url, |mint| mint.update_keys(keyset_id, keys))
            .await
    }

    async fn increase_proofs_counter(
        &self,
        mint_url: &str,
        delta: u32,
    ) -> Result<u32, WalletError> {
        self.modify_mint(mint_url, |mint| mint.increase_proofs_counter(delta))
            .await
    }
}

#[async_trait]
impl KeyStorage for MemoryWallet {
    async fn save_mnemonic(&self, phrase: &str) -> Result<(), WalletError> {
        self.secrets.write().await.mnemonic = Some(phrase.to_string());
        Ok(())
    }

    async fn load_mnemonic(&self) -> Result<Option<String>, WalletError> {
        Ok(self.secrets.read().await.mnemonic.clone())
    }

    async fn save_seed(&self, seed: &Seed) -> Result<(), WalletError> {
        let mut secrets = self.secrets.write().await;
        secrets.seed_hash = Some(seed_hash(seed));
        secrets.seed = Some(seed.clone());
        Ok(())
    }

    async fn load_seed_hash(&self) -> Result<Option<String>, WalletError> {
        Ok(self.secrets.read().await.seed_hash.clone())
    }
}
