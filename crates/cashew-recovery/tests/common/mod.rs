//! Scripted collaborators shared by the recovery integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use cashew_core::error::WalletError;
use cashew_core::mint::{Mint, MintKeys};
use cashew_core::proof::Proof;
use cashew_core::transaction::{
    NewTransaction, TransactionData, TransactionRecord, TransactionStatus,
};
use cashew_core::types::{Amount, RestoreInterval, TransactionId};
use cashew_crypto::Seed;
use cashew_recovery::{
    MintClient, ProofStates, RecoveryConfig, RecoveryOrchestrator, RestoreResponse, WalletProfile,
    WalletProfileDirectory,
};
use cashew_state::{AddedProofs, Balances, MemoryWallet, ProofStore, TransactionLedger};

pub const KEYSET: &str = "009a1f293253e41e";

pub fn proof(amount: Amount, secret: &str) -> Proof {
    Proof::new(KEYSET, amount, secret, format!("02{secret}"))
}

pub fn seed() -> Seed {
    Seed::from_bytes([42u8; 64])
}

pub fn keys(pairs: &[(&str, &str)]) -> MintKeys {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ── Mint ─────────────────────────────────────────────────────────────────────

/// What the mint says about the proofs it is asked about.
pub enum StateScript {
    NoneSpent,
    AllSpent,
    /// Secrets reported spent and pending.
    Mixed { spent: Vec<&'static str>, pending: Vec<&'static str> },
    Fail(WalletError),
}

/// A mint client answering from per-URL scripts. Unscripted restores return
/// nothing; unscripted state checks report nothing spent.
#[derive(Default)]
pub struct ScriptedMint {
    restores: Mutex<HashMap<String, VecDeque<Result<RestoreResponse, WalletError>>>>,
    states: Mutex<HashMap<String, VecDeque<StateScript>>>,
    pub restore_calls: Mutex<Vec<(String, RestoreInterval)>>,
}

impl ScriptedMint {
    pub fn on_restore(&self, mint_url: &str, response: Result<RestoreResponse, WalletError>) {
        self.restores
            .lock()
            .unwrap()
            .entry(mint_url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn on_restore_proofs(&self, mint_url: &str, proofs: Vec<Proof>) {
        self.on_restore(mint_url, Ok(RestoreResponse { proofs, new_keys: None }));
    }

    pub fn on_states(&self, mint_url: &str, script: StateScript) {
        self.states
            .lock()
            .unwrap()
            .entry(mint_url.to_string())
            .or_default()
            .push_back(script);
    }
}

#[async_trait]
impl MintClient for ScriptedMint {
    async fn restore(
        &self,
        mint_url: &str,
        interval: RestoreInterval,
        _seed: &Seed,
    ) -> Result<RestoreResponse, WalletError> {
        self.restore_calls
            .lock()
            .unwrap()
            .push((mint_url.to_string(), interval));
        self.restores
            .lock()
            .unwrap()
            .get_mut(mint_url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(RestoreResponse::default()))
    }

    async fn spent_or_pending(
        &self,
        mint_url: &str,
        proofs: &[Proof],
    ) -> Result<ProofStates, WalletError> {
        let script = self
            .states
            .lock()
            .unwrap()
            .get_mut(mint_url)
            .and_then(VecDeque::pop_front)
            .unwrap_or(StateScript::NoneSpent);

        let pick = |secrets: &[&str]| -> Vec<Proof> {
            proofs
                .iter()
                .filter(|p| secrets.contains(&p.secret.as_str()))
                .cloned()
                .collect()
        };

        match script {
            StateScript::NoneSpent => Ok(ProofStates::default()),
            StateScript::AllSpent => Ok(ProofStates {
                spent: proofs.to_vec(),
                pending: Vec::new(),
            }),
            StateScript::Mixed { spent, pending } => Ok(ProofStates {
                spent: pick(&spent),
                pending: pick(&pending),
            }),
            StateScript::Fail(err) => Err(err),
        }
    }
}

// ── Stores ───────────────────────────────────────────────────────────────────

/// Proof store whose writes always fail.
pub struct BrokenProofStore {
    pub inner: MemoryWallet,
    pub message: String,
}

#[async_trait]
impl ProofStore for BrokenProofStore {
    async fn add_proofs(
        &self,
        _proofs: Vec<Proof>,
        _is_pending: bool,
    ) -> Result<AddedProofs, WalletError> {
        Err(WalletError::Storage(self.message.clone()))
    }

    async fn proofs(&self, is_pending: bool) -> Result<Vec<Proof>, WalletError> {
        self.inner.proofs(is_pending).await
    }

    async fn balances(&self) -> Result<Balances, WalletError> {
        self.inner.balances().await
    }
}

/// Proof store that accepts spendable proofs and fails on pending ones.
pub struct PendingFailingProofStore {
    pub inner: MemoryWallet,
}

#[async_trait]
impl ProofStore for PendingFailingProofStore {
    async fn add_proofs(
        &self,
        proofs: Vec<Proof>,
        is_pending: bool,
    ) -> Result<AddedProofs, WalletError> {
        if is_pending {
            return Err(WalletError::Storage("pending tree unavailable".into()));
        }
        self.inner.add_proofs(proofs, is_pending).await
    }

    async fn proofs(&self, is_pending: bool) -> Result<Vec<Proof>, WalletError> {
        self.inner.proofs(is_pending).await
    }

    async fn balances(&self) -> Result<Balances, WalletError> {
        self.inner.balances().await
    }
}

/// Ledger that cannot stamp `balance_after`; everything else is delegated.
pub struct NoBalanceStampLedger {
    pub inner: MemoryWallet,
}

#[async_trait]
impl TransactionLedger for NoBalanceStampLedger {
    async fn add_transaction(&self, tx: NewTransaction) -> Result<TransactionRecord, WalletError> {
        self.inner.add_transaction(tx).await
    }

    async fn update_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        data: TransactionData,
    ) -> Result<TransactionRecord, WalletError> {
        self.inner.update_status(id, status, data).await
    }

    async fn update_received_amount(
        &self,
        id: TransactionId,
        amount: Amount,
    ) -> Result<TransactionRecord, WalletError> {
        self.inner.update_received_amount(id, amount).await
    }

    async fn update_balance_after(
        &self,
        _id: TransactionId,
        _balance: Amount,
    ) -> Result<TransactionRecord, WalletError> {
        Err(WalletError::Storage("ledger is read-only".into()))
    }

    async fn get_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, WalletError> {
        self.inner.get_transaction(id).await
    }

    async fn recent_transactions(
        &self,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        self.inner.recent_transactions(limit).await
    }
}

// ── Wallet-name directory ────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeProfiles {
    pub profile: Mutex<Option<WalletProfile>>,
    pub looked_up: Mutex<Vec<String>>,
}

impl FakeProfiles {
    pub fn with(nip05: &str) -> Self {
        let profiles = Self::default();
        *profiles.profile.lock().unwrap() = Some(WalletProfile {
            pubkey: "old-pubkey".into(),
            nip05: nip05.into(),
            name: None,
        });
        profiles
    }
}

#[async_trait]
impl WalletProfileDirectory for FakeProfiles {
    async fn find_by_seed_hash(
        &self,
        seed_hash: &str,
    ) -> Result<Option<WalletProfile>, WalletError> {
        self.looked_up.lock().unwrap().push(seed_hash.to_string());
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn recover(&self, _seed_hash: &str, pubkey: &str) -> Result<WalletProfile, WalletError> {
        let mut guard = self.profile.lock().unwrap();
        let profile = guard
            .as_mut()
            .ok_or_else(|| WalletError::Other("no profile".into()))?;
        profile.pubkey = pubkey.to_string();
        Ok(profile.clone())
    }
}

/// Directory whose service cannot be reached.
pub struct UnreachableProfiles;

#[async_trait]
impl WalletProfileDirectory for UnreachableProfiles {
    async fn find_by_seed_hash(
        &self,
        _seed_hash: &str,
    ) -> Result<Option<WalletProfile>, WalletError> {
        Err(WalletError::Other("wallet-name service unreachable".into()))
    }

    async fn recover(&self, _seed_hash: &str, _pubkey: &str) -> Result<WalletProfile, WalletError> {
        Err(WalletError::Other("wallet-name service unreachable".into()))
    }
}

// ── Wiring ───────────────────────────────────────────────────────────────────

pub fn orchestrator(client: Arc<ScriptedMint>, wallet: &MemoryWallet) -> RecoveryOrchestrator {
    RecoveryOrchestrator::new(
        client,
        Arc::new(wallet.clone()),
        Arc::new(wallet.clone()),
        Arc::new(wallet.clone()),
        RecoveryConfig::default(),
    )
}

pub fn wallet_with(urls: &[&str]) -> MemoryWallet {
    MemoryWallet::with_mints(urls.iter().map(|u| Mint::new(*u)).collect())
}
