//! Contracts of the services recovery talks to. Wire-level clients live
//! outside this crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use cashew_core::error::WalletError;
use cashew_core::mint::MintKeys;
use cashew_core::proof::Proof;
use cashew_core::types::RestoreInterval;
use cashew_crypto::Seed;

// ── Mint ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreResponse {
    pub proofs: Vec<Proof>,
    /// Set when the mint signed with keys the wallet does not hold yet.
    pub new_keys: Option<MintKeys>,
}

/// Mint-reported state of a set of proofs. Both lists are subsets of the
/// proofs asked about.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProofStates {
    pub spent: Vec<Proof>,
    pub pending: Vec<Proof>,
}

#[async_trait]
pub trait MintClient: Send + Sync {
    /// Re-derive the blinded messages for `interval` from `seed` and ask
    /// the mint for the signatures it issued on them. Deterministic per
    /// (mint, interval, seed).
    async fn restore(
        &self,
        mint_url: &str,
        interval: RestoreInterval,
        seed: &Seed,
    ) -> Result<RestoreResponse, WalletError>;

    async fn spent_or_pending(
        &self,
        mint_url: &str,
        proofs: &[Proof],
    ) -> Result<ProofStates, WalletError>;
}

// ── Wallet-name directory ────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletProfile {
    /// Nostr public key (hex) the profile is bound to.
    pub pubkey: String,
    /// Wallet address, e.g. `alice@minibits.cash`.
    pub nip05: String,
    pub name: Option<String>,
}

/// The wallet-name service, keyed by seed hash.
#[async_trait]
pub trait WalletProfileDirectory: Send + Sync {
    async fn find_by_seed_hash(&self, seed_hash: &str)
        -> Result<Option<WalletProfile>, WalletError>;

    /// Re-bind the profile registered under `seed_hash` to `pubkey`.
    async fn recover(&self, seed_hash: &str, pubkey: &str) -> Result<WalletProfile, WalletError>;
}
