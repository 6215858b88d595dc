use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use cashew_core::error::WalletError;
use cashew_core::mint::{Mint, MintKeys};
use cashew_core::proof::{sum_proof_amounts, Proof};
use cashew_core::transaction::{
    NewTransaction, TransactionData, TransactionRecord, TransactionStatus,
};
use cashew_core::types::{Amount, TransactionId};
use cashew_crypto::Seed;

// ── Transaction ledger ───────────────────────────────────────────────────────

/// Append-only record of wallet transactions. Status changes add a history
/// entry; earlier entries are never rewritten.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    async fn add_transaction(&self, tx: NewTransaction) -> Result<TransactionRecord, WalletError>;

    async fn update_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        data: TransactionData,
    ) -> Result<TransactionRecord, WalletError>;

    async fn update_received_amount(
        &self,
        id: TransactionId,
        amount: Amount,
    ) -> Result<TransactionRecord, WalletError>;

    async fn update_balance_after(
        &self,
        id: TransactionId,
        balance: Amount,
    ) -> Result<TransactionRecord, WalletError>;

    async fn get_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, WalletError>;

    /// Newest first.
    async fn recent_transactions(&self, limit: usize)
        -> Result<Vec<TransactionRecord>, WalletError>;
}

// ── Proof store ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddedProofs {
    pub added_amount: Amount,
    pub added_proofs: Vec<Proof>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MintBalance {
    pub mint_url: String,
    pub balance: Amount,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    /// Spendable value across all mints.
    pub total_balance: Amount,
    pub total_pending: Amount,
    pub mint_balances: Vec<MintBalance>,
}

impl Balances {
    /// Spendable balance per mint (first-seen order) plus pending totals.
    pub fn from_proofs<'a>(proofs: impl IntoIterator<Item = &'a Proof>) -> Self {
        let mut balances = Balances::default();
        for proof in proofs {
            if proof.is_pending {
                balances.total_pending += proof.amount;
                continue;
            }
            balances.total_balance += proof.amount;
            let url = proof.mint_url.clone().unwrap_or_default();
            match balances.mint_balances.iter_mut().find(|b| b.mint_url == url) {
                Some(entry) => entry.balance += proof.amount,
                None => balances.mint_balances.push(MintBalance {
                    mint_url: url,
                    balance: proof.amount,
                }),
            }
        }
        balances
    }
}

/// The wallet's proofs, keyed by secret.
#[async_trait]
pub trait ProofStore: Send + Sync {
    /// Store `proofs` flagged with `is_pending`. Structurally invalid
    /// proofs and secrets already held are skipped, so the result may cover
    /// fewer proofs than submitted.
    async fn add_proofs(
        &self,
        proofs: Vec<Proof>,
        is_pending: bool,
    ) -> Result<AddedProofs, WalletError>;

    async fn proofs(&self, is_pending: bool) -> Result<Vec<Proof>, WalletError>;

    async fn balances(&self) -> Result<Balances, WalletError>;
}

/// Split `proofs` into the ones a store may accept. `held` reports secrets
/// already present in the store.
pub(crate) fn screen_proofs(
    proofs: Vec<Proof>,
    is_pending: bool,
    held: impl Fn(&str) -> Result<bool, WalletError>,
) -> Result<AddedProofs, WalletError> {
    let mut seen = HashSet::new();
    let mut accepted = Vec::with_capacity(proofs.len());

    for mut proof in proofs {
        if !proof.amount.is_power_of_two() || proof.secret.is_empty() || proof.c.is_empty() {
            warn!(amount = proof.amount, keyset = %proof.id, "rejecting malformed proof");
            continue;
        }
        if held(&proof.secret)? || !seen.insert(proof.secret.clone()) {
            warn!(keyset = %proof.id, "skipping proof already in store");
            continue;
        }
        proof.is_pending = is_pending;
        accepted.push(proof);
    }

    Ok(AddedProofs {
        added_amount: sum_proof_amounts(&accepted),
        added_proofs: accepted,
    })
}

// ── Mint registry ────────────────────────────────────────────────────────────

#[async_trait]
pub trait MintRegistry: Send + Sync {
    async fn all_mints(&self) -> Result<Vec<Mint>, WalletError>;

    async fn find_by_url(&self, mint_url: &str) -> Result<Option<Mint>, WalletError>;

    async fn add_mint(&self, mint: Mint) -> Result<(), WalletError>;

    async fn update_keys(
        &self,
        mint_url: &str,
        keyset_id: &str,
        keys: MintKeys,
    ) -> Result<(), WalletError>;

    /// Advance the mint's derivation counter; returns the new value.
    async fn increase_proofs_counter(&self, mint_url: &str, delta: u32)
        -> Result<u32, WalletError>;
}

// ── Key storage ──────────────────────────────────────────────────────────────

/// Where the wallet's secrets live.
#[async_trait]
pub trait KeyStorage: Send + Sync {
    async fn save_mnemonic(&self, phrase: &str) -> Result<(), WalletError>;

    async fn load_mnemonic(&self) -> Result<Option<String>, WalletError>;

    /// Store the seed and its correlation hash.
    async fn save_seed(&self, seed: &Seed) -> Result<(), WalletError>;

    async fn load_seed_hash(&self) -> Result<Option<String>, WalletError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proof(amount: Amount, secret: &str) -> Proof {
        Proof::new("009a1f293253e41e", amount, secret, "02c0ffee")
    }

    #[test]
    fn screening_drops_malformed_and_duplicate_proofs() {
        let batch = vec![
            proof(4, "a"),
            proof(3, "b"),
            proof(8, ""),
            proof(4, "a"),
            proof(16, "held"),
            proof(1, "c"),
        ];
        let added = screen_proofs(batch, true, |s| Ok(s == "held")).unwrap();
        assert_eq!(added.added_amount, 5);
        let secrets: Vec<_> = added.added_proofs.iter().map(|p| p.secret.as_str()).collect();
        assert_eq!(secrets, ["a", "c"]);
        assert!(added.added_proofs.iter().all(|p| p.is_pending));
    }

    #[test]
    fn balances_group_by_mint() {
        let mut a = proof(4, "a");
        a.mint_url = Some("https://a".into());
        let mut b = proof(8, "b");
        b.mint_url = Some("https://b".into());
        let mut c = proof(1, "c");
        c.mint_url = Some("https://a".into());
        let mut d = proof(2, "d");
        d.mint_url = Some("https://a".into());
        d.is_pending = true;

        let balances = Balances::from_proofs(&[a, b, c, d]);
        assert_eq!(balances.total_balance, 13);
        assert_eq!(balances.total_pending, 2);
        assert_eq!(
            balances.mint_balances,
            vec![
                MintBalance { mint_url: "https://a".into(), balance: 5 },
                MintBalance { mint_url: "https://b".into(), balance: 8 },
            ]
        );
    }
}
