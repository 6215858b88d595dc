use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::mint::Mint;
use crate::types::{Amount, TransactionId};

// ── Proof ────────────────────────────────────────────────────────────────────

/// A mint-issued unit of e-cash.
///
/// `secret` is unique per proof and serves as its identity: two proofs with
/// the same amount and keyset are different proofs unless their secrets
/// match. The wallet-side fields (`mint_url`, `tx_id`, `is_pending`) are
/// never part of the wire encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Keyset identifier of the key that signed this proof.
    pub id: String,
    pub amount: Amount,
    pub secret: String,
    /// Unblinded signature (hex-encoded point).
    #[serde(rename = "C")]
    pub c: String,
    pub mint_url: Option<String>,
    /// Transaction that brought this proof into the wallet.
    pub tx_id: Option<TransactionId>,
    pub is_pending: bool,
}

impl Proof {
    pub fn new(
        id: impl Into<String>,
        amount: Amount,
        secret: impl Into<String>,
        c: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            secret: secret.into(),
            c: c.into(),
            mint_url: None,
            tx_id: None,
            is_pending: false,
        }
    }

    /// Identity key used for every set operation over proofs.
    pub fn identity(&self) -> &str {
        &self.secret
    }
}

// ── Arithmetic ───────────────────────────────────────────────────────────────

/// Sum of proof amounts; 0 for an empty slice.
pub fn sum_proof_amounts(proofs: &[Proof]) -> Amount {
    proofs.iter().map(|p| p.amount).sum()
}

/// Greedy first-fit selection of proofs towards `target`.
///
/// Walks `proofs` in the given order and accepts a proof while the running
/// sum is still below `target`. The proof that crosses the target is kept,
/// so the selection can overshoot; nothing is reordered and no better fit
/// is searched for. This is a streaming approximation, not minimal coin
/// selection.
///
/// When `proofs` cannot reach `target` the whole input is returned and the
/// caller has to detect the shortfall.
pub fn select_proofs_for_amount(target: Amount, proofs: &[Proof]) -> Vec<Proof> {
    let mut selected_amount: Amount = 0;
    proofs
        .iter()
        .take_while(|p| {
            if selected_amount < target {
                selected_amount += p.amount;
                true
            } else {
                false
            }
        })
        .cloned()
        .collect()
}

/// Proofs of `proofs` whose identity does not appear in `to_exclude`.
pub fn exclude_proofs(proofs: &[Proof], to_exclude: &[Proof]) -> Vec<Proof> {
    let excluded: HashSet<&str> = to_exclude.iter().map(Proof::identity).collect();
    proofs
        .iter()
        .filter(|p| !excluded.contains(p.identity()))
        .cloned()
        .collect()
}

/// Distinct keyset ids referenced by `proofs`, in first-seen order.
pub fn keysets_of(proofs: &[Proof]) -> Vec<String> {
    let mut seen = HashSet::new();
    proofs
        .iter()
        .filter(|p| seen.insert(p.id.as_str()))
        .map(|p| p.id.clone())
        .collect()
}

/// The mint whose keysets include the proof's keyset, if any. When several
/// mints list the keyset, the last one in `mints` wins.
pub fn mint_for_proof<'a>(proof: &Proof, mints: &'a [Mint]) -> Option<&'a Mint> {
    mints.iter().rfind(|m| m.has_keyset(&proof.id))
}

/// Proofs signed by one of `mint`'s keysets.
pub fn proofs_for_mint(mint: &Mint, proofs: &[Proof]) -> Vec<Proof> {
    proofs
        .iter()
        .filter(|p| mint.has_keyset(&p.id))
        .cloned()
        .collect()
}
