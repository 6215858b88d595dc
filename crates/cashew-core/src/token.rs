use serde::Serialize;

use crate::error::WalletError;
use crate::proof::{sum_proof_amounts, Proof};
use crate::types::Amount;

// ── Token ────────────────────────────────────────────────────────────────────

/// Proofs from one mint inside a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenEntry {
    pub mint: String,
    pub proofs: Vec<Proof>,
}

/// A transportable bundle of proofs grouped by originating mint.
///
/// Every proof in an entry belongs to that entry's mint through its keyset;
/// the structure itself does not check this.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Token {
    pub token: Vec<TokenEntry>,
    pub memo: Option<String>,
    pub unit: Option<String>,
}

/// Amount carried for one mint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MintAmount {
    pub mint_url: String,
    pub amount: Amount,
}

/// Total of a token plus its per-mint breakdown in first-seen mint order.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize)]
pub struct TokenAmounts {
    pub total_amount: Amount,
    pub mint_amounts: Vec<MintAmount>,
}

impl Token {
    pub fn new(entries: Vec<TokenEntry>) -> Self {
        Self {
            token: entries,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token.iter().all(|e| e.proofs.is_empty())
    }
}

// ── Arithmetic ───────────────────────────────────────────────────────────────

pub fn token_entry_amount(entry: &TokenEntry) -> Amount {
    sum_proof_amounts(&entry.proofs)
}

/// Sum across all entries, grouped by mint URL.
pub fn sum_token_amount(token: &Token) -> TokenAmounts {
    let mut amounts = TokenAmounts::default();
    for entry in &token.token {
        let amount = token_entry_amount(entry);
        amounts.total_amount += amount;

        match amounts
            .mint_amounts
            .iter_mut()
            .find(|m| m.mint_url == entry.mint)
        {
            Some(existing) => existing.amount += amount,
            None => amounts.mint_amounts.push(MintAmount {
                mint_url: entry.mint.clone(),
                amount,
            }),
        }
    }
    amounts
}

/// Each mint URL of the token exactly once.
pub fn distinct_mints_of(token: &Token) -> Vec<String> {
    let mut mints: Vec<String> = Vec::with_capacity(token.token.len());
    for entry in &token.token {
        if !mints.contains(&entry.mint) {
            mints.push(entry.mint.clone());
        }
    }
    mints
}

/// Copy of `token` with the proofs of `mint_url`'s entry replaced.
///
/// `token` itself is left untouched.
pub fn replace_proofs_for_mint(
    token: &Token,
    mint_url: &str,
    new_proofs: Vec<Proof>,
) -> Result<Token, WalletError> {
    let index = token
        .token
        .iter()
        .position(|e| e.mint == mint_url)
        .ok_or_else(|| WalletError::MintNotInToken(mint_url.to_string()))?;

    let mut updated = token.clone();
    updated.token[index].proofs = new_proofs;
    Ok(updated)
}

/// All proofs of `entries` in entry order.
pub fn proofs_of_entries(entries: &[TokenEntry]) -> Vec<Proof> {
    entries
        .iter()
        .flat_map(|e| e.proofs.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mint: &str, amounts: &[Amount]) -> TokenEntry {
        TokenEntry {
            mint: mint.to_string(),
            proofs: amounts
                .iter()
                .enumerate()
                .map(|(i, a)| Proof::new("009a1f293253e41e", *a, format!("{mint}-{i}"), "02ab"))
                .collect(),
        }
    }

    const MINT_A: &str = "https://a.example";
    const MINT_B: &str = "https://b.example";

    #[test]
    fn amounts_group_by_mint_in_first_seen_order() {
        let token = Token::new(vec![
            entry(MINT_B, &[1, 2]),
            entry(MINT_A, &[8]),
            entry(MINT_B, &[4]),
        ]);
        let amounts = sum_token_amount(&token);
        assert_eq!(amounts.total_amount, 15);
        assert_eq!(
            amounts.mint_amounts,
            vec![
                MintAmount { mint_url: MINT_B.into(), amount: 7 },
                MintAmount { mint_url: MINT_A.into(), amount: 8 },
            ]
        );
    }

    #[test]
    fn empty_token_sums_to_zero() {
        let amounts = sum_token_amount(&Token::default());
        assert_eq!(amounts.total_amount, 0);
        assert!(amounts.mint_amounts.is_empty());
    }

    #[test]
    fn distinct_mints_appear_once() {
        let token = Token::new(vec![entry(MINT_A, &[1]), entry(MINT_B, &[2]), entry(MINT_A, &[4])]);
        assert_eq!(distinct_mints_of(&token), vec![MINT_A, MINT_B]);
    }

    #[test]
    fn replacing_proofs_deep_copies() {
        let token = Token::new(vec![entry(MINT_A, &[1, 2]), entry(MINT_B, &[4])]);
        let replacement = entry(MINT_A, &[16]).proofs;

        let updated = replace_proofs_for_mint(&token, MINT_A, replacement.clone()).unwrap();

        assert_eq!(updated.token[0].proofs, replacement);
        assert_eq!(updated.token[1], token.token[1]);
        // original untouched
        assert_eq!(token.token[0], entry(MINT_A, &[1, 2]));
    }

    #[test]
    fn replacing_unknown_mint_is_a_validation_error() {
        let token = Token::new(vec![entry(MINT_A, &[1])]);
        let err = replace_proofs_for_mint(&token, MINT_B, vec![]).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.context(), Some(MINT_B));
    }

    #[test]
    fn entries_flatten_in_order() {
        let entries = vec![entry(MINT_A, &[1, 2]), entry(MINT_B, &[4])];
        let flat = proofs_of_entries(&entries);
        assert_eq!(flat.iter().map(|p| p.amount).collect::<Vec<_>>(), vec![1, 2, 4]);
    }
}
