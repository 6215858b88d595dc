use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::WalletError;

/// Public keys of one keyset: denomination (decimal string) → hex pubkey.
pub type MintKeys = BTreeMap<String, String>;

// ── Mint ─────────────────────────────────────────────────────────────────────

/// A mint the wallet trusts, with its keysets and derivation counter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mint {
    pub mint_url: String,
    pub hostname: String,
    /// Known keyset ids, oldest first.
    pub keysets: Vec<String>,
    /// Keys per keyset id.
    pub keys: BTreeMap<String, MintKeys>,
    /// Next unused derivation index. Indices below it are consumed.
    pub proofs_counter: u32,
}

impl Mint {
    pub fn new(mint_url: impl Into<String>) -> Self {
        let mint_url = mint_url.into();
        let hostname = url::Url::parse(&mint_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| mint_url.clone());
        Self {
            mint_url,
            hostname,
            keysets: Vec::new(),
            keys: BTreeMap::new(),
            proofs_counter: 0,
        }
    }

    pub fn has_keyset(&self, keyset_id: &str) -> bool {
        self.keysets.iter().any(|k| k == keyset_id)
    }

    /// Store `keys` under `keyset_id`, registering the keyset if new.
    pub fn update_keys(&mut self, keyset_id: &str, keys: MintKeys) {
        if !self.has_keyset(keyset_id) {
            self.keysets.push(keyset_id.to_string());
        }
        self.keys.insert(keyset_id.to_string(), keys);
    }

    /// The most recently registered keyset.
    pub fn current_keyset(&self) -> Option<&str> {
        self.keysets.last().map(String::as_str)
    }

    pub fn increase_proofs_counter(&mut self, delta: u32) -> u32 {
        self.proofs_counter = self.proofs_counter.saturating_add(delta);
        self.proofs_counter
    }
}

// ── Key validation ───────────────────────────────────────────────────────────

/// A key set is valid iff it is non-empty and every denomination is a
/// power of two. Never fails; callers log and skip invalid sets.
pub fn validate_keys(keys: &MintKeys) -> bool {
    !keys.is_empty()
        && keys
            .keys()
            .all(|k| k.parse::<u64>().map(u64::is_power_of_two).unwrap_or(false))
}

/// Keyset id of `keys`: `"00"` followed by the first seven bytes of
/// SHA-256 over the compressed public keys ordered by denomination.
pub fn derive_keyset_id(keys: &MintKeys) -> Result<String, WalletError> {
    let mut ordered: Vec<(u64, &String)> = keys
        .iter()
        .map(|(amount, pubkey)| {
            amount
                .parse::<u64>()
                .map(|a| (a, pubkey))
                .map_err(|_| WalletError::InvalidMintKeys(format!("denomination {amount}")))
        })
        .collect::<Result<_, _>>()?;
    ordered.sort_by_key(|(amount, _)| *amount);

    let mut hasher = Sha256::new();
    for (amount, pubkey) in ordered {
        let bytes = hex::decode(pubkey)
            .map_err(|e| WalletError::InvalidMintKeys(format!("key for {amount}: {e}")))?;
        hasher.update(&bytes);
    }
    let digest = hasher.finalize();
    Ok(format!("00{}", hex::encode(&digest[..7])))
}
