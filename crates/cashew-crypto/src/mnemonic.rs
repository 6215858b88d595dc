use bip39::Language;
use rand::RngCore;
use tracing::debug;

use cashew_core::constants::MNEMONIC_WORD_COUNT;
use cashew_core::error::WalletError;

use crate::seed::Seed;

pub use bip39::Mnemonic;

/// Entropy for a 12-word phrase (128 bits).
const ENTROPY_LEN: usize = 16;

/// Parse a user-entered phrase into a checked mnemonic.
///
/// Whitespace runs collapse to single spaces and case is folded before the
/// words are checked against the English wordlist and the checksum.
pub fn validate_mnemonic(phrase: &str) -> Result<Mnemonic, WalletError> {
    let normalized = phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");

    let words = normalized.split(' ').filter(|w| !w.is_empty()).count();
    if words != MNEMONIC_WORD_COUNT {
        return Err(WalletError::validation(format!(
            "Mnemonic should have {MNEMONIC_WORD_COUNT} words, got {words}."
        )));
    }

    Mnemonic::parse_in_normalized(Language::English, &normalized).map_err(|e| {
        debug!(error = %e, "mnemonic rejected");
        WalletError::validation("Invalid mnemonic phrase. Check the words and their order.")
    })
}

/// BIP-39 seed of `mnemonic` with an empty passphrase.
pub fn derive_seed(mnemonic: &Mnemonic) -> Seed {
    Seed::from_bytes(mnemonic.to_seed(""))
}

/// A fresh 12-word English mnemonic.
pub fn generate_mnemonic() -> Result<Mnemonic, WalletError> {
    let mut entropy = [0u8; ENTROPY_LEN];
    rand::thread_rng().fill_bytes(&mut entropy);
    Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| WalletError::KeyStorage(format!("mnemonic generation failed: {e}")))
}
