use zeroize::Zeroize;

/// Length of a BIP-39 seed in bytes.
pub const SEED_LEN: usize = 64;

/// Wallet seed derived from the mnemonic.
///
/// Held in memory only while a recovery is running or until it is handed
/// to key storage. The bytes are wiped on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Seed {
    bytes: [u8; SEED_LEN],
}

impl Seed {
    pub fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Self { bytes }
    }

    /// Return a read-only view of the seed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for Seed {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_shows_bytes() {
        let seed = Seed::from_bytes([0xab; SEED_LEN]);
        let shown = format!("{seed:?}");
        assert_eq!(shown, "Seed(<redacted>)");
        assert!(!shown.contains("ab"));
    }
}
