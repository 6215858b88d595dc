use crate::seed::Seed;

/// Compute BLAKE3 hash of arbitrary bytes → 32-byte array.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Non-secret correlation id of a seed: lowercase hex BLAKE3 digest.
///
/// Stable for a given seed, so a restored wallet finds the wallet-name
/// profile it registered before, without the seed itself leaving storage.
pub fn seed_hash(seed: &Seed) -> String {
    hex::encode(blake3_hash(seed.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_hash_is_stable_hex() {
        let seed = Seed::from_bytes([7u8; 64]);
        let a = seed_hash(&seed);
        assert_eq!(a, seed_hash(&Seed::from_bytes([7u8; 64])));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, seed_hash(&Seed::from_bytes([8u8; 64])));
    }
}
