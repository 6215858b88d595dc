pub mod hash;
pub mod mnemonic;
pub mod seed;

pub use hash::{blake3_hash, seed_hash};
pub use mnemonic::{derive_seed, generate_mnemonic, validate_mnemonic, Mnemonic};
pub use seed::Seed;
