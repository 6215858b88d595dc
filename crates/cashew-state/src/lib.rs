//! Wallet repositories: transaction ledger, proof store, mint registry and
//! key storage, with a sled-backed and an in-memory implementation.

pub mod db;
pub mod memory;
pub mod store;

pub use db::WalletDb;
pub use memory::MemoryWallet;
pub use store::{
    AddedProofs, Balances, KeyStorage, MintBalance, MintRegistry, ProofStore, TransactionLedger,
};
