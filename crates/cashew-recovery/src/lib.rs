//! cashew-recovery
//!
//! Wallet recovery from a mnemonic: interval-based restore across mints,
//! booking of recovered proofs as ledger transactions, the recovery session
//! state machine and payment polling with explicit results.

pub mod client;
pub mod config;
pub mod orchestrator;
pub mod poller;
pub mod session;

pub use client::{MintClient, ProofStates, RestoreResponse, WalletProfile, WalletProfileDirectory};
pub use config::RecoveryConfig;
pub use orchestrator::{
    MintRecoveryError, RecoveryClassification, RecoveryOrchestrator, RecoveryOutcome,
};
pub use poller::{poll_until_paid, PollOutcome};
pub use session::{CompletionResult, RecoveryPhase, RecoverySession};
