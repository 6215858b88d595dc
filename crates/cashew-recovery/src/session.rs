use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use cashew_core::error::WalletError;
use cashew_core::types::RestoreInterval;
use cashew_crypto::{derive_seed, validate_mnemonic, Mnemonic, Seed};
use cashew_state::KeyStorage;

use crate::client::{WalletProfile, WalletProfileDirectory};
use crate::orchestrator::{RecoveryOrchestrator, RecoveryOutcome};

// ── Phase ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryPhase {
    Idle,
    Validating,
    Recovering,
    AwaitingCompletion,
    Done,
}

impl fmt::Display for RecoveryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Recovering => "recovering",
            Self::AwaitingCompletion => "awaiting completion",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// What happened to the wallet address when recovery was completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionResult {
    /// A profile under the wallet's own domain now points at the new keys.
    ProfileRecovered(WalletProfile),
    /// The seed had a profile with an address managed elsewhere; the user
    /// has to import it again with their own keys.
    ExternalProfile(WalletProfile),
    NoProfile,
}

// ── Session ──────────────────────────────────────────────────────────────────

/// One wallet recovery from a mnemonic, from validation to completion.
///
/// Passes can be repeated; each one restores the next interval. The seed is
/// only written to key storage by [`RecoverySession::complete`].
pub struct RecoverySession {
    orchestrator: RecoveryOrchestrator,
    keys: Arc<dyn KeyStorage>,
    profiles: Arc<dyn WalletProfileDirectory>,
    phase: RecoveryPhase,
    interval: RestoreInterval,
    mnemonic: Option<Mnemonic>,
    seed: Option<Seed>,
    last_outcome: Option<RecoveryOutcome>,
    errors: Vec<WalletError>,
}

impl RecoverySession {
    pub fn new(
        orchestrator: RecoveryOrchestrator,
        keys: Arc<dyn KeyStorage>,
        profiles: Arc<dyn WalletProfileDirectory>,
    ) -> Result<Self, WalletError> {
        let interval = RestoreInterval::first(orchestrator.config().interval_step)?;
        Ok(Self {
            orchestrator,
            keys,
            profiles,
            phase: RecoveryPhase::Idle,
            interval,
            mnemonic: None,
            seed: None,
            last_outcome: None,
            errors: Vec::new(),
        })
    }

    pub fn phase(&self) -> RecoveryPhase {
        self.phase
    }

    /// Interval the next pass will restore.
    pub fn interval(&self) -> RestoreInterval {
        self.interval
    }

    pub fn last_outcome(&self) -> Option<&RecoveryOutcome> {
        self.last_outcome.as_ref()
    }

    /// Session-level failures (refusal, validation, completion), oldest
    /// first. Per-mint failures live in the pass outcome.
    pub fn errors(&self) -> &[WalletError] {
        &self.errors
    }

    /// Refuse to recover into a wallet that already has a mnemonic.
    pub async fn start(&mut self) -> Result<(), WalletError> {
        self.expect_phase(RecoveryPhase::Idle)?;
        self.ensure_no_mnemonic().await
    }

    /// Validate `phrase` and derive the seed, held in memory only.
    pub async fn confirm_mnemonic(&mut self, phrase: &str) -> Result<(), WalletError> {
        self.expect_phase(RecoveryPhase::Idle)?;
        self.ensure_no_mnemonic().await?;
        self.phase = RecoveryPhase::Validating;

        let mnemonic = match validate_mnemonic(phrase) {
            Ok(m) => m,
            Err(err) => {
                self.phase = RecoveryPhase::Idle;
                return Err(self.record(err));
            }
        };

        // PBKDF2 with 2048 rounds; keep it off the async workers.
        let derived = mnemonic.clone();
        let seed = match tokio::task::spawn_blocking(move || derive_seed(&derived)).await {
            Ok(seed) => seed,
            Err(join_err) => {
                self.phase = RecoveryPhase::Idle;
                return Err(self.record(WalletError::Other(join_err.to_string())));
            }
        };

        self.mnemonic = Some(mnemonic);
        self.seed = Some(seed);
        self.phase = RecoveryPhase::AwaitingCompletion;
        info!("seed derived, ready to recover");
        Ok(())
    }

    /// Restore the current interval from every known mint, then move the
    /// interval forward by the configured step.
    pub async fn run_pass(&mut self) -> Result<&RecoveryOutcome, WalletError> {
        self.expect_phase(RecoveryPhase::AwaitingCompletion)?;
        let seed = self
            .seed
            .as_ref()
            .ok_or_else(|| WalletError::validation("Missing seed."))?;

        self.phase = RecoveryPhase::Recovering;
        let mints = match self.orchestrator.mint_registry().all_mints().await {
            Ok(mints) => mints,
            Err(err) => {
                self.phase = RecoveryPhase::AwaitingCompletion;
                return Err(err);
            }
        };

        let outcome = self
            .orchestrator
            .recover_interval(&mints, seed, self.interval)
            .await;

        self.interval = self.interval.advance(self.orchestrator.config().interval_step);
        self.phase = RecoveryPhase::AwaitingCompletion;
        Ok(self.last_outcome.insert(outcome))
    }

    /// Save mnemonic and seed, then restore the wallet address registered
    /// under the seed hash, if any.
    pub async fn complete(&mut self, wallet_pubkey: &str) -> Result<CompletionResult, WalletError> {
        self.expect_phase(RecoveryPhase::AwaitingCompletion)?;
        let (Some(mnemonic), Some(seed)) = (self.mnemonic.clone(), self.seed.clone()) else {
            return Err(self.record(WalletError::validation("Missing mnemonic or seed.")));
        };
        // Key storage may have been written since the phrase was confirmed.
        // Our own phrase is left there by an earlier failed completion.
        let phrase = mnemonic.to_string();
        if self.stored_mnemonic().await?.is_some_and(|stored| stored != phrase) {
            return Err(self.refuse());
        }

        let result = match self.save_and_restore_profile(&mnemonic, &seed, wallet_pubkey).await {
            Ok(result) => result,
            Err(err) => return Err(self.record(err)),
        };

        self.mnemonic = None;
        self.seed = None;
        self.phase = RecoveryPhase::Done;
        Ok(result)
    }

    async fn save_and_restore_profile(
        &self,
        mnemonic: &Mnemonic,
        seed: &Seed,
        wallet_pubkey: &str,
    ) -> Result<CompletionResult, WalletError> {
        self.keys.save_mnemonic(&mnemonic.to_string()).await?;
        self.keys.save_seed(seed).await?;
        let seed_hash = self
            .keys
            .load_seed_hash()
            .await?
            .ok_or_else(|| WalletError::KeyStorage("seed hash missing after save".into()))?;

        let result = match self.profiles.find_by_seed_hash(&seed_hash).await? {
            Some(profile) if profile.nip05.contains(&self.orchestrator.config().own_nip05_domain) => {
                let recovered = self.profiles.recover(&seed_hash, wallet_pubkey).await?;
                info!(nip05 = %recovered.nip05, "wallet address recovered");
                CompletionResult::ProfileRecovered(recovered)
            }
            Some(profile) => {
                info!(nip05 = %profile.nip05, "wallet address uses external keys");
                CompletionResult::ExternalProfile(profile)
            }
            None => CompletionResult::NoProfile,
        };
        Ok(result)
    }

    async fn ensure_no_mnemonic(&mut self) -> Result<(), WalletError> {
        if self.stored_mnemonic().await?.is_some() {
            return Err(self.refuse());
        }
        Ok(())
    }

    async fn stored_mnemonic(&mut self) -> Result<Option<String>, WalletError> {
        match self.keys.load_mnemonic().await {
            Ok(stored) => Ok(stored),
            Err(err) => Err(self.record(err)),
        }
    }

    fn refuse(&mut self) -> WalletError {
        warn!("recovery refused: wallet already has a mnemonic");
        self.record(WalletError::MnemonicExists)
    }

    fn expect_phase(&self, expected: RecoveryPhase) -> Result<(), WalletError> {
        if self.phase != expected {
            return Err(WalletError::InvalidPhase {
                expected: expected.to_string(),
                actual: self.phase.to_string(),
            });
        }
        Ok(())
    }

    /// Keep a copy of a session-level failure and hand it back.
    fn record(&mut self, err: WalletError) -> WalletError {
        self.errors.push(err.clone());
        err
    }
}
