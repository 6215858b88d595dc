use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use cashew_core::error::WalletError;
use cashew_core::mint::{derive_keyset_id, validate_keys, Mint, MintKeys};
use cashew_core::proof::{exclude_proofs, sum_proof_amounts, Proof};
use cashew_core::transaction::{
    ErrorDetail, NewTransaction, TransactionData, TransactionStatus,
};
use cashew_core::types::{Amount, RestoreInterval, TransactionId};
use cashew_crypto::Seed;
use cashew_state::{MintRegistry, ProofStore, TransactionLedger};

use crate::client::MintClient;
use crate::config::RecoveryConfig;

// ── Outcome ──────────────────────────────────────────────────────────────────

/// A failure while recovering from one mint.
#[derive(Clone, Debug)]
pub struct MintRecoveryError {
    pub mint_url: String,
    pub error: WalletError,
}

impl fmt::Display for MintRecoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.mint_url, self.error)
    }
}

/// Totals of one recovery pass over all mints.
#[derive(Clone, Debug, Default)]
pub struct RecoveryOutcome {
    /// Newly owned, spendable value.
    pub recovered_amount: Amount,
    /// Value found but already spent. Informational.
    pub already_spent_amount: Amount,
    /// Value found that the mint reports as pending.
    pub pending_amount: Amount,
    pub errors: Vec<MintRecoveryError>,
}

/// How a caller should present a recovery pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryClassification {
    Recovered(Amount),
    /// Nothing recovered and at least one mint failed.
    Failed,
    /// Only already-spent value was found; try the next interval.
    SpentOnly(Amount),
    NothingFound,
}

impl RecoveryOutcome {
    /// Errors never hide recovered value: a pass that recovered anything is
    /// `Recovered` even if other mints failed.
    pub fn classify(&self) -> RecoveryClassification {
        if self.recovered_amount > 0 {
            RecoveryClassification::Recovered(self.recovered_amount)
        } else if !self.errors.is_empty() {
            RecoveryClassification::Failed
        } else if self.already_spent_amount > 0 {
            RecoveryClassification::SpentOnly(self.already_spent_amount)
        } else {
            RecoveryClassification::NothingFound
        }
    }
}

impl fmt::Display for RecoveryClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recovered(amount) => {
                write!(f, "{amount} sats were recovered into your wallet.")
            }
            Self::Failed => f.write_str("Recovery ended up with errors."),
            Self::SpentOnly(_) => f.write_str(
                "Already spent ecash has been found. Continue with the next recovery interval.",
            ),
            Self::NothingFound => f.write_str("Nothing has been found in this recovery interval."),
        }
    }
}

// ── Orchestrator ─────────────────────────────────────────────────────────────

/// Ledger records opened for the mint being processed and not yet settled.
#[derive(Default)]
struct OpenTransactions {
    receive: Option<TransactionId>,
    pending: Option<TransactionId>,
}

/// Drives interval-based restore across mints and books what it finds.
///
/// Mints are processed one at a time in list order. Callers must not run
/// two passes concurrently; counters are not locked.
pub struct RecoveryOrchestrator {
    client: Arc<dyn MintClient>,
    ledger: Arc<dyn TransactionLedger>,
    proofs: Arc<dyn ProofStore>,
    mints: Arc<dyn MintRegistry>,
    config: RecoveryConfig,
}

impl RecoveryOrchestrator {
    pub fn new(
        client: Arc<dyn MintClient>,
        ledger: Arc<dyn TransactionLedger>,
        proofs: Arc<dyn ProofStore>,
        mints: Arc<dyn MintRegistry>,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            client,
            ledger,
            proofs,
            mints,
            config,
        }
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    pub fn mint_registry(&self) -> &Arc<dyn MintRegistry> {
        &self.mints
    }

    /// Restore `interval` from every mint in `mints`.
    ///
    /// Never fails as a whole: a mint that errors is recorded in the
    /// outcome and the next mint is processed.
    pub async fn recover_interval(
        &self,
        mints: &[Mint],
        seed: &Seed,
        interval: RestoreInterval,
    ) -> RecoveryOutcome {
        let mut outcome = RecoveryOutcome::default();

        for mint in mints {
            let mut open = OpenTransactions::default();
            info!(mint_url = %mint.mint_url, %interval, "restoring from mint");

            if let Err(err) = self
                .recover_mint(mint, seed, interval, &mut outcome, &mut open)
                .await
            {
                error!(mint_url = %mint.mint_url, error = %err, "mint recovery failed");
                self.fail_open_transactions(&open, &err, &mint.mint_url).await;
                outcome.errors.push(MintRecoveryError {
                    mint_url: mint.mint_url.clone(),
                    error: err,
                });
            }
        }

        info!(
            recovered = outcome.recovered_amount,
            spent = outcome.already_spent_amount,
            pending = outcome.pending_amount,
            errors = outcome.errors.len(),
            "recovery pass finished"
        );
        outcome
    }

    async fn recover_mint(
        &self,
        mint: &Mint,
        seed: &Seed,
        interval: RestoreInterval,
        outcome: &mut RecoveryOutcome,
        open: &mut OpenTransactions,
    ) -> Result<(), WalletError> {
        let url = mint.mint_url.as_str();
        let restored = self.client.restore(url, interval, seed).await?;
        debug!(mint_url = url, proofs = restored.proofs.len(), "restored proofs");

        // Consume the whole interval even when nothing came back; indices
        // below the counter are never derived again.
        let counter = self
            .mints
            .increase_proofs_counter(url, interval.width())
            .await?;
        debug!(mint_url = url, counter, "proofs counter advanced");

        if let Some(keys) = restored.new_keys {
            self.apply_new_keys(mint, keys).await?;
        }

        if restored.proofs.is_empty() {
            return Ok(());
        }

        let states = self.client.spent_or_pending(url, &restored.proofs).await?;
        debug!(
            mint_url = url,
            spent = states.spent.len(),
            pending = states.pending.len(),
            "proof states"
        );
        outcome.already_spent_amount += sum_proof_amounts(&states.spent);

        // Pending proofs are booked on their own record, never as spendable.
        let unspent = exclude_proofs(&restored.proofs, &states.spent);
        let spendable = exclude_proofs(&unspent, &states.pending);
        let pending = exclude_proofs(&unspent, &spendable);

        if !spendable.is_empty() {
            self.book_spendable(url, spendable, outcome, open).await?;
        }

        if !pending.is_empty() {
            self.book_pending(url, pending, outcome, open).await?;
        }

        Ok(())
    }

    /// Persist keys the mint returned during restore. Invalid sets are
    /// logged and dropped.
    async fn apply_new_keys(&self, mint: &Mint, keys: MintKeys) -> Result<(), WalletError> {
        if !validate_keys(&keys) {
            warn!(mint_url = %mint.mint_url, "mint returned invalid keys, skipping update");
            return Ok(());
        }

        let keyset_id = match mint.current_keyset() {
            Some(id) => id.to_string(),
            None => match derive_keyset_id(&keys) {
                Ok(id) => id,
                Err(err) => {
                    warn!(mint_url = %mint.mint_url, error = %err, "cannot derive keyset id, skipping update");
                    return Ok(());
                }
            },
        };

        self.mints
            .update_keys(&mint.mint_url, &keyset_id, keys)
            .await?;
        info!(mint_url = %mint.mint_url, keyset_id, "mint keys updated");
        Ok(())
    }

    async fn book_spendable(
        &self,
        mint_url: &str,
        proofs: Vec<Proof>,
        outcome: &mut RecoveryOutcome,
        open: &mut OpenTransactions,
    ) -> Result<(), WalletError> {
        let amount = sum_proof_amounts(&proofs);
        let tx = self
            .ledger
            .add_transaction(NewTransaction::prepared_receive(
                amount,
                mint_url,
                &self.config.recovery_memo,
            ))
            .await?;
        open.receive = Some(tx.id);

        let added = self
            .proofs
            .add_proofs(attach(proofs, mint_url, tx.id), false)
            .await?;
        if added.added_amount != amount {
            warn!(
                tx_id = tx.id,
                expected = amount,
                added = added.added_amount,
                "store accepted a different amount"
            );
            self.ledger
                .update_received_amount(tx.id, added.added_amount)
                .await?;
        }

        self.ledger
            .update_status(
                tx.id,
                TransactionStatus::Completed,
                TransactionData::new(TransactionStatus::Completed).with_amount(added.added_amount),
            )
            .await?;
        open.receive = None;
        outcome.recovered_amount += added.added_amount;
        info!(tx_id = tx.id, mint_url, amount = added.added_amount, "recovered proofs booked");

        // The proofs are stored and the record is final; a missing balance
        // stamp does not undo the recovery.
        if let Err(err) = self.stamp_balance(tx.id).await {
            warn!(tx_id = tx.id, error = %err, "could not record balance after recovery");
        }
        Ok(())
    }

    async fn stamp_balance(&self, tx_id: TransactionId) -> Result<(), WalletError> {
        let balances = self.proofs.balances().await?;
        self.ledger
            .update_balance_after(tx_id, balances.total_balance)
            .await?;
        Ok(())
    }

    async fn book_pending(
        &self,
        mint_url: &str,
        proofs: Vec<Proof>,
        outcome: &mut RecoveryOutcome,
        open: &mut OpenTransactions,
    ) -> Result<(), WalletError> {
        let amount = sum_proof_amounts(&proofs);
        let tx = self
            .ledger
            .add_transaction(NewTransaction::prepared_receive(
                amount,
                mint_url,
                &self.config.pending_recovery_memo,
            ))
            .await?;
        open.pending = Some(tx.id);

        let added = self
            .proofs
            .add_proofs(attach(proofs, mint_url, tx.id), true)
            .await?;
        if added.added_amount != amount {
            self.ledger
                .update_received_amount(tx.id, added.added_amount)
                .await?;
        }

        // Left in `Pending` until the mint settles the proofs.
        self.ledger
            .update_status(
                tx.id,
                TransactionStatus::Pending,
                TransactionData::new(TransactionStatus::Pending).with_amount(added.added_amount),
            )
            .await?;
        open.pending = None;
        outcome.pending_amount += added.added_amount;

        info!(tx_id = tx.id, mint_url, amount = added.added_amount, "pending proofs booked");
        Ok(())
    }

    /// Move records left open by a failed mint to `Error`.
    async fn fail_open_transactions(
        &self,
        open: &OpenTransactions,
        err: &WalletError,
        mint_url: &str,
    ) {
        for id in [open.receive, open.pending].into_iter().flatten() {
            let detail = ErrorDetail::from_error(err, Some(mint_url), self.config.error_detail_limit);
            let entry = TransactionData::new(TransactionStatus::Error).with_error(detail);
            if let Err(update_err) = self
                .ledger
                .update_status(id, TransactionStatus::Error, entry)
                .await
            {
                error!(tx_id = id, error = %update_err, "could not mark transaction as failed");
            }
        }
    }
}

/// Stamp proofs with the mint and transaction that brought them in.
fn attach(proofs: Vec<Proof>, mint_url: &str, tx_id: TransactionId) -> Vec<Proof> {
    proofs
        .into_iter()
        .map(|mut p| {
            p.mint_url = Some(mint_url.to_string());
            p.tx_id = Some(tx_id);
            p
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(recovered: Amount, spent: Amount, errors: usize) -> RecoveryOutcome {
        RecoveryOutcome {
            recovered_amount: recovered,
            already_spent_amount: spent,
            pending_amount: 0,
            errors: (0..errors)
                .map(|i| MintRecoveryError {
                    mint_url: format!("https://mint{i}"),
                    error: WalletError::mint(format!("https://mint{i}"), "offline"),
                })
                .collect(),
        }
    }

    #[test]
    fn recovered_wins_over_errors() {
        assert_eq!(outcome(13, 4, 1).classify(), RecoveryClassification::Recovered(13));
    }

    #[test]
    fn errors_win_over_spent() {
        assert_eq!(outcome(0, 4, 1).classify(), RecoveryClassification::Failed);
    }

    #[test]
    fn spent_only_and_nothing() {
        assert_eq!(outcome(0, 4, 0).classify(), RecoveryClassification::SpentOnly(4));
        assert_eq!(outcome(0, 0, 0).classify(), RecoveryClassification::NothingFound);
    }

    #[test]
    fn attach_stamps_mint_and_tx() {
        let proofs = vec![Proof::new("00aa", 2, "s", "02")];
        let stamped = attach(proofs, "https://m", 9);
        assert_eq!(stamped[0].mint_url.as_deref(), Some("https://m"));
        assert_eq!(stamped[0].tx_id, Some(9));
    }

    #[test]
    fn classification_messages() {
        assert_eq!(
            RecoveryClassification::Recovered(21).to_string(),
            "21 sats were recovered into your wallet."
        );
    }
}
