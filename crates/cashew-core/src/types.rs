use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WalletError;

/// Amount in satoshis. Proof amounts are single power-of-two denominations.
pub type Amount = u64;

/// Local ledger identifier of a transaction record.
pub type TransactionId = u64;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

// ── RestoreInterval ──────────────────────────────────────────────────────────

/// Half-open range `[start, end)` of derivation indices asked from a mint
/// in one recovery pass.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestoreInterval {
    start: u32,
    end: u32,
}

impl RestoreInterval {
    pub fn new(start: u32, end: u32) -> Result<Self, WalletError> {
        if end <= start {
            return Err(WalletError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// The first interval of a fresh recovery: `[0, step)`.
    pub fn first(step: u32) -> Result<Self, WalletError> {
        Self::new(0, step)
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of indices covered, which is also how far a mint's
    /// derivation counter moves after the interval has been restored.
    pub fn width(&self) -> u32 {
        self.end - self.start
    }

    /// The interval `step` indices further on. Both bounds move so
    /// consecutive intervals of equal width never overlap.
    pub fn advance(&self, step: u32) -> Self {
        Self {
            start: self.start.saturating_add(step),
            end: self.end.saturating_add(step),
        }
    }
}

impl fmt::Display for RestoreInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl fmt::Debug for RestoreInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RestoreInterval{}", self)
    }
}
