use serde::{Deserialize, Serialize};

use cashew_core::constants::{
    ERROR_DETAIL_MAX_CHARS, PENDING_RECOVERY_MEMO, RECOVERY_MEMO, RESTORE_INDEX_INTERVAL,
};

/// Configuration for wallet recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Derivation indices asked from each mint per pass.
    pub interval_step: u32,
    /// Characters of an error message kept in transaction history.
    pub error_detail_limit: usize,
    /// Domain of wallet names issued by the wallet-name service
    /// (e.g. "@minibits.cash"). Profiles under it can be re-bound to the
    /// restored wallet's keys.
    pub own_nip05_domain: String,
    /// Memo on transactions holding recovered spendable value.
    pub recovery_memo: String,
    /// Memo on transactions holding recovered value the mint reports pending.
    pub pending_recovery_memo: String,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            interval_step: RESTORE_INDEX_INTERVAL,
            error_detail_limit: ERROR_DETAIL_MAX_CHARS,
            own_nip05_domain: "@minibits.cash".into(),
            recovery_memo: RECOVERY_MEMO.into(),
            pending_recovery_memo: PENDING_RECOVERY_MEMO.into(),
        }
    }
}
