use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum WalletError {
    // ── Validation errors ────────────────────────────────────────────────────
    /// Malformed user or wire input. `context` carries the offending raw
    /// value (encoded token, invoice, mint URL) when there is one.
    #[error("{message}")]
    Validation {
        message: String,
        context: Option<String>,
    },

    #[error("mint {0} not found in token")]
    MintNotInToken(String),

    #[error("invalid restore interval [{start}, {end})")]
    InvalidInterval { start: u32, end: u32 },

    // ── Mint errors ──────────────────────────────────────────────────────────
    #[error("mint {mint_url}: {message}")]
    Mint { mint_url: String, message: String },

    #[error("unknown mint: {0}")]
    UnknownMint(String),

    #[error("invalid mint keys: {0}")]
    InvalidMintKeys(String),

    // ── Ledger errors ────────────────────────────────────────────────────────
    #[error("transaction not found: {0}")]
    TransactionNotFound(u64),

    // ── Secrets ──────────────────────────────────────────────────────────────
    #[error("key storage error: {0}")]
    KeyStorage(String),

    #[error("a mnemonic already exists in key storage")]
    MnemonicExists,

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    // ── Recovery session ─────────────────────────────────────────────────────
    #[error("recovery session is {actual}, expected {expected}")]
    InvalidPhase { expected: String, actual: String },

    #[error("{0}")]
    Other(String),
}

impl WalletError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            context: None,
        }
    }

    pub fn validation_with(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    pub fn mint(mint_url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Mint {
            mint_url: mint_url.into(),
            message: message.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::MintNotInToken(_) | Self::InvalidInterval { .. }
        )
    }

    /// Raw input attached to a validation error, if any.
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Validation { context, .. } => context.as_deref(),
            Self::MintNotInToken(url) | Self::UnknownMint(url) => Some(url),
            Self::Mint { mint_url, .. } => Some(mint_url),
            _ => None,
        }
    }

    /// Short machine-readable kind, stored in transaction history.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::MintNotInToken(_) | Self::InvalidInterval { .. } => {
                "VALIDATION_ERROR"
            }
            Self::Mint { .. } | Self::UnknownMint(_) | Self::InvalidMintKeys(_) => "MINT_ERROR",
            Self::TransactionNotFound(_) => "NOT_FOUND",
            Self::KeyStorage(_) | Self::MnemonicExists => "KEYCHAIN_ERROR",
            Self::Serialization(_) | Self::Storage(_) => "STORAGE_ERROR",
            Self::InvalidPhase { .. } => "STATE_ERROR",
            Self::Other(_) => "UNKNOWN_ERROR",
        }
    }
}
