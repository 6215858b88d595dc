/// ─── Wallet Protocol Constants ──────────────────────────────────────────────
///
/// Amounts are denominated in satoshis unless a name says otherwise.

// ── Recovery ─────────────────────────────────────────────────────────────────

/// Width of one restore interval. Each recovery pass asks every mint for
/// signatures on `RESTORE_INDEX_INTERVAL` consecutive derivation indices.
pub const RESTORE_INDEX_INTERVAL: u32 = 50;

/// Maximum characters of an error description kept in transaction history.
pub const ERROR_DETAIL_MAX_CHARS: usize = 100;

/// Memo stamped on transactions holding recovered, spendable value.
pub const RECOVERY_MEMO: &str = "Wallet recovery";

/// Memo stamped on transactions holding recovered value the mint reports pending.
pub const PENDING_RECOVERY_MEMO: &str = "Wallet recovery - pending";

// ── Mnemonic ─────────────────────────────────────────────────────────────────

/// Words in a wallet mnemonic (128 bits of entropy).
pub const MNEMONIC_WORD_COUNT: usize = 12;

// ── Tokens ───────────────────────────────────────────────────────────────────

/// Prefix of a V3 (base64url JSON) encoded token.
pub const TOKEN_V3_PREFIX: &str = "cashuA";

/// Prefix of a V4 (base64url CBOR) encoded token.
pub const TOKEN_V4_PREFIX: &str = "cashuB";

/// Query parameter carrying an encoded token inside a URL.
pub const TOKEN_URL_PARAM: &str = "token";

// ── Lightning ────────────────────────────────────────────────────────────────

/// URI scheme that may prefix a scanned invoice.
pub const LIGHTNING_URI_PREFIX: &str = "lightning:";

/// Mainnet invoice human-readable prefix.
pub const INVOICE_PREFIX: &str = "lnbc";

/// Expiry assumed when an invoice does not carry an `x` field (seconds).
pub const DEFAULT_INVOICE_EXPIRY_SECS: u64 = 600;

/// Millisatoshis per satoshi.
pub const MSAT_PER_SAT: u64 = 1_000;
