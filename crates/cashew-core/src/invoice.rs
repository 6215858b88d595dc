//! BOLT-11 Lightning invoice decoding.
//!
//! Only what the wallet reads is interpreted (amount, timestamp, payment
//! hash, description, expiry and a few routing fields). The signature is
//! kept as bytes and never verified here.

use bech32::primitives::decode::UncheckedHrpstring;
use bech32::{Bech32, Fe32};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace};

use crate::constants::{
    DEFAULT_INVOICE_EXPIRY_SECS, INVOICE_PREFIX, LIGHTNING_URI_PREFIX, MSAT_PER_SAT,
};
use crate::error::WalletError;
use crate::types::{Amount, Timestamp};

const TIMESTAMP_LEN: usize = 7;
const SIGNATURE_LEN: usize = 104;
const CHECKSUM_LEN: usize = 6;
const HASH_LEN: usize = 52;
const PUBKEY_LEN: usize = 53;

// Tagged field types (bech32 character value).
const TAG_PAYMENT_HASH: u8 = 1; // p
const TAG_ROUTE_HINT: u8 = 3; // r
const TAG_EXPIRY: u8 = 6; // x
const TAG_DESCRIPTION: u8 = 13; // d
const TAG_PAYMENT_SECRET: u8 = 16; // s
const TAG_PAYEE: u8 = 19; // n
const TAG_DESCRIPTION_HASH: u8 = 23; // h
const TAG_MIN_FINAL_CLTV: u8 = 24; // c

/// One decoded part of an invoice, in wire order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "name", content = "value", rename_all = "snake_case")]
pub enum InvoiceSection {
    /// Currency prefix after `ln`, e.g. `bc` or `tb`.
    CoinNetwork(String),
    /// Requested amount in millisatoshis.
    Amount(u64),
    Timestamp(Timestamp),
    PaymentHash(Vec<u8>),
    Description(String),
    DescriptionHash(Vec<u8>),
    Expiry(u64),
    PayeeKey(Vec<u8>),
    MinFinalCltvExpiry(u64),
    PaymentSecret(Vec<u8>),
    RouteHint(Vec<u8>),
    Unknown { tag: u8, length: usize },
    Signature(Vec<u8>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DecodedInvoice {
    pub payment_request: String,
    pub sections: Vec<InvoiceSection>,
    /// Expiry in seconds when the invoice carries one.
    pub expiry: Option<u64>,
}

/// The fields a wallet needs from an invoice.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize)]
pub struct InvoiceData {
    /// Amount in satoshis (millisatoshis divided down, remainder dropped).
    pub amount: Option<Amount>,
    pub description: Option<String>,
    /// Lowercase hex.
    pub payment_hash: Option<String>,
    pub timestamp: Timestamp,
    /// Seconds after `timestamp` the invoice stays payable.
    pub expiry: u64,
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Decode a BOLT-11 invoice. Fails with a validation error carrying the
/// raw invoice when it is malformed.
pub fn decode_invoice(encoded: &str) -> Result<DecodedInvoice, WalletError> {
    decode_inner(encoded).map_err(|reason| {
        debug!(%reason, "invoice decoding failed");
        WalletError::validation_with(format!("Provided invoice is invalid: {encoded}"), encoded)
    })
}

fn decode_inner(encoded: &str) -> Result<DecodedInvoice, String> {
    let lower = encoded.trim().to_lowercase();
    let unchecked = UncheckedHrpstring::new(&lower).map_err(|e| e.to_string())?;
    unchecked
        .validate_checksum::<Bech32>()
        .map_err(|e| e.to_string())?;

    let hrp = unchecked.hrp().to_lowercase();
    let ascii = unchecked.data_part_ascii();
    let fes = ascii[..ascii.len().saturating_sub(CHECKSUM_LEN)]
        .iter()
        .map(|&c| Fe32::from_char(c as char).map(Fe32::to_u8))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| e.to_string())?;

    if fes.len() < TIMESTAMP_LEN + SIGNATURE_LEN {
        return Err("invoice too short".into());
    }

    let mut sections = Vec::new();
    let (network, amount_msat) = parse_hrp(&hrp)?;
    sections.push(InvoiceSection::CoinNetwork(network));
    if let Some(msat) = amount_msat {
        sections.push(InvoiceSection::Amount(msat));
    }

    let timestamp = fe_to_int(&fes[..TIMESTAMP_LEN]);
    sections.push(InvoiceSection::Timestamp(
        i64::try_from(timestamp).map_err(|e| e.to_string())?,
    ));

    let tagged_end = fes.len() - SIGNATURE_LEN;
    let mut expiry = None;
    let mut pos = TIMESTAMP_LEN;
    while pos < tagged_end {
        if pos + 3 > tagged_end {
            return Err("truncated tagged field".into());
        }
        let tag = fes[pos];
        let len = fes[pos + 1] as usize * 32 + fes[pos + 2] as usize;
        let start = pos + 3;
        let end = start + len;
        if end > tagged_end {
            return Err(format!("tagged field {tag} overruns data"));
        }
        let data = &fes[start..end];
        pos = end;

        let section = match tag {
            TAG_PAYMENT_HASH if len == HASH_LEN => InvoiceSection::PaymentHash(fe_to_bytes(data)),
            TAG_DESCRIPTION => InvoiceSection::Description(
                String::from_utf8(fe_to_bytes(data)).map_err(|e| e.to_string())?,
            ),
            TAG_DESCRIPTION_HASH if len == HASH_LEN => {
                InvoiceSection::DescriptionHash(fe_to_bytes(data))
            }
            TAG_EXPIRY => {
                let secs = fe_to_int(data);
                expiry = Some(secs);
                InvoiceSection::Expiry(secs)
            }
            TAG_PAYEE if len == PUBKEY_LEN => InvoiceSection::PayeeKey(fe_to_bytes(data)),
            TAG_MIN_FINAL_CLTV => InvoiceSection::MinFinalCltvExpiry(fe_to_int(data)),
            TAG_PAYMENT_SECRET if len == HASH_LEN => {
                InvoiceSection::PaymentSecret(fe_to_bytes(data))
            }
            TAG_ROUTE_HINT => InvoiceSection::RouteHint(fe_to_bytes(data)),
            // Fields of the wrong length are skipped, as readers must.
            _ => InvoiceSection::Unknown { tag, length: len },
        };
        sections.push(section);
    }

    sections.push(InvoiceSection::Signature(fe_to_bytes(&fes[tagged_end..])));

    Ok(DecodedInvoice {
        payment_request: encoded.trim().to_string(),
        sections,
        expiry,
    })
}

/// Split `ln<network>[<amount><multiplier>]` into network and msat amount.
fn parse_hrp(hrp: &str) -> Result<(String, Option<u64>), String> {
    let rest = hrp.strip_prefix("ln").ok_or("missing ln prefix")?;
    let split = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
    let (network, amount) = rest.split_at(split);
    if network.is_empty() {
        return Err("missing network".into());
    }
    if amount.is_empty() {
        return Ok((network.to_string(), None));
    }

    let (digits, multiplier) = match amount.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&amount[..i], Some(c)),
        _ => (amount, None),
    };
    let value: u64 = digits.parse().map_err(|_| format!("invalid amount {amount}"))?;

    let msat = match multiplier {
        None => value.checked_mul(100_000_000_000),
        Some('m') => value.checked_mul(100_000_000),
        Some('u') => value.checked_mul(100_000),
        Some('n') => value.checked_mul(100),
        Some('p') if value % 10 == 0 => Some(value / 10),
        Some(other) => return Err(format!("invalid multiplier {other}")),
    }
    .ok_or("amount overflow")?;

    Ok((network.to_string(), Some(msat)))
}

/// Big-endian integer from 5-bit groups.
fn fe_to_int(fes: &[u8]) -> u64 {
    fes.iter().fold(0u64, |acc, fe| (acc << 5) | u64::from(*fe))
}

/// Regroup 5-bit values into bytes, dropping trailing padding bits.
fn fe_to_bytes(fes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(fes.len() * 5 / 8);
    let mut acc: u32 = 0;
    let mut bits = 0;
    for fe in fes {
        acc = (acc << 5) | u32::from(*fe);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
            acc &= (1 << bits) - 1;
        }
    }
    out
}

// ── Field extraction ─────────────────────────────────────────────────────────

/// Walk the decoded sections and pull out what the wallet shows.
///
/// A missing or zero timestamp becomes the current time; a missing expiry
/// becomes `DEFAULT_INVOICE_EXPIRY_SECS`.
pub fn invoice_data(decoded: &DecodedInvoice) -> InvoiceData {
    let mut data = InvoiceData::default();

    for section in &decoded.sections {
        match section {
            InvoiceSection::Amount(msat) => data.amount = Some(msat / MSAT_PER_SAT),
            InvoiceSection::Description(text) => data.description = Some(text.clone()),
            InvoiceSection::PaymentHash(hash) => data.payment_hash = Some(hex::encode(hash)),
            InvoiceSection::Timestamp(ts) => data.timestamp = *ts,
            _ => {}
        }
    }

    if data.timestamp == 0 {
        data.timestamp = Utc::now().timestamp();
    }
    data.expiry = decoded.expiry.unwrap_or(DEFAULT_INVOICE_EXPIRY_SECS);

    trace!(?data, "invoice data");
    data
}

/// Moment an invoice created at `timestamp` stops being payable.
pub fn invoice_expires_at(timestamp: Timestamp, expiry_secs: u64) -> DateTime<Utc> {
    let expiry = i64::try_from(expiry_secs).unwrap_or(i64::MAX);
    DateTime::from_timestamp(timestamp.saturating_add(expiry), 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// ── Extraction ───────────────────────────────────────────────────────────────

/// First whitespace-separated word that looks like a mainnet invoice.
pub fn find_encoded_invoice(content: &str) -> Option<&str> {
    content
        .split_whitespace()
        .find(|w| w.to_lowercase().contains(INVOICE_PREFIX))
}

/// Strip a `lightning:` scheme and make sure the rest decodes.
pub fn extract_encoded_invoice(input: &str) -> Result<String, WalletError> {
    let trimmed = input.trim();
    let invoice = trimmed.strip_prefix(LIGHTNING_URI_PREFIX).unwrap_or(trimmed);
    decode_invoice(invoice)?;
    Ok(invoice.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// BOLT-11 reference invoice: 2500u, "1 cup coffee", 60s expiry.
    const COFFEE: &str = "lnbc2500u1pvjluezpp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdq5xysxxatsyp3k7enxv4jsxqzpuaztrnwngzn3kdzw5hydlzf03qdgm2hdq27cqv3agm2awhz5se903vruatfhq77w3ls4evs3ch9zw97j25emudupq63nyw24cg27h2rspfj9srp";

    /// No amount, no description, no expiry.
    const BARE: &str = "lnbc1pj48ugqpp54w46h2at4w46h2at4w46h2at4w46h2at4w46h2at4w46h2at4w4sqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqaen7dk";

    /// 10 nanobitcoin = 1000 msat.
    const TINY: &str = "lnbc10n1pj48ugqdq8w35ku7gqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqfqpy05";

    #[test]
    fn decodes_reference_invoice() {
        let decoded = decode_invoice(COFFEE).unwrap();
        assert_eq!(decoded.expiry, Some(60));
        assert!(decoded.sections.contains(&InvoiceSection::CoinNetwork("bc".into())));

        let data = invoice_data(&decoded);
        assert_eq!(data.amount, Some(250_000));
        assert_eq!(data.description.as_deref(), Some("1 cup coffee"));
        assert_eq!(
            data.payment_hash.as_deref(),
            Some("0001020304050607080900010203040506070809000102030405060708090102")
        );
        assert_eq!(data.timestamp, 1_496_314_658);
        assert_eq!(data.expiry, 60);
    }

    #[test]
    fn missing_expiry_defaults() {
        let data = invoice_data(&decode_invoice(BARE).unwrap());
        assert_eq!(data.amount, None);
        assert_eq!(data.description, None);
        assert_eq!(data.payment_hash.as_deref(), Some(&"ab".repeat(32)[..]));
        assert_eq!(data.expiry, DEFAULT_INVOICE_EXPIRY_SECS);
        assert_eq!(data.timestamp, 1_700_000_000);
    }

    #[test]
    fn small_amounts_divide_down() {
        let data = invoice_data(&decode_invoice(TINY).unwrap());
        assert_eq!(data.amount, Some(1));
        assert_eq!(data.description.as_deref(), Some("tiny"));
    }

    #[test]
    fn uppercase_invoice_decodes() {
        assert!(decode_invoice(&COFFEE.to_uppercase()).is_ok());
    }

    #[test]
    fn hrp_amounts() {
        assert_eq!(parse_hrp("lnbc").unwrap(), ("bc".into(), None));
        assert_eq!(parse_hrp("lnbc1m").unwrap().1, Some(100_000_000));
        assert_eq!(parse_hrp("lntb20u").unwrap().1, Some(2_000_000));
        assert_eq!(parse_hrp("lnbcrt5").unwrap().1, Some(500_000_000_000));
        assert_eq!(parse_hrp("lnbc10p").unwrap().1, Some(1));
        assert!(parse_hrp("lnbc1p").is_err());
        assert!(parse_hrp("lnbc1x").is_err());
        assert!(parse_hrp("bc1").is_err());
    }

    #[test]
    fn corrupted_invoice_is_a_validation_error() {
        let mut broken = COFFEE.to_string();
        broken.replace_range(20..21, "x");
        for raw in [broken.as_str(), "lnbc", "not an invoice"] {
            let err = decode_invoice(raw).unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.context(), Some(raw));
        }
    }

    #[test]
    fn lightning_scheme_is_stripped() {
        let scanned = format!("lightning:{COFFEE}");
        assert_eq!(extract_encoded_invoice(&scanned).unwrap(), COFFEE);
        assert_eq!(extract_encoded_invoice(COFFEE).unwrap(), COFFEE);
        assert!(extract_encoded_invoice("lightning:lnbc1broken").is_err());
    }

    #[test]
    fn finds_invoice_in_text() {
        let text = format!("please pay {COFFEE} thanks");
        assert_eq!(find_encoded_invoice(&text), Some(COFFEE));
        assert_eq!(find_encoded_invoice("no invoice"), None);
    }

    #[test]
    fn expiry_adds_seconds() {
        let at = invoice_expires_at(1_496_314_658, 60);
        assert_eq!(at.timestamp(), 1_496_314_718);
    }
}
