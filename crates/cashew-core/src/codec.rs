//! Encoded token transport: `cashuA` (V3, base64url JSON) and `cashuB`
//! (V4, base64url CBOR) strings, optionally carried in a URL `token`
//! query parameter.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use ciborium::value::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{TOKEN_URL_PARAM, TOKEN_V3_PREFIX, TOKEN_V4_PREFIX};
use crate::error::WalletError;
use crate::proof::Proof;
use crate::token::{Token, TokenEntry};

const INVALID_TOKEN: &str = "Provided ecash token is invalid.";

/// URI schemes tolerated in front of an encoded token.
const TOKEN_URI_PREFIXES: [&str; 3] = ["web+cashu://", "cashu://", "cashu:"];

/// URL-safe alphabet, padding optional on decode.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// ── V3 wire format ───────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct TokenV3 {
    token: Vec<TokenV3Entry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct TokenV3Entry {
    mint: String,
    proofs: Vec<WireProof>,
}

#[derive(Serialize, Deserialize)]
struct WireProof {
    id: String,
    amount: u64,
    secret: String,
    #[serde(rename = "C")]
    c: String,
}

impl From<WireProof> for Proof {
    fn from(w: WireProof) -> Self {
        Proof::new(w.id, w.amount, w.secret, w.c)
    }
}

impl From<&Proof> for WireProof {
    fn from(p: &Proof) -> Self {
        Self {
            id: p.id.clone(),
            amount: p.amount,
            secret: p.secret.clone(),
            c: p.c.clone(),
        }
    }
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Decode an encoded token. Fails with a validation error carrying
/// `encoded` when the payload is malformed; no partial token is returned.
pub fn decode_token(encoded: &str) -> Result<Token, WalletError> {
    decode_token_inner(encoded).map_err(|reason| {
        debug!(%reason, "token decoding failed");
        WalletError::validation_with(INVALID_TOKEN, encoded)
    })
}

fn decode_token_inner(encoded: &str) -> Result<Token, String> {
    let mut body = encoded.trim();
    for prefix in TOKEN_URI_PREFIXES {
        if let Some(rest) = body.strip_prefix(prefix) {
            body = rest;
            break;
        }
    }

    let token = if let Some(payload) = body.strip_prefix(TOKEN_V3_PREFIX) {
        decode_v3(&base64_decode(payload)?)?
    } else if let Some(payload) = body.strip_prefix(TOKEN_V4_PREFIX) {
        decode_v4(&base64_decode(payload)?)?
    } else {
        return Err("unknown token prefix".into());
    };

    if token.token.is_empty() {
        return Err("token has no entries".into());
    }
    Ok(token)
}

/// Accepts both alphabets; standard base64 is folded onto the URL-safe one.
fn base64_decode(payload: &str) -> Result<Vec<u8>, String> {
    let normalized: String = payload
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    URL_SAFE_LENIENT
        .decode(normalized.as_bytes())
        .map_err(|e| e.to_string())
}

fn decode_v3(bytes: &[u8]) -> Result<Token, String> {
    let wire: TokenV3 = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    Ok(Token {
        token: wire
            .token
            .into_iter()
            .map(|e| TokenEntry {
                mint: e.mint,
                proofs: e.proofs.into_iter().map(Proof::from).collect(),
            })
            .collect(),
        memo: wire.memo,
        unit: wire.unit,
    })
}

fn field<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_text() == Some(key))
        .map(|(_, v)| v)
}

fn text_field(map: &[(Value, Value)], key: &str) -> Option<String> {
    field(map, key).and_then(Value::as_text).map(str::to_string)
}

/// V4 carries a single mint `m`, keyset groups `t[].i` (bytes) and
/// proofs `t[].p[]` with amount `a`, secret `s` and signature `c` (bytes).
fn decode_v4(bytes: &[u8]) -> Result<Token, String> {
    let value: Value = ciborium::de::from_reader(bytes).map_err(|e| e.to_string())?;
    let root = value.as_map().ok_or("token is not a map")?;

    let mint = text_field(root, "m").ok_or("missing mint")?;
    let groups = field(root, "t")
        .and_then(Value::as_array)
        .ok_or("missing keyset groups")?;

    let mut proofs = Vec::new();
    for group in groups {
        let group = group.as_map().ok_or("keyset group is not a map")?;
        let keyset_id = field(group, "i")
            .and_then(Value::as_bytes)
            .map(hex::encode)
            .ok_or("missing keyset id")?;
        let entries = field(group, "p")
            .and_then(Value::as_array)
            .ok_or("missing proofs")?;

        for entry in entries {
            let entry = entry.as_map().ok_or("proof is not a map")?;
            let amount = field(entry, "a")
                .and_then(Value::as_integer)
                .and_then(|i| u64::try_from(i).ok())
                .ok_or("invalid amount")?;
            let secret = text_field(entry, "s").ok_or("missing secret")?;
            let c = field(entry, "c")
                .and_then(Value::as_bytes)
                .map(hex::encode)
                .ok_or("missing signature")?;
            proofs.push(Proof::new(keyset_id.clone(), amount, secret, c));
        }
    }

    Ok(Token {
        token: vec![TokenEntry { mint, proofs }],
        memo: text_field(root, "d"),
        unit: text_field(root, "u"),
    })
}

// ── Encoding ─────────────────────────────────────────────────────────────────

/// Encode `token` as a V3 `cashuA` string.
pub fn encode_token(token: &Token) -> Result<String, WalletError> {
    let wire = TokenV3 {
        token: token
            .token
            .iter()
            .map(|e| TokenV3Entry {
                mint: e.mint.clone(),
                proofs: e.proofs.iter().map(WireProof::from).collect(),
            })
            .collect(),
        memo: token.memo.clone(),
        unit: token.unit.clone(),
    };
    let json = serde_json::to_vec(&wire).map_err(|e| WalletError::Serialization(e.to_string()))?;
    Ok(format!("{}{}", TOKEN_V3_PREFIX, URL_SAFE.encode(json)))
}

// ── Extraction ───────────────────────────────────────────────────────────────

/// First whitespace-separated word that looks like an encoded token.
pub fn find_encoded_token(content: &str) -> Option<&str> {
    content
        .split_whitespace()
        .find(|w| w.contains(TOKEN_V3_PREFIX) || w.contains(TOKEN_V4_PREFIX))
}

/// The `token` query parameter of `input` when it parses as a URL.
fn token_from_url(input: &str) -> Option<String> {
    let url = url::Url::parse(input).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == TOKEN_URL_PARAM)
        .map(|(_, v)| v.into_owned())
}

/// Pull an encoded token out of scanned or pasted input.
///
/// A URL with a `token` parameter wins; otherwise the raw input is taken
/// as the encoding. Either way the token must decode, and the encoded
/// string (not the decoded token) is returned.
pub fn extract_encoded_token(input: &str) -> Result<String, WalletError> {
    if let Some(url_token) = token_from_url(input) {
        decode_token(&url_token)?;
        return Ok(url_token);
    }
    decode_token(input)?;
    Ok(input.to_string())
}
