//! End-to-end tests for the cashew-wallet binary.
//!
//! Run with:
//!   cargo test -p cashew-wallet --test cli

use std::path::PathBuf;
use std::process::{Command, Output};

const TOKEN: &str = "cashuAeyJ0b2tlbiI6W3sibWludCI6Imh0dHBzOi8vODMzMy5zcGFjZTozMzM4IiwicHJvb2ZzIjpbeyJhbW91bnQiOjIsImlkIjoiMDA5YTFmMjkzMjUzZTQxZSIsInNlY3JldCI6IjQwNzkxNWJjMjEyYmU2MWE3N2UzZTZkMmFlYjRjNzI3OTgwYmRhNTFjZDA2YTZhZmMyOWUyODYxNzY4YTc4MzciLCJDIjoiMDJiYzkwOTc5OTdkODFhZmIyY2M3MzQ2YjVlNDM0NWE5MzQ2YmQyYTUwNmViNzk1ODU5OGE3MmYwY2Y4NTE2M2VhIn0seyJhbW91bnQiOjgsImlkIjoiMDA5YTFmMjkzMjUzZTQxZSIsInNlY3JldCI6ImZlMTUxMDkzMTRlNjFkNzc1NmIwZjhlZTBmMjNhNjI0YWNhYTNmNGUwNDJmNjE0MzNjNzI4YzcwNTdiOTMxYmUiLCJDIjoiMDI5ZThlNTA1MGI4OTBhN2Q2YzA5NjhkYjE2YmMxZDVkNWZhMDQwZWExZGUyODRmNmVjNjlkNjEyOTlmNjcxMDU5In1dfV0sInVuaXQiOiJzYXQiLCJtZW1vIjoiVGhhbmsgeW91LiJ9";

const INVOICE: &str = "lnbc2500u1pvjluezpp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdq5xysxxatsyp3k7enxv4jsxqzpuaztrnwngzn3kdzw5hydlzf03qdgm2hdq27cqv3agm2awhz5se903vruatfhq77w3ls4evs3ch9zw97j25emudupq63nyw24cg27h2rspfj9srp";

// ── Helpers ───────────────────────────────────────────────────────────────────

struct DataDir(PathBuf);

impl DataDir {
    fn new(name: &str) -> Self {
        Self(std::env::temp_dir().join(format!("cashew-cli-{}-{}", name, std::process::id())))
    }
}

impl Drop for DataDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn wallet(data_dir: &DataDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cashew-wallet"))
        .arg("--data-dir")
        .arg(&data_dir.0)
        .args(args)
        .output()
        .expect("running cashew-wallet")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn decodes_token() {
    let dir = DataDir::new("token");
    let out = wallet(&dir, &["decode-token", TOKEN]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let summary: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(summary["total_amount"], 10);
    assert_eq!(summary["proofs"], 2);
    assert_eq!(summary["memo"], "Thank you.");
    assert_eq!(summary["mints"][0], "https://8333.space:3338");
}

#[test]
fn rejects_broken_token() {
    let dir = DataDir::new("broken");
    let out = wallet(&dir, &["decode-token", "cashuAbroken"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Provided ecash token is invalid."));
}

#[test]
fn decodes_invoice() {
    let dir = DataDir::new("invoice");
    let out = wallet(&dir, &["decode-invoice", &format!("lightning:{INVOICE}")]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let summary: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(summary["amount"], 250_000);
    assert_eq!(summary["description"], "1 cup coffee");
    assert_eq!(summary["expiry"], 60);
}

#[test]
fn checks_mnemonic() {
    let dir = DataDir::new("mnemonic");
    let phrase = "half depart obvious quality work element tank gorilla view sugar picture humble";
    let out = wallet(&dir, &["check-mnemonic", phrase]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("Seed hash:"));

    let bad = wallet(&dir, &["check-mnemonic", "half depart"]);
    assert!(!bad.status.success());
}

#[test]
fn mints_persist_between_runs() {
    let dir = DataDir::new("mints");
    let added = wallet(&dir, &["add-mint", "https://mint.test/Bitcoin"]);
    assert!(added.status.success(), "{}", String::from_utf8_lossy(&added.stderr));

    let listed = wallet(&dir, &["mints"]);
    assert!(stdout(&listed).contains("https://mint.test/Bitcoin  keysets=0  counter=0"));

    let balance = wallet(&dir, &["balance"]);
    let balances: serde_json::Value = serde_json::from_str(&stdout(&balance)).unwrap();
    assert_eq!(balances["total_balance"], 0);

    let history = wallet(&dir, &["history"]);
    assert!(stdout(&history).contains("No transactions."));
}
