use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use cashew_recovery::RecoveryConfig;

/// Database directory name under the data directory.
const DB_DIR: &str = "wallet.db";

/// Configuration for the wallet CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Directory holding the wallet database.
    pub data_dir: PathBuf,
    /// Recovery settings; a config file may override any subset.
    pub recovery: RecoveryConfig,
}

impl WalletConfig {
    /// Defaults for `data_dir`, overridden by the JSON file at `path` if
    /// one is given.
    pub fn load(data_dir: PathBuf, path: Option<&Path>) -> anyhow::Result<Self> {
        let recovery = match path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => RecoveryConfig::default(),
        };
        Ok(Self { data_dir, recovery })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_DIR)
    }
}
