//! CLI configuration management.
//!
//! Handles the state directory, contract names, logging and the demo
//! scenario.

use coffer_types::{AccountId, Amount};
use coffer_vm::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding persisted contract state
    pub state_dir: PathBuf,
    /// Signer used when a command does not name one
    pub default_signer: String,
    /// Name the currency stub is submitted under
    pub currency_contract: String,
    /// Name the safe is submitted under
    pub safe_contract: String,
    /// Maximum nested call depth
    pub max_call_depth: usize,
    /// Log filter (e.g. "info" or "coffer_vm=debug")
    pub log_level: String,
    /// Emit logs as JSON
    pub json_logs: bool,
    /// Demo scenario
    pub demo: DemoConfig,
}

/// Amounts used by `coffer demo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub account: String,
    pub mint: Amount,
    pub approve: Amount,
    pub deposit: Amount,
    pub withdraw: Amount,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            account: "alice".to_string(),
            mint: Amount::from(10_000u64),
            approve: Amount::from(200u64),
            deposit: Amount::from(200u64),
            withdraw: Amount::from(50u64),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            state_dir: Self::home_dir().join("state"),
            default_signer: AccountId::SYS.to_string(),
            currency_contract: coffer_contracts::CurrencyStub::NAME.to_string(),
            safe_contract: coffer_contracts::Safe::NAME.to_string(),
            max_call_depth: coffer_vm::MAX_CALL_DEPTH,
            log_level: "warn".to_string(),
            json_logs: false,
            demo: DemoConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration.
    ///
    /// With an explicit path the file must exist. Otherwise the default
    /// location is read if present, falling back to defaults. Nothing is
    /// written; `coffer config init` creates the file.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let config_path = Self::config_path();
                if config_path.exists() {
                    Self::from_file(&config_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Write the default configuration to `path` unless a file is already
    /// there. Returns whether the file was written.
    pub fn init_file(path: &Path) -> anyhow::Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        Ok(true)
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Could not read config {}: {}", path.display(), e))?;
        let config: CliConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        // Create directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check that every configured name is a valid account name.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (field, name) in [
            ("default_signer", &self.default_signer),
            ("currency_contract", &self.currency_contract),
            ("safe_contract", &self.safe_contract),
            ("demo.account", &self.demo.account),
        ] {
            AccountId::validate(name).map_err(|e| anyhow::anyhow!("{}: {}", field, e))?;
        }
        if self.currency_contract == self.safe_contract {
            anyhow::bail!("currency_contract and safe_contract must differ");
        }
        if self.max_call_depth == 0 {
            anyhow::bail!("max_call_depth must be at least 1");
        }
        Ok(())
    }

    /// Settings for the execution client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            default_signer: self.default_signer.clone(),
            max_call_depth: self.max_call_depth,
            ..ClientConfig::default()
        }
    }

    /// Get configuration file path.
    pub fn config_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".coffer")
    }
}
