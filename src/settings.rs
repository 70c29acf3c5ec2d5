use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{BankError, Result};
use crate::rules::RuleConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_rules_file")]
    pub rules_file: String,
    /// Ledger used when a command is given no file.
    #[serde(default)]
    pub ledger_file: Option<String>,
}

fn default_rules_file() -> String {
    RuleConfig::default_location()
        .path()
        .to_string_lossy()
        .to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules_file: default_rules_file(),
            ledger_file: None,
        }
    }
}

impl Settings {
    pub fn rule_config(&self) -> RuleConfig {
        RuleConfig::new(shellexpand_path(&self.rules_file))
    }

    /// The given files, or the configured ledger when there are none.
    pub fn files_or_ledger(&self, files: Vec<String>) -> Result<Vec<String>> {
        if !files.is_empty() {
            return Ok(files);
        }
        match &self.ledger_file {
            Some(ledger) => Ok(vec![shellexpand_path(ledger)]),
            None => Err(BankError::Settings(
                "No file given and no ledger configured.\nRun `bank config --ledger <file>` to set one."
                    .to_string(),
            )),
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("bank")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| BankError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
