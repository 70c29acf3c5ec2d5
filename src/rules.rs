use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{BankError, Result};

/// Format version written with every rule store.
pub const RULES_VERSION: &str = "2";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleStore {
    /// Exact item text -> category.
    #[serde(default)]
    pub exact: BTreeMap<String, String>,
    /// Regex -> category, tried when no exact rule applies.
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,
    #[serde(default = "current_version")]
    pub version: String,
}

fn current_version() -> String {
    RULES_VERSION.to_string()
}

impl Default for RuleStore {
    fn default() -> Self {
        Self {
            exact: BTreeMap::new(),
            patterns: BTreeMap::new(),
            version: RULES_VERSION.to_string(),
        }
    }
}

/// Rule store as found on disk. Stores written before versioning were a
/// flat item -> category map.
#[derive(Debug, Clone)]
pub enum StoredRules {
    Current(RuleStore),
    Legacy(BTreeMap<String, String>),
}

impl StoredRules {
    /// Current stores hold `exact`/`patterns` objects. Legacy values are
    /// always strings, so an item named `version` or `exact` stays legacy.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let current = ["exact", "patterns"]
            .iter()
            .any(|key| value.get(key).is_some_and(serde_json::Value::is_object));
        if current {
            Ok(Self::Current(serde_json::from_value(value)?))
        } else {
            Ok(Self::Legacy(serde_json::from_value(value)?))
        }
    }
}

/// Bring any stored shape up to the current format.
pub fn migrate(stored: StoredRules) -> RuleStore {
    match stored {
        StoredRules::Current(mut store) => {
            store.version = RULES_VERSION.to_string();
            store
        }
        StoredRules::Legacy(exact) => RuleStore {
            exact,
            ..RuleStore::default()
        },
    }
}

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("pattern invalid: {0}")]
    Invalid(#[from] regex::Error),

    #[error("pattern does not match {0:?}")]
    NoMatch(String),
}

/// Accept `pattern` only if it compiles and matches `item`.
pub fn validate_pattern(pattern: &str, item: &str) -> std::result::Result<Regex, PatternError> {
    let re = Regex::new(pattern)?;
    if re.is_match(item) {
        Ok(re)
    } else {
        Err(PatternError::NoMatch(item.to_string()))
    }
}

impl RuleStore {
    /// Every category label in use, sorted.
    pub fn categories(&self) -> Vec<String> {
        let labels: BTreeSet<&String> = self.exact.values().chain(self.patterns.values()).collect();
        labels.into_iter().cloned().collect()
    }

    pub fn is_category(&self, label: &str) -> bool {
        self.exact.values().chain(self.patterns.values()).any(|c| c == label)
    }

    pub fn add_exact(&mut self, item: &str, category: &str) {
        self.exact.insert(item.to_string(), category.to_string());
    }

    pub fn add_pattern(&mut self, pattern: &str, category: &str) {
        self.patterns.insert(pattern.to_string(), category.to_string());
    }

    /// Compile the pattern rules once for repeated lookups.
    pub fn matcher(&self) -> Matcher<'_> {
        let patterns = self
            .patterns
            .iter()
            .filter_map(|(pattern, category)| match Regex::new(pattern) {
                Ok(re) => Some((re, category.as_str())),
                Err(e) => {
                    tracing::warn!("ignoring invalid pattern rule {pattern:?}: {e}");
                    None
                }
            })
            .collect();
        Matcher {
            exact: &self.exact,
            patterns,
        }
    }
}

pub struct Matcher<'a> {
    exact: &'a BTreeMap<String, String>,
    patterns: Vec<(Regex, &'a str)>,
}

impl<'a> Matcher<'a> {
    /// Category for `text`: an exact rule first, then the first matching
    /// pattern in pattern order.
    pub fn categorize(&self, text: &str) -> Option<&'a str> {
        if let Some(category) = self.exact.get(text) {
            return Some(category.as_str());
        }
        self.patterns
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map(|(_, category)| *category)
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Where a rule store lives on disk.
#[derive(Debug, Clone)]
pub struct RuleConfig {
    path: PathBuf,
}

impl RuleConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.config/bank/categories.json`
    pub fn default_location() -> Self {
        Self::new(crate::settings::config_dir().join("categories.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store, or an empty one if nothing has been saved yet.
    /// Legacy stores are upgraded on the way in.
    pub fn load(&self) -> Result<RuleStore> {
        if !self.path.exists() {
            return Ok(RuleStore::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let stored = StoredRules::from_json(&content)
            .map_err(|e| BankError::Settings(format!("{}: {e}", self.path.display())))?;
        Ok(migrate(stored))
    }

    pub fn save(&self, store: &RuleStore) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(store)?;
        std::fs::write(&self.path, format!("{json}\n"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy() -> BTreeMap<String, String> {
        [
            ("Item 1", "Food"),
            ("Item 2", "Entertainment"),
            ("Item 4", "Entertainment"),
            ("Item 5", "Petrol"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_load_missing_file_gives_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuleConfig::new(dir.path().join("categories.json"));
        let store = config.load().unwrap();
        assert!(store.exact.is_empty());
        assert!(store.patterns.is_empty());
        assert_eq!(store.version, RULES_VERSION);
    }

    #[test]
    fn test_migrate_legacy_is_pure() {
        let store = migrate(StoredRules::Legacy(legacy()));
        assert_eq!(store.exact, legacy());
        assert!(store.patterns.is_empty());
        assert_eq!(store.version, RULES_VERSION);
    }

    #[test]
    fn test_load_legacy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        std::fs::write(&path, serde_json::to_string(&legacy()).unwrap()).unwrap();
        let store = RuleConfig::new(&path).load().unwrap();
        assert_eq!(store.exact.get("Item 5").map(String::as_str), Some("Petrol"));
        assert_eq!(store.version, RULES_VERSION);
    }

    #[test]
    fn test_legacy_item_named_version_stays_legacy() {
        let json = r#"{"version": "Stationery", "Item 1": "Food"}"#;
        let store = migrate(StoredRules::from_json(json).unwrap());
        assert_eq!(store.exact.len(), 2);
        assert_eq!(store.exact["version"], "Stationery");
        assert_eq!(store.exact["Item 1"], "Food");
        assert_eq!(store.version, RULES_VERSION);
    }

    #[test]
    fn test_current_store_without_version_field() {
        let json = r#"{"patterns": {"^Item": "Stuff"}}"#;
        let stored = StoredRules::from_json(json).unwrap();
        assert!(matches!(stored, StoredRules::Current(_)));
        let store = migrate(stored);
        assert_eq!(store.patterns["^Item"], "Stuff");
        assert!(store.exact.is_empty());
    }

    #[test]
    fn test_save_writes_current_shape() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuleConfig::new(dir.path().join("nested").join("categories.json"));
        let mut store = RuleStore::default();
        store.add_exact("Item 1", "Food");
        store.add_pattern("^Item", "Stuff");
        config.save(&store).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(config.path()).unwrap()).unwrap();
        assert_eq!(raw["version"], RULES_VERSION);
        assert_eq!(raw["exact"]["Item 1"], "Food");
        assert_eq!(raw["patterns"]["^Item"], "Stuff");
        assert_eq!(config.load().unwrap(), store);
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(RuleConfig::new(&path).load(), Err(BankError::Settings(_))));
    }

    #[test]
    fn test_validate_pattern() {
        assert!(validate_pattern("Item.*", "Item 3").is_ok());
        assert!(matches!(
            validate_pattern("Item(", "Item 3"),
            Err(PatternError::Invalid(_))
        ));
        assert!(matches!(
            validate_pattern("^Shop", "Item 3"),
            Err(PatternError::NoMatch(_))
        ));
    }

    #[test]
    fn test_categories_sorted_and_distinct() {
        let mut store = migrate(StoredRules::Legacy(legacy()));
        store.add_pattern("Tesco", "Food");
        assert_eq!(store.categories(), vec!["Entertainment", "Food", "Petrol"]);
        assert!(store.is_category("Petrol"));
        assert!(!store.is_category("Item 1"));
    }

    #[test]
    fn test_exact_rule_beats_pattern() {
        let mut store = RuleStore::default();
        store.add_exact("Item 1", "Food");
        store.add_pattern("Item", "Stuff");
        let matcher = store.matcher();
        assert_eq!(matcher.categorize("Item 1"), Some("Food"));
        assert_eq!(matcher.categorize("Big Item 2"), Some("Stuff"));
        assert_eq!(matcher.categorize("Other"), None);
    }
}
