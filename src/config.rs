//! Configuration file parser for ~/.config/select-list/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`,
//! which means the built-in catalog and the default database location.
//! Unknown keys are accepted by serde but logged as likely typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("database_path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid catalog in config file: {0}")]
    Catalog(#[from] CatalogError),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database file holding the stored selection. Defaults to
    /// `selection.db` in `~/.config/select-list/`, wherever the config file
    /// itself lives.
    pub database_path: Option<PathBuf>,

    /// Catalog override. Empty means the built-in catalog.
    pub categories: Vec<CategoryConfig>,
}

/// One `[[categories]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
}

/// One entry of a category's `items` array.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemConfig {
    pub name: String,
    #[serde(default)]
    pub color: String,
    /// Default selection before any stored selection is applied.
    #[serde(default)]
    pub selected: bool,
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load and validate configuration from a TOML file.
    ///
    /// - Missing or blank file → `Ok(Config::default())`
    /// - Invalid TOML or wrong types → `Err(ConfigError::Parse)`
    /// - Unknown keys, at the top level or inside a category or item table →
    ///   accepted, logged as warning
    /// - Empty `database_path` → `Err(ConfigError::EmptyDatabasePath)`
    /// - Catalog that would not build → `Err(ConfigError::Catalog)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = read_bounded(path)? else {
            return Ok(Self::default());
        };

        if let Ok(raw) = content.parse::<toml::Table>() {
            warn_unknown_keys(&raw);
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            categories = config.categories.len(),
            custom_database = config.database_path.is_some(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// The configured catalog, or the built-in one when none is configured.
    pub fn catalog(&self) -> Result<Catalog, CatalogError> {
        if self.categories.is_empty() {
            Ok(Catalog::builtin())
        } else {
            Catalog::from_config(&self.categories)
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self
            .database_path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(ConfigError::EmptyDatabasePath);
        }
        self.catalog()?;
        Ok(())
    }
}

/// Read the file, or `None` when it is missing or blank.
fn read_bounded(path: &Path) -> Result<Option<String>, ConfigError> {
    let not_found = |e: &std::io::Error| e.kind() == std::io::ErrorKind::NotFound;

    let len = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if not_found(&e) => {
            tracing::debug!(path = %path.display(), "No config file found, using defaults");
            return Ok(None);
        }
        Err(e) => return Err(ConfigError::Io(e)),
    };
    if len > Config::MAX_FILE_SIZE {
        return Err(ConfigError::TooLarge(format!(
            "Config file is {} bytes (max {} bytes)",
            len,
            Config::MAX_FILE_SIZE
        )));
    }

    match std::fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            Ok(None)
        }
        Ok(content) => Ok(Some(content)),
        // Deleted between metadata and read
        Err(e) if not_found(&e) => Ok(None),
        Err(e) => Err(ConfigError::Io(e)),
    }
}

fn warn_unknown_keys(raw: &toml::Table) {
    const TOP: &[&str] = &["database_path", "categories"];
    const CATEGORY: &[&str] = &["name", "expanded", "items"];
    const ITEM: &[&str] = &["name", "color", "selected"];

    let unknown = |table: &toml::Table, known: &[&str], section: &str| {
        for key in table.keys().filter(|k| !known.contains(&k.as_str())) {
            tracing::warn!(key = %key, section, "Unknown key in config file, ignoring");
        }
    };

    unknown(raw, TOP, "top level");
    let Some(categories) = raw.get("categories").and_then(|v| v.as_array()) else {
        return;
    };
    for category in categories.iter().filter_map(|c| c.as_table()) {
        unknown(category, CATEGORY, "categories");
        let items = category.get("items").and_then(|v| v.as_array());
        for item in items.into_iter().flatten().filter_map(|i| i.as_table()) {
            unknown(item, ITEM, "items");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(test: &str, content: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("select_list_config_test_{test}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database_path.is_none());
        assert!(config.categories.is_empty());
        assert_eq!(config.catalog().unwrap(), Catalog::builtin());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/select_list_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert!(config.categories.is_empty());
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let (dir, path) = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert!(config.database_path.is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r##"
database_path = "/var/lib/select-list/selection.db"

[[categories]]
name = "Support"
expanded = true
items = [
    { name = "Open", color = "#FF0000", selected = true },
    { name = "Closed", color = "#00FF00" },
]

[[categories]]
name = "Billing"
items = [{ name = "Invoices" }]
"##;
        let (dir, path) = write_config("full", content);

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.database_path.as_deref(),
            Some(Path::new("/var/lib/select-list/selection.db"))
        );
        assert_eq!(config.categories.len(), 2);

        let catalog = config.catalog().unwrap();
        let support = catalog.category("Support").unwrap();
        assert!(support.is_expanded());
        assert!(support.item("Open").unwrap().is_selected());
        assert!(!support.item("Closed").unwrap().is_selected());
        assert_eq!(catalog.category("Billing").unwrap().items()[0].color(), "");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_catalog_reported() {
        let content = r#"
[[categories]]
name = "Empty"
"#;
        let (dir, path) = write_config("empty_category", content);
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Catalog(CatalogError::EmptyCategory(ref name)) if name == "Empty"
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_database_path_rejected() {
        let (dir, path) = write_config("empty_db_path", "database_path = \"\"\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyDatabasePath));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_nested_keys_accepted() {
        let content = r#"
[[categories]]
name = "Support"
collapsed = true
items = [{ name = "Open", colour = "red" }]
"#;
        let (dir, path) = write_config("unknown_nested", content);
        let config = Config::load(&path).unwrap();
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.category("Support").unwrap().items()[0].color(), "");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (dir, path) = write_config("invalid", "this is not [valid toml");

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let (dir, path) = write_config("wrongtype", "categories = \"Sales\"\n");
        assert!(Config::load(&path).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let (dir, path) = write_config("unknown", "theme = \"dark\"\nanother_unknown = 42\n");
        let config = Config::load(&path).unwrap();
        assert!(config.categories.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"#".repeat(1_048_577));

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
