//! Configuration schema (unstar.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the project root
pub const CONFIG_FILE_NAME: &str = "unstar.toml";

/// SQL dialect configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectConfig {
    /// BigQuery SQL dialect
    BigQuery,

    /// Snowflake SQL dialect
    Snowflake,

    /// PostgreSQL SQL dialect
    Postgres,

    /// Generic ANSI SQL
    #[default]
    Ansi,
}

/// How `SELECT *` is rewritten
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionStrategy {
    /// Parse the statement and rewrite the AST. Handles qualified stars,
    /// `DISTINCT`, CTEs and subqueries; re-serializes the statement body.
    #[default]
    Structural,

    /// Rewrite `select *` lines in place. Keeps formatting, but only handles
    /// a bare star directly after `select` on the same line.
    Textual,
}

impl std::fmt::Display for ExpansionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structural => write!(f, "structural"),
            Self::Textual => write!(f, "textual"),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQL dialect used by the structural strategy
    #[serde(default)]
    pub dialect: DialectConfig,

    /// Expansion strategy
    #[serde(default)]
    pub strategy: ExpansionStrategy,

    /// Adapter used when none is given on the command line
    #[serde(default = "default_adapter")]
    pub adapter: String,

    /// Manifest path override, relative to the project root
    #[serde(default)]
    pub manifest: Option<PathBuf>,

    /// Suffix appended to a model path to form its backup path
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,

    /// Model names never processed (supports `*` wildcards)
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

fn default_adapter() -> String {
    "dbt".to_string()
}

fn default_backup_suffix() -> String {
    ".bak".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: DialectConfig::default(),
            strategy: ExpansionStrategy::default(),
            adapter: default_adapter(),
            manifest: None,
            backup_suffix: default_backup_suffix(),
            exclude: Vec::new(),
            project_root: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.display().to_string(), e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load `unstar.toml` from the project root, or defaults if there is none
    pub fn discover(project_root: &Path) -> Result<Self, ConfigError> {
        let path = project_root.join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.project_root = project_root.to_path_buf();
        Ok(config)
    }

    /// Manifest override resolved against the project root
    pub fn manifest_path(&self) -> Option<PathBuf> {
        self.manifest.as_ref().map(|p| self.project_root.join(p))
    }
}

/// Simple glob matching (supports a single `*`)
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    if let Some(star_pos) = pattern.find('*') {
        let prefix = &pattern[..star_pos];
        let suffix = &pattern[star_pos + 1..];

        text.len() >= prefix.len() + suffix.len()
            && text.starts_with(prefix)
            && text.ends_with(suffix)
    } else {
        pattern == text
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.dialect, DialectConfig::Ansi);
        assert_eq!(config.strategy, ExpansionStrategy::Structural);
        assert_eq!(config.adapter, "dbt");
        assert_eq!(config.backup_suffix, ".bak");
    }

    #[test]
    fn parse_partial_toml() {
        let config = Config::from_toml(
            r#"
            dialect = "snowflake"
            strategy = "textual"
            exclude = ["legacy_*"]
            "#,
        )
        .unwrap();

        assert_eq!(config.dialect, DialectConfig::Snowflake);
        assert_eq!(config.strategy, ExpansionStrategy::Textual);
        assert_eq!(config.adapter, "dbt");
        assert_eq!(config.exclude, vec!["legacy_*"]);
    }

    #[test]
    fn unknown_strategy_is_an_error() {
        let result = Config::from_toml("strategy = \"magic\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn glob_matching() {
        assert!(glob_match("*", "anything"));
        assert!(glob_match("stg_*", "stg_users"));
        assert!(glob_match("*_tmp", "orders_tmp"));
        assert!(!glob_match("stg_*", "users"));
        assert!(!glob_match("ab*ba", "aba"));
    }
}
