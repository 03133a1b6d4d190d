//! Configuration loading and management.
//!
//! Configuration is loaded from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. `.sql-linter.toml` in current directory
//! 4. `~/.config/sql-linter/config.toml`
//! 5. Default values
//!
//! # Configuration File Format
//!
//! ```toml
//! [linter]
//! default_schema = "dbo"
//! dialect = "postgresql"       # generic, mysql, postgresql, sqlite, mssql, clickhouse
//!
//! [rules]
//! disabled = ["STYLE001", "MissingWhereClause"]
//!
//! [rules.severity]
//! PERF001 = "error"
//! SCHEMA002 = "warning"
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `SQL_LINTER_DEFAULT_SCHEMA` | Schema of unqualified table names |
//! | `SQL_LINTER_DIALECT` | Parser dialect |

use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf}
};

use serde::Deserialize;
use tracing::debug;

use crate::{
    error::{AppResult, config_error},
    schema::DEFAULT_SCHEMA,
    source::SqlDialect
};

/// Local configuration file name
pub const LOCAL_CONFIG: &str = ".sql-linter.toml";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub linter: LinterConfig,
    #[serde(default)]
    pub rules:  RulesConfig
}

/// Parsing and schema model settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinterConfig {
    /// Schema that unqualified table names resolve to
    pub default_schema: String,
    pub dialect:        SqlDialect
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self {
            default_schema: String::from(DEFAULT_SCHEMA),
            dialect:        SqlDialect::Generic
        }
    }
}

/// Rules configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RulesConfig {
    /// Disabled rule IDs or rule class names
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Severity overrides (rule_id -> severity)
    #[serde(default)]
    pub severity: HashMap<String, String>
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file in current directory (.sql-linter.toml)
    /// 3. Config file in home directory (~/.config/sql-linter/config.toml)
    /// 4. Default values
    pub fn load() -> AppResult<Self> {
        let home = env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("sql-linter")
                .join("config.toml")
        });
        let mut config = Self::load_files(home.as_deref(), Path::new(LOCAL_CONFIG))?;
        config.apply_env(|name| env::var(name).ok())?;
        Ok(config)
    }

    /// Load the home and local files, the local one replacing the home one
    pub fn load_files(home: Option<&Path>, local: &Path) -> AppResult<Self> {
        let mut config = Self::default();
        for path in home.into_iter().chain([local]) {
            if path.exists() {
                debug!(path = %path.display(), "loading configuration file");
                config = Self::from_file(path)?;
            }
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| config_error(format!("Failed to read config file: {}", e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| config_error(format!("Invalid config file: {}", e)))
    }

    /// Override settings from environment variables read through `var`
    pub fn apply_env<F>(&mut self, var: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>
    {
        if let Some(schema) = var("SQL_LINTER_DEFAULT_SCHEMA")
            && !schema.is_empty()
        {
            self.linter.default_schema = schema;
        }

        if let Some(name) = var("SQL_LINTER_DIALECT") {
            self.linter.dialect = SqlDialect::from_name(&name).ok_or_else(|| {
                config_error(format!("Unknown dialect in SQL_LINTER_DIALECT: {}", name))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.linter.default_schema, "dbo");
        assert_eq!(config.linter.dialect, SqlDialect::Generic);
    }

    #[test]
    fn test_partial_linter_section_keeps_defaults() {
        let config = Config::parse("[linter]\ndialect = \"sqlite\"\n").unwrap();
        assert_eq!(config.linter.dialect, SqlDialect::SQLite);
        assert_eq!(config.linter.default_schema, "dbo");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::parse("[linter]\ndefault_schema = \"app\"\n").unwrap();
        config
            .apply_env(|name| match name {
                "SQL_LINTER_DEFAULT_SCHEMA" => Some("public".into()),
                _ => None
            })
            .unwrap();
        assert_eq!(config.linter.default_schema, "public");
    }

    #[test]
    fn test_unknown_env_dialect_is_error() {
        let mut config = Config::default();
        let result = config.apply_env(|name| {
            (name == "SQL_LINTER_DIALECT").then(|| String::from("oracle"))
        });
        assert!(result.is_err());
    }
}
