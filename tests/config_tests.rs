use std::{collections::HashMap, fs};

use sql_schema_linter::{
    config::{Config, LOCAL_CONFIG, RulesConfig},
    source::SqlDialect
};
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.linter.default_schema, "dbo");
    assert_eq!(config.linter.dialect, SqlDialect::Generic);
    assert!(config.rules.disabled.is_empty());
    assert!(config.rules.severity.is_empty());
}

#[test]
fn test_parse_full_file() {
    let config = Config::parse(
        r#"
        [linter]
        default_schema = "public"
        dialect = "postgresql"

        [rules]
        disabled = ["STYLE001", "MissingWhereClause"]

        [rules.severity]
        PERF001 = "error"
        "#
    )
    .unwrap();

    assert_eq!(config.linter.default_schema, "public");
    assert_eq!(config.linter.dialect, SqlDialect::PostgreSQL);
    assert_eq!(config.rules.disabled, vec!["STYLE001", "MissingWhereClause"]);
    assert_eq!(config.rules.severity.get("PERF001").unwrap(), "error");
}

#[test]
fn test_rules_section_alone() {
    let config = Config::parse("[rules]\ndisabled = [\"SEC001\"]\n").unwrap();
    assert_eq!(config.linter.default_schema, "dbo");
    assert_eq!(config.rules.disabled, vec!["SEC001"]);
}

#[test]
fn test_rules_config_with_severity() {
    let config = RulesConfig {
        disabled: vec![],
        severity: HashMap::from([("PERF001".to_string(), "error".to_string())])
    };

    assert_eq!(config.severity.get("PERF001").unwrap(), "error");
}

#[test]
fn test_invalid_file_is_an_error() {
    assert!(Config::parse("[linter\ndialect = ").is_err());
    assert!(Config::parse("[linter]\ndialect = \"oracle\"\n").is_err());
}

#[test]
fn test_local_file_replaces_home_file() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let home_file = home.path().join("config.toml");
    let local_file = work.path().join(LOCAL_CONFIG);
    fs::write(&home_file, "[linter]\ndefault_schema = \"home\"\n").unwrap();

    let config = Config::load_files(Some(&home_file), &local_file).unwrap();
    assert_eq!(config.linter.default_schema, "home");

    fs::write(&local_file, "[linter]\ndialect = \"mysql\"\n").unwrap();
    let config = Config::load_files(Some(&home_file), &local_file).unwrap();
    assert_eq!(config.linter.dialect, SqlDialect::MySQL);
    assert_eq!(config.linter.default_schema, "dbo");
}

#[test]
fn test_missing_files_give_defaults() {
    let work = TempDir::new().unwrap();
    let config = Config::load_files(None, &work.path().join(LOCAL_CONFIG)).unwrap();
    assert_eq!(config.linter.default_schema, "dbo");
}

#[test]
fn test_environment_overrides_files() {
    let work = TempDir::new().unwrap();
    let local_file = work.path().join(LOCAL_CONFIG);
    fs::write(&local_file, "[linter]\ndefault_schema = \"app\"\ndialect = \"sqlite\"\n").unwrap();

    let mut config = Config::load_files(None, &local_file).unwrap();
    config
        .apply_env(|name| match name {
            "SQL_LINTER_DEFAULT_SCHEMA" => Some("tenant".to_string()),
            "SQL_LINTER_DIALECT" => Some("MSSQL".to_string()),
            _ => None
        })
        .unwrap();

    assert_eq!(config.linter.default_schema, "tenant");
    assert_eq!(config.linter.dialect, SqlDialect::MsSql);
}

#[test]
fn test_empty_environment_schema_is_ignored() {
    let mut config = Config::default();
    config
        .apply_env(|name| (name == "SQL_LINTER_DEFAULT_SCHEMA").then(String::new))
        .unwrap();
    assert_eq!(config.linter.default_schema, "dbo");
}
