use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// SQL Schema Linter - Lint SQL scripts against the schema they build
#[derive(Parser, Debug)]
#[command(name = "sql-schema-linter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lint a SQL script, building the schema model statement by statement
    Lint {
        /// Path to SQL file (use - for stdin)
        input: PathBuf,

        /// SQL dialect for parsing (overrides configuration)
        #[arg(long, value_enum)]
        dialect: Option<Dialect>,

        /// Schema of unqualified table names (overrides configuration)
        #[arg(long)]
        default_schema: Option<String>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Show rule classes, statement outcomes and debug logs
        #[arg(short, long)]
        verbose: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Disable a rule by ID or class name (repeatable)
        #[arg(long = "disable", value_name = "RULE")]
        disabled: Vec<String>,

        /// Write the final schema model as JSON
        #[arg(long, value_name = "PATH")]
        snapshot: Option<PathBuf>
    },

    /// List the registered rules
    Rules
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Dialect {
    Generic,
    Mysql,
    Postgresql,
    Sqlite,
    Mssql,
    Clickhouse
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml
}
