//! # SQL Schema Linter
//!
//! Lints SQL scripts against the schema model the script itself builds.
//!
//! Every statement is checked by the rule engine against the tables created
//! by the statements before it, then its DDL is applied to the in-memory
//! model.
//!
//! # Quick Start
//!
//! ```bash
//! # Lint a migration script
//! sql-schema-linter lint migrations.sql
//!
//! # JSON output for CI, PostgreSQL dialect
//! sql-schema-linter lint migrations.sql --dialect postgresql -f json
//!
//! # Stream from stdin and keep the final model
//! cat *.sql | sql-schema-linter lint - --snapshot model.json
//!
//! # Show the registered rules
//! sql-schema-linter rules
//! ```
//!
//! # Exit Codes
//!
//! - `0` - Success, no issues or only informational messages
//! - `1` - Warnings found
//! - `2` - Errors or unparseable statements found
//!
//! # Logging
//!
//! Diagnostics go to stderr through `tracing`. `RUST_LOG` selects the
//! filter; otherwise `--verbose` enables `debug` and the default is `warn`.

use std::process;

use clap::Parser;
use sql_schema_linter::{
    app::{LintParams, format_rule_list, run_lint},
    cli::{Cli, Commands},
    config::Config,
    error::AppResult
};
use tracing_subscriber::EnvFilter;

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e.render_message());
            process::exit(2);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> AppResult<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Lint {
            input,
            dialect,
            default_schema,
            output_format,
            verbose,
            no_color,
            disabled,
            snapshot
        } => {
            init_logging(verbose);
            let config = Config::load()?;
            let params = LintParams {
                input_path: input.display().to_string(),
                dialect,
                default_schema,
                output_format,
                verbose,
                no_color,
                disabled,
                snapshot_path: snapshot.map(|p| p.display().to_string())
            };
            let outcome = run_lint(params, config)?;
            println!("{}", outcome.output);
            Ok(outcome.exit_code)
        }
        Commands::Rules => {
            init_logging(false);
            let config = Config::load()?;
            println!("{}", format_rule_list(&config));
            Ok(0)
        }
    }
}
