//! Application logic for the SQL Schema Linter CLI.
//!
//! This module contains the core application logic separated from the main
//! entry point to enable testing.

mod convert;
mod helpers;
mod lint;
mod types;

pub use convert::{convert_dialect, convert_format};
pub use helpers::{
    apply_overrides, calculate_exit_code, create_output_options, parse_failure_caution,
    read_sql_input, write_snapshot
};
pub use lint::{format_rule_list, run_lint};
pub use types::{LintOutcome, LintParams};
