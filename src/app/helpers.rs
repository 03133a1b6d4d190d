//! Helper functions for CLI operations.

use std::{
    fs::{read_to_string, write},
    io::{self, Read}
};

use super::{convert::convert_dialect, convert::convert_format, types::LintParams};
use crate::{
    cli::Format,
    config::Config,
    error::{AppResult, file_read_error, file_write_error},
    linter::LintReport,
    output::OutputOptions,
    schema::Database,
    snapshot::ModelSnapshot
};

/// Calculates the process exit code based on report severities.
///
/// - `0` - No reports or only informational messages
/// - `1` - At least one warning present
/// - `2` - At least one error or parse failure present
///
/// # Example
///
/// ```
/// use sql_schema_linter::{app::calculate_exit_code, linter::LintReport};
///
/// assert_eq!(calculate_exit_code(&LintReport::default()), 0);
/// ```
pub fn calculate_exit_code(report: &LintReport) -> i32 {
    if report.error_count() > 0 {
        2
    } else if report.warning_count() > 0 {
        1
    } else {
        0
    }
}

/// Reads SQL text from a file, or from stdin when the path is "-".
pub fn read_sql_input(path: &str) -> AppResult<String> {
    if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| file_read_error("stdin", e))?;
        Ok(buffer)
    } else {
        read_to_string(path).map_err(|e| file_read_error(path, e))
    }
}

/// Create output options from parameters
pub fn create_output_options(format: Format, no_color: bool, verbose: bool) -> OutputOptions {
    OutputOptions {
        format: convert_format(format),
        colored: !no_color,
        verbose
    }
}

/// Command-line arguments override the loaded configuration
pub fn apply_overrides(mut config: Config, params: &LintParams) -> Config {
    if let Some(dialect) = params.dialect {
        config.linter.dialect = convert_dialect(dialect);
    }
    if let Some(schema) = &params.default_schema {
        config.linter.default_schema = schema.clone();
    }
    config
        .rules
        .disabled
        .extend(params.disabled.iter().cloned());
    config
}

/// Caution shown before persisting a model built with skipped statements
pub fn parse_failure_caution(report: &LintReport) -> Option<String> {
    report.had_parse_failure.then(|| {
        format!(
            "Caution: {} statement(s) failed to parse and were skipped; \
             the schema model may not match the script",
            report.parse_failures.len()
        )
    })
}

/// Write the model snapshot as pretty JSON
pub fn write_snapshot(path: &str, database: &Database) -> AppResult<()> {
    let json = ModelSnapshot::from(database).to_json()?;
    write(path, json).map_err(|e| file_write_error(path, e))
}
