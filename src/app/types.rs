//! Application types for CLI commands.

use crate::cli::{Dialect, Format};

/// Parameters for the lint command.
///
/// # Example
///
/// ```
/// use sql_schema_linter::{app::LintParams, cli::Format};
///
/// let params = LintParams {
///     input_path:     "schema.sql".to_string(),
///     dialect:        None,
///     default_schema: None,
///     output_format:  Format::Text,
///     verbose:        false,
///     no_color:       true,
///     disabled:       vec!["STYLE001".to_string()],
///     snapshot_path:  None
/// };
/// assert_eq!(params.disabled.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct LintParams {
    /// Path to the SQL file or "-" for stdin input.
    pub input_path:     String,
    /// Parser dialect; the configured one when unset.
    pub dialect:        Option<Dialect>,
    /// Default schema; the configured one when unset.
    pub default_schema: Option<String>,
    pub output_format:  Format,
    pub verbose:        bool,
    pub no_color:       bool,
    /// Rules disabled on top of the configured ones.
    pub disabled:       Vec<String>,
    /// Where to write the final schema model, if anywhere.
    pub snapshot_path:  Option<String>
}

/// Result of a lint command.
#[derive(Debug, Clone)]
pub struct LintOutcome {
    /// Exit code based on report severity (0, 1, or 2).
    pub exit_code: i32,
    /// Formatted report.
    pub output:    String,
    /// Caution printed before the snapshot was written.
    pub caution:   Option<String>
}
