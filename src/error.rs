pub use masterror::{AppError, AppResult};

use crate::{engine::TraversalError, schema::ModelError, source::StatementLocation};

/// Create file read error
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to read file '{}': {}", path, source))
}

/// Create file write error
pub fn file_write_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to write file '{}': {}", path, source))
}

/// Create statement parse error with position re-based onto the statement
pub fn statement_parse_error(message: impl Into<String>, at: StatementLocation) -> AppError {
    AppError::bad_request(format_statement_error(&message.into(), at))
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Convert a fatal schema model failure into an application error
pub fn model_error(err: &ModelError) -> AppError {
    AppError::internal(format!("Schema model integrity violation: {}", err))
}

/// Convert a traversal failure into an application error
pub fn traversal_error(err: &TraversalError, at: StatementLocation) -> AppError {
    AppError::internal(format!("Statement #{}: {}", at.index + 1, err))
}

/// Render a parser message, mapping its position into the source text.
///
/// The parser only sees a single statement, so a reported `Line: 1, Column 5`
/// is relative to the statement start and gets shifted by `at`.
pub fn format_statement_error(message: &str, at: StatementLocation) -> String {
    match extract_position(message) {
        Some(pos) => {
            let line = at.line + pos.line.saturating_sub(1);
            let column = if pos.line <= 1 {
                at.column + pos.column.saturating_sub(1)
            } else {
                pos.column
            };
            format!(
                "Statement #{} parse error at line {}, column {}:\n  {}",
                at.index + 1,
                line,
                column,
                message
            )
        }
        None => format!(
            "Statement #{} parse error at line {}:\n  {}",
            at.index + 1,
            at.line,
            message
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlPosition {
    pub line:   usize,
    pub column: usize
}

/// Extract `Line: X, Column Y` from a sqlparser message
pub fn extract_position(message: &str) -> Option<SqlPosition> {
    let line_marker = "Line: ";
    let col_marker = ", Column ";

    let line_start = message.find(line_marker)? + line_marker.len();
    let col_start = message[line_start..].find(col_marker)?;
    let line_str = &message[line_start..line_start + col_start];
    let col_num_start = line_start + col_start + col_marker.len();

    let col_end = message[col_num_start..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(message.len() - col_num_start);
    let col_str = &message[col_num_start..col_num_start + col_end];

    match (line_str.parse(), col_str.parse()) {
        (Ok(line), Ok(column)) => Some(SqlPosition { line, column }),
        _ => None
    }
}
