// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use sql_schema_linter::{
    engine::TraversalError,
    error::{
        config_error, extract_position, file_read_error, format_statement_error, model_error,
        statement_parse_error, traversal_error
    },
    schema::{ModelError, TableName},
    source::StatementLocation
};

fn at(index: usize, line: usize, column: usize) -> StatementLocation {
    StatementLocation {
        index,
        line,
        column
    }
}

#[test]
fn test_file_read_error() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error = file_read_error("/path/to/file.sql", io_error);
    let message = error.render_message();
    assert!(message.contains("/path/to/file.sql"));
    assert!(message.contains("file not found"));
}

#[test]
fn test_config_error() {
    let error = config_error("Invalid configuration value");
    assert_eq!(error.render_message(), "Invalid configuration value");
}

#[test]
fn test_extract_position() {
    let pos = extract_position("Expected keyword at Line: 5, Column 10").unwrap();
    assert_eq!((pos.line, pos.column), (5, 10));
}

#[test]
fn test_extract_position_missing() {
    assert!(extract_position("Unexpected token").is_none());
}

#[test]
fn test_position_is_rebased_on_statement_start() {
    let message = format_statement_error("Expected ) at Line: 1, Column 8", at(2, 10, 5));
    assert!(message.starts_with("Statement #3"));
    assert!(message.contains("line 10, column 12"));
}

#[test]
fn test_position_on_later_line_keeps_column() {
    let message = format_statement_error("oops at Line: 3, Column 4", at(0, 7, 9));
    assert!(message.contains("line 9, column 4"));
}

#[test]
fn test_statement_parse_error_without_position() {
    let message = format_statement_error("Unexpected token", at(0, 4, 1));
    assert!(message.contains("line 4:"));
    let error = statement_parse_error("Unexpected token", at(0, 4, 1));
    assert!(error.render_message().starts_with("Statement #1 parse error at line 4"));
}

#[test]
fn test_model_error_names_the_violation() {
    let err = ModelError::Integrity("duplicate index key".into());
    assert!(err.is_fatal());
    assert!(err.to_string().contains("duplicate index key"));
    assert!(model_error(&err).render_message().contains("duplicate index key"));
}

#[test]
fn test_traversal_error_names_the_statement() {
    let err = TraversalError::DepthGap {
        node:       "Where".into(),
        depth:      2,
        open_depth: 0
    };
    assert!(err.to_string().contains("depth 2"));
    let error = traversal_error(&err, at(4, 1, 1));
    let message = error.render_message();
    assert!(message.contains("Statement #5"));
    assert!(message.contains("depth 2"));
}

#[test]
fn test_missing_entity_errors_name_the_key() {
    let err = ModelError::MissingTable {
        table: TableName::new("dbo", "t2")
    };
    assert_eq!(err.to_string(), "Table \"dbo.t2\" does not exist");
    assert_eq!(err.missing_key().unwrap().parts(), ["dbo", "t2"]);
    assert!(!err.is_fatal());
}
