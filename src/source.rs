//! Source text handling: statement splitting and per-statement parsing.
//!
//! The linter parses statements one at a time so that a syntax error only
//! removes the offending statement from the run. Splitting happens on `;`
//! outside of string literals, quoted identifiers and comments.

use serde::{Deserialize, Serialize};
use sqlparser::{
    ast::Statement,
    dialect::{
        ClickHouseDialect, Dialect, GenericDialect, MsSqlDialect, MySqlDialect,
        PostgreSqlDialect, SQLiteDialect
    },
    parser::{Parser, ParserError}
};

/// SQL dialect for parsing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum SqlDialect {
    #[default]
    Generic,
    MySQL,
    PostgreSQL,
    SQLite,
    MsSql,
    ClickHouse
}

impl SqlDialect {
    /// Convert to sqlparser dialect for parsing
    pub fn into_parser_dialect(self) -> Box<dyn Dialect> {
        match self {
            Self::Generic => Box::new(GenericDialect {}),
            Self::MySQL => Box::new(MySqlDialect {}),
            Self::PostgreSQL => Box::new(PostgreSqlDialect {}),
            Self::SQLite => Box::new(SQLiteDialect {}),
            Self::MsSql => Box::new(MsSqlDialect {}),
            Self::ClickHouse => Box::new(ClickHouseDialect {})
        }
    }

    /// Parse a dialect name as used in configuration files
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "generic" => Some(Self::Generic),
            "mysql" => Some(Self::MySQL),
            "postgresql" | "postgres" => Some(Self::PostgreSQL),
            "sqlite" => Some(Self::SQLite),
            "mssql" | "tsql" => Some(Self::MsSql),
            "clickhouse" => Some(Self::ClickHouse),
            _ => None
        }
    }
}

/// Position of a statement inside the linted source.
///
/// `index` is zero-based, `line` and `column` are one-based and point at the
/// first significant character of the statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct StatementLocation {
    pub index:  usize,
    pub line:   usize,
    pub column: usize
}

/// One statement cut out of the source text (without its `;`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatement {
    pub location: StatementLocation,
    pub text:     String
}

impl SourceStatement {
    /// Parse this statement with the given dialect.
    ///
    /// Exactly one statement is expected; anything else is reported as a
    /// parser error so the caller can skip it.
    pub fn parse(&self, dialect: &dyn Dialect) -> Result<Statement, ParserError> {
        let mut statements = Parser::parse_sql(dialect, &self.text)?;
        match statements.len() {
            1 => Ok(statements.remove(0)),
            0 => Err(ParserError::ParserError("Empty statement".into())),
            n => Err(ParserError::ParserError(format!(
                "Expected a single statement, found {}",
                n
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    Quoted(char),
    LineComment,
    BlockComment
}

/// Split SQL text into statements.
///
/// Comment-only fragments are dropped. Doubled quote characters inside a
/// literal are treated as escapes.
pub fn split_statements(sql: &str) -> Vec<SourceStatement> {
    let mut statements = Vec::new();
    let mut state = ScanState::Code;
    let mut start: Option<(usize, usize, usize)> = None;
    let mut line = 1;
    let mut column = 1;
    let mut chars = sql.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        let next = chars.peek().map(|&(_, c)| c);
        let mut consumed_next = false;

        match state {
            ScanState::Code => match ch {
                ';' => {
                    if let Some((begin, l, c)) = start.take() {
                        push_statement(&mut statements, &sql[begin..offset], l, c);
                    }
                }
                '-' if next == Some('-') => {
                    state = ScanState::LineComment;
                    consumed_next = true;
                }
                '/' if next == Some('*') => {
                    state = ScanState::BlockComment;
                    consumed_next = true;
                }
                '\'' | '"' | '`' => {
                    start.get_or_insert((offset, line, column));
                    state = ScanState::Quoted(ch);
                }
                '[' => {
                    start.get_or_insert((offset, line, column));
                    state = ScanState::Quoted(']');
                }
                c if c.is_whitespace() => {}
                _ => {
                    start.get_or_insert((offset, line, column));
                }
            },
            ScanState::Quoted(quote) => {
                if ch == quote {
                    if next == Some(quote) {
                        consumed_next = true;
                    } else {
                        state = ScanState::Code;
                    }
                }
            }
            ScanState::LineComment => {
                if ch == '\n' {
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment => {
                if ch == '*' && next == Some('/') {
                    state = ScanState::Code;
                    consumed_next = true;
                }
            }
        }

        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
        if consumed_next {
            chars.next();
            column += 1;
        }
    }

    if let Some((begin, l, c)) = start {
        push_statement(&mut statements, &sql[begin..], l, c);
    }

    statements
}

fn push_statement(statements: &mut Vec<SourceStatement>, text: &str, line: usize, column: usize) {
    let text = text.trim_end();
    if text.is_empty() {
        return;
    }
    statements.push(SourceStatement {
        location: StatementLocation {
            index: statements.len(),
            line,
            column
        },
        text:     text.to_string()
    });
}
