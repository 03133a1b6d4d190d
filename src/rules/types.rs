//! Type definitions for the rule system.
//!
//! - [`Severity`] - Report severity levels (Info, Warning, Error)
//! - [`RuleCategory`] - Rule categories (Schema, Performance, Style, Security)
//! - [`MessageTemplate`] - Message key, template text and default severity
//! - [`RuleReport`] - A materialized report with its node and statement

use compact_str::CompactString;
use serde::Serialize;

use crate::{ast::NodeKind, source::StatementLocation};

/// Severity level of a report.
///
/// Ordered from lowest to highest severity for sorting purposes.
/// Exit codes are determined by the highest severity report found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// Informational suggestion, does not affect exit code
    Info,
    /// Warning that may indicate a problem (exit code 1)
    Warning,
    /// Critical issue that must be addressed (exit code 2)
    Error
}

impl Severity {
    /// Parse a configured severity name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR")
        }
    }
}

/// Category of a rule for grouping and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuleCategory {
    /// Rules that check statements against the schema model
    Schema,
    /// Rules that detect potential performance issues
    Performance,
    /// Rules that enforce coding style conventions
    Style,
    /// Rules that identify dangerous operations
    Security
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema => write!(f, "Schema"),
            Self::Performance => write!(f, "Performance"),
            Self::Style => write!(f, "Style"),
            Self::Security => write!(f, "Security")
        }
    }
}

/// Message a rule can report under `key`.
///
/// `template` may contain `{name}` placeholders, filled from the
/// substitutions passed with the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTemplate {
    pub key:      &'static str,
    pub template: &'static str,
    pub severity: Severity
}

impl MessageTemplate {
    pub const fn new(key: &'static str, template: &'static str, severity: Severity) -> Self {
        Self {
            key,
            template,
            severity
        }
    }
}

/// Node a report points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportNode {
    pub kind: NodeKind,
    pub name: CompactString
}

/// A materialized rule report.
#[derive(Debug, Clone, Serialize)]
pub struct RuleReport {
    /// Rule identifier (e.g., "SCHEMA001")
    pub rule_id:               &'static str,
    /// Message key the report was created under
    pub rule_name:             &'static str,
    pub rule_class_name:       &'static str,
    pub rule_class_file:       &'static str,
    pub category:              RuleCategory,
    pub severity:              Severity,
    /// Template with placeholders substituted
    pub message:               String,
    pub node:                  Option<ReportNode>,
    /// Location of the statement the report belongs to
    pub statement:             Option<StatementLocation>,
    /// First line of the statement, when the rule asks for a code preview
    pub preview:               Option<String>,
    pub code_preview:          bool,
    pub underline_entire_line: bool
}
