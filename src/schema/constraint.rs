//! Constraint and datatype definitions of the schema model.
//!
//! Column-level constraints are parsed before the column they belong to is
//! built, so they carry an optional `column` back-reference that is filled in
//! by [`Constraint::attach_to`] once the column exists.

use std::fmt;

use compact_str::CompactString;
use serde::Serialize;

use super::{ObjectId, TableName};

/// Discriminant of [`Constraint`], used for the one-per-kind column rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConstraintKind {
    NotNull,
    PrimaryKey,
    ForeignKey,
    Unique,
    Default,
    Check,
    Index
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotNull => write!(f, "NOT NULL"),
            Self::PrimaryKey => write!(f, "PRIMARY KEY"),
            Self::ForeignKey => write!(f, "FOREIGN KEY"),
            Self::Unique => write!(f, "UNIQUE"),
            Self::Default => write!(f, "DEFAULT"),
            Self::Check => write!(f, "CHECK"),
            Self::Index => write!(f, "INDEX")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreventNotNull {
    pub id:     ObjectId,
    pub name:   Option<CompactString>,
    pub column: Option<CompactString>
}

/// Single or composite primary key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryKey {
    pub id:      ObjectId,
    pub name:    Option<CompactString>,
    pub columns: Vec<CompactString>
}

impl PrimaryKey {
    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }
}

/// Reference from `owner(owner_columns)` to `referenced(ref_columns)`.
///
/// Registered under both participants: `owner.constraints[(owner, owner)]`
/// and `referenced.constraints[(referenced, owner)]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub id:            ObjectId,
    pub name:          Option<CompactString>,
    pub owner:         TableName,
    pub owner_columns: Vec<CompactString>,
    pub referenced:    TableName,
    pub ref_columns:   Vec<CompactString>
}

impl ForeignKey {
    pub fn involves(&self, table: &TableName) -> bool {
        &self.owner == table || &self.referenced == table
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => format!(
                "{}({}) -> {}({})",
                self.owner,
                self.owner_columns.join(", "),
                self.referenced,
                self.ref_columns.join(", ")
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueValue {
    pub id:      ObjectId,
    pub name:    Option<CompactString>,
    pub columns: Vec<CompactString>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultValue {
    pub id:         ObjectId,
    pub name:       Option<CompactString>,
    pub column:     Option<CompactString>,
    pub expression: String
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckExpression {
    pub id:         ObjectId,
    pub name:       Option<CompactString>,
    pub column:     Option<CompactString>,
    pub expression: String
}

/// Named SQL index (not to be confused with the lookup index)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlIndex {
    pub id:      ObjectId,
    pub name:    CompactString,
    pub columns: Vec<CompactString>,
    pub unique:  bool
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Constraint {
    PreventNotNull(PreventNotNull),
    PrimaryKey(PrimaryKey),
    ForeignKey(ForeignKey),
    UniqueValue(UniqueValue),
    DefaultValue(DefaultValue),
    CheckExpression(CheckExpression),
    Index(SqlIndex)
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Self::PreventNotNull(_) => ConstraintKind::NotNull,
            Self::PrimaryKey(_) => ConstraintKind::PrimaryKey,
            Self::ForeignKey(_) => ConstraintKind::ForeignKey,
            Self::UniqueValue(_) => ConstraintKind::Unique,
            Self::DefaultValue(_) => ConstraintKind::Default,
            Self::CheckExpression(_) => ConstraintKind::Check,
            Self::Index(_) => ConstraintKind::Index
        }
    }

    pub fn id(&self) -> ObjectId {
        match self {
            Self::PreventNotNull(c) => c.id,
            Self::PrimaryKey(c) => c.id,
            Self::ForeignKey(c) => c.id,
            Self::UniqueValue(c) => c.id,
            Self::DefaultValue(c) => c.id,
            Self::CheckExpression(c) => c.id,
            Self::Index(c) => c.id
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::PreventNotNull(c) => c.name.as_deref(),
            Self::PrimaryKey(c) => c.name.as_deref(),
            Self::ForeignKey(c) => c.name.as_deref(),
            Self::UniqueValue(c) => c.name.as_deref(),
            Self::DefaultValue(c) => c.name.as_deref(),
            Self::CheckExpression(c) => c.name.as_deref(),
            Self::Index(c) => Some(c.name.as_str())
        }
    }

    /// Delayed set of the column back-reference.
    ///
    /// Multi-column constraints get the column appended to their column list
    /// when it is not listed yet.
    pub fn attach_to(&mut self, column: &str) {
        let column = CompactString::from(column);
        match self {
            Self::PreventNotNull(c) => c.column = Some(column),
            Self::DefaultValue(c) => c.column = Some(column),
            Self::CheckExpression(c) => c.column = Some(column),
            Self::PrimaryKey(PrimaryKey { columns, .. })
            | Self::UniqueValue(UniqueValue { columns, .. })
            | Self::Index(SqlIndex { columns, .. }) => {
                if !columns.contains(&column) {
                    columns.push(column);
                }
            }
            Self::ForeignKey(fk) => {
                if !fk.owner_columns.contains(&column) {
                    fk.owner_columns.push(column);
                }
            }
        }
    }

    /// Column this constraint was attached to, for single-column constraints
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::PreventNotNull(c) => c.column.as_deref(),
            Self::DefaultValue(c) => c.column.as_deref(),
            Self::CheckExpression(c) => c.column.as_deref(),
            _ => None
        }
    }

    /// Rename a column reference inside this constraint
    pub fn rename_column(&mut self, old: &str, new: &str) {
        let rename = |name: &mut CompactString| {
            if name.as_str() == old {
                *name = CompactString::from(new);
            }
        };
        match self {
            Self::PreventNotNull(c) => c.column.iter_mut().for_each(rename),
            Self::DefaultValue(c) => c.column.iter_mut().for_each(rename),
            Self::CheckExpression(c) => c.column.iter_mut().for_each(rename),
            Self::PrimaryKey(PrimaryKey { columns, .. })
            | Self::UniqueValue(UniqueValue { columns, .. })
            | Self::Index(SqlIndex { columns, .. }) => columns.iter_mut().for_each(rename),
            Self::ForeignKey(fk) => fk.owner_columns.iter_mut().for_each(rename)
        }
    }
}

/// Column datatype: a type name plus its literal arguments.
///
/// `VARCHAR(20)` is `("VARCHAR", ["20"])`, `NUMERIC(10, 2)` is
/// `("NUMERIC", ["10", "2"])`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Datatype {
    pub name: CompactString,
    pub args: Vec<CompactString>
}

impl Datatype {
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new()
        }
    }

    /// Parse the rendered form of a datatype
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let Some(open) = text.find('(') else {
            return Self::new(text.to_uppercase());
        };
        let close = text.rfind(')').filter(|&c| c > open).unwrap_or(text.len());
        let name = text[..open].trim().to_uppercase();
        let args = text[open + 1..close]
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(CompactString::from)
            .collect();
        Self {
            name: name.into(),
            args
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}({})", self.name, self.args.join(", "))
        }
    }
}
