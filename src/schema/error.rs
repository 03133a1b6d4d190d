use compact_str::CompactString;
use thiserror::Error;

use super::{ConstraintKind, IndexKey, TableName};

/// Failure of a schema model lookup or mutation.
///
/// Missing-entity variants name the entity and the lookup key it was
/// expected under. [`ModelError::Integrity`] marks a broken model invariant
/// and is the only variant that aborts a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Schema \"{schema}\" does not exist")]
    MissingSchema { schema: CompactString },

    #[error("Table \"{table}\" does not exist")]
    MissingTable { table: TableName },

    #[error("Column \"{column}\" does not exist in table \"{table}\"")]
    MissingColumn {
        table:  TableName,
        column: CompactString
    },

    #[error("Index \"{index}\" does not exist in schema \"{schema}\"")]
    MissingIndex {
        schema: CompactString,
        index:  CompactString
    },

    #[error("Constraint \"{name}\" does not exist on table \"{table}\"")]
    MissingConstraint {
        table: TableName,
        name:  CompactString
    },

    #[error("Schema \"{schema}\" already exists")]
    SchemaAlreadyExists { schema: CompactString },

    #[error("Table \"{table}\" already exists")]
    TableAlreadyExists { table: TableName },

    #[error("Column \"{column}\" already exists in table \"{table}\"")]
    ColumnAlreadyExists {
        table:  TableName,
        column: CompactString
    },

    #[error("Index \"{index}\" already exists in schema \"{schema}\"")]
    IndexAlreadyExists {
        schema: CompactString,
        index:  CompactString
    },

    #[error("Column \"{column}\" of table \"{table}\" already has a {kind} constraint")]
    DuplicateConstraint {
        table:  TableName,
        column: CompactString,
        kind:   ConstraintKind
    },

    #[error("Table \"{table}\" already has a primary key")]
    DuplicatePrimaryKey { table: TableName },

    #[error("{object} cannot be dropped without CASCADE: {dependents}")]
    HasDependents { object: String, dependents: String },

    #[error("Column \"{column}\" of table \"{table}\" is used by {used_by}")]
    ColumnInUse {
        table:   TableName,
        column:  CompactString,
        used_by: String
    },

    #[error(
        "Foreign key on \"{table}\" lists {owner_columns} column(s) but references {ref_columns}"
    )]
    ForeignKeyArity {
        table:         TableName,
        owner_columns: usize,
        ref_columns:   usize
    },

    #[error("Table \"{table}\" element is not supported: {element}")]
    UnsupportedElement { table: TableName, element: String },

    #[error("Schema model integrity violation: {0}")]
    Integrity(String)
}

impl ModelError {
    /// Broken invariants stop the run; everything else fails one mutation
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }

    /// Lookup key a missing entity was expected under
    pub fn missing_key(&self) -> Option<IndexKey> {
        match self {
            Self::MissingSchema { schema } => Some(IndexKey::schema(schema)),
            Self::MissingTable { table } => Some(table.index_key()),
            Self::MissingColumn { table, column } => {
                Some(IndexKey::column(&table.schema, &table.table, column))
            }
            _ => None
        }
    }
}
