//! DDL mutation dispatcher.
//!
//! After a statement is linted its effect is applied to the schema model.
//! Statements whose root is a modifying type (`Create`, `Drop`,
//! `AlterTable`, `AlterColumn`, `AlterIndex`, `Insert`, `Update`, `Delete`)
//! are routed to the handler registered under the statement's key:
//!
//! | Statement                  | Key            |
//! |----------------------------|----------------|
//! | `CREATE TABLE t (...)`     | `create_table` |
//! | `DROP INDEX ix`            | `drop_index`   |
//! | `ALTER TABLE t ...`        | `altertable`   |
//! | `INSERT INTO t ...`        | `insert`       |
//!
//! A modifying statement without a handler is skipped with a warning.
//! Handlers walk the statement tree themselves through a [`NodeCursor`]
//! positioned on the root.

mod alter;
mod data;
mod index;
mod schema;
mod table;

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    ast::{Node, NodeCursor, NodeKind, StatementTree},
    schema::{Database, ModelError, TableName},
    source::StatementLocation
};

/// Handler applying one statement kind to the model
pub type MutationFn = fn(NodeCursor<'_>, &mut Database) -> Result<(), ModelError>;

/// Loader exposed by a mutation module
pub type MutationModule = fn(&mut MutationDispatcher);

/// Mutation modules loaded by default
pub const BUILTIN_MODULES: &[MutationModule] = &[
    schema::register,
    table::register,
    index::register,
    alter::register,
    data::register
];

/// A handler together with the statement key it declares
#[derive(Debug, Clone, Copy)]
pub struct Mutation {
    pub key:   &'static str,
    pub apply: MutationFn
}

impl Mutation {
    pub const fn new(key: &'static str, apply: MutationFn) -> Self {
        Self { key, apply }
    }
}

/// Result of dispatching one statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    /// Modifying statement with no registered handler
    Unsupported,
    NotModifying
}

/// A statement whose mutation failed; the run continues without it
#[derive(Debug, Clone, Serialize)]
pub struct MutationFailure {
    pub statement: StatementLocation,
    pub key:       String,
    pub message:   String
}

/// Statement-key to handler table
#[derive(Debug, Default)]
pub struct MutationDispatcher {
    handlers: IndexMap<&'static str, MutationFn>
}

impl MutationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with [`BUILTIN_MODULES`] loaded
    pub fn with_builtins() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.load_modules(BUILTIN_MODULES);
        dispatcher
    }

    pub fn load_modules(&mut self, modules: &[MutationModule]) {
        for register in modules {
            register(self);
        }
    }

    /// Register a handler under its declared key.
    ///
    /// A second handler for a key already taken is dropped with a warning.
    pub fn register_mutation(&mut self, mutation: Mutation) -> bool {
        if self.handlers.contains_key(mutation.key) {
            warn!(
                key = mutation.key,
                "mutation handler already registered, dropping the new one"
            );
            return false;
        }
        self.handlers.insert(mutation.key, mutation.apply);
        true
    }

    pub fn handles(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    /// Apply `tree` to `db` through the handler of its statement key.
    ///
    /// # Errors
    ///
    /// Returns the handler's [`ModelError`]. Only
    /// [`ModelError::Integrity`] is meant to stop the run.
    pub fn dispatch(&self, tree: &StatementTree, db: &mut Database) -> Result<Outcome, ModelError> {
        let class = tree.class();
        if !class.is_modifying() {
            return Ok(Outcome::NotModifying);
        }
        let key = class.key();
        let Some(apply) = self.handlers.get(key.as_str()) else {
            warn!("`{}` is not supported", key);
            return Ok(Outcome::Unsupported);
        };
        let Some(root) = tree.cursor() else {
            return Ok(Outcome::NotModifying);
        };
        debug!(key = %key, "applying mutation");
        apply(root, db)?;
        Ok(Outcome::Applied)
    }
}

/// Qualified name of the relation a `Table` node refers to
pub(crate) fn target_table(db: &Database, node: &Node) -> TableName {
    match node.table_ref() {
        Some(target) => db.table_name(target.schema.as_deref(), &target.name),
        None => db.table_name(None, &node.name)
    }
}

/// The required child of `parent`, or an integrity error naming it
pub(crate) fn required_child<'a>(
    parent: NodeCursor<'a>,
    kind: NodeKind
) -> Result<NodeCursor<'a>, ModelError> {
    parent.child_of_kind(kind).ok_or_else(|| {
        ModelError::Integrity(format!("{} node has no {} child", parent.node().kind, kind))
    })
}

/// Explicit constraint name; the lowering leaves unnamed ones empty
pub(crate) fn constraint_name(node: &Node) -> Option<CompactString> {
    (!node.name.is_empty()).then(|| node.name.clone())
}
