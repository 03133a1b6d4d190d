//! CREATE TABLE / DROP TABLE handlers and the column and constraint
//! builders shared with ALTER TABLE.

use tracing::{debug, warn};

use super::{
    Mutation, MutationDispatcher, constraint_name, index::generated_index_name,
    required_child, target_table
};
use crate::{
    ast::{NodeCursor, NodeKind},
    schema::{
        CheckExpression, Constraint, Database, Datatype, DefaultValue, ForeignKey, ModelError,
        PreventNotNull, PrimaryKey, SqlIndex, TableName, UniqueValue
    }
};

pub(super) fn register(dispatcher: &mut MutationDispatcher) {
    dispatcher.register_mutation(Mutation::new("create_table", create_table));
    dispatcher.register_mutation(Mutation::new("drop_table", drop_table));
}

fn create_table(root: NodeCursor<'_>, db: &mut Database) -> Result<(), ModelError> {
    let target = target_table(db, required_child(root, NodeKind::Table)?.node());
    if root.node().flags().if_not_exists && db.get_table_or_none(&target).is_some() {
        debug!(table = %target, "table exists, IF NOT EXISTS given");
        return Ok(());
    }
    let table = db.create_table(Some(&target.schema), &target.table)?;
    if let Err(err) = build_table(root, db, &table) {
        if let Err(rollback) = db.delete_table(&table, true) {
            warn!(table = %table, error = %rollback, "could not roll back partially created table");
        }
        return Err(err);
    }
    Ok(())
}

/// Columns first, then the constraints that need them
fn build_table(root: NodeCursor<'_>, db: &mut Database, table: &TableName) -> Result<(), ModelError> {
    let mut deferred = Vec::new();
    for child in root.children() {
        match child.node().kind {
            NodeKind::ColumnDef => deferred.extend(column_def(child, db, table)?),
            NodeKind::PrimaryKey
            | NodeKind::Unique
            | NodeKind::ForeignKey
            | NodeKind::Check
            | NodeKind::Index => deferred.push(table_constraint(child, db, table)?),
            NodeKind::Unsupported => {
                warn!(table = %table, "skipping unsupported table element: {}", child.node().name)
            }
            _ => {}
        }
    }
    for constraint in deferred {
        db.add_constraint(table, constraint)?;
    }
    Ok(())
}

/// Build a column from a `ColumnDef` subtree and add it to `table`.
///
/// NOT NULL, DEFAULT and CHECK are collected before the column exists and
/// get their column back-reference when it is built. PRIMARY KEY, UNIQUE
/// and REFERENCES involve the table or another table, so they are returned
/// for the caller to add once every column is in place.
pub(super) fn column_def(
    def: NodeCursor<'_>,
    db: &mut Database,
    table: &TableName
) -> Result<Vec<Constraint>, ModelError> {
    let name = def.node().name.clone();
    let datatype = def
        .child_of_kind(NodeKind::DataType)
        .map(|d| Datatype::parse(&d.node().name))
        .unwrap_or_else(|| Datatype::new("UNKNOWN"));

    let mut inline = Vec::new();
    let mut deferred = Vec::new();
    for option in def.children() {
        let node = option.node();
        let named = constraint_name(node);
        match node.kind {
            NodeKind::NotNull => inline.push(Constraint::PreventNotNull(PreventNotNull {
                id:     db.allocate_id(),
                name:   named,
                column: None
            })),
            NodeKind::Default => inline.push(Constraint::DefaultValue(DefaultValue {
                id:         db.allocate_id(),
                name:       named,
                column:     None,
                expression: node.expression().unwrap_or_default().to_owned()
            })),
            NodeKind::Check => inline.push(Constraint::CheckExpression(CheckExpression {
                id:         db.allocate_id(),
                name:       named,
                column:     None,
                expression: node.expression().unwrap_or_default().to_owned()
            })),
            NodeKind::PrimaryKey => deferred.push(Constraint::PrimaryKey(PrimaryKey {
                id:      db.allocate_id(),
                name:    named,
                columns: vec![name.clone()]
            })),
            NodeKind::Unique => deferred.push(Constraint::UniqueValue(UniqueValue {
                id:      db.allocate_id(),
                name:    named,
                columns: vec![name.clone()]
            })),
            NodeKind::Reference => {
                let referenced = required_child(option, NodeKind::Table)?;
                deferred.push(Constraint::ForeignKey(ForeignKey {
                    id:            db.allocate_id(),
                    name:          named,
                    owner:         table.clone(),
                    owner_columns: vec![name.clone()],
                    referenced:    target_table(db, referenced.node()),
                    ref_columns:   option.identifier_names()
                }));
            }
            _ => {}
        }
    }
    db.add_column_with(table, &name, datatype, inline)?;
    Ok(deferred)
}

/// Build a table-level constraint: PRIMARY KEY, UNIQUE, FOREIGN KEY, CHECK
/// or INDEX.
pub(super) fn table_constraint(
    node: NodeCursor<'_>,
    db: &mut Database,
    table: &TableName
) -> Result<Constraint, ModelError> {
    let name = constraint_name(node.node());
    let columns = node.identifier_names();
    let constraint = match node.node().kind {
        NodeKind::PrimaryKey => Constraint::PrimaryKey(PrimaryKey {
            id: db.allocate_id(),
            name,
            columns
        }),
        NodeKind::Unique => Constraint::UniqueValue(UniqueValue {
            id: db.allocate_id(),
            name,
            columns
        }),
        NodeKind::ForeignKey => {
            let reference = required_child(node, NodeKind::Reference)?;
            let referenced = required_child(reference, NodeKind::Table)?;
            Constraint::ForeignKey(ForeignKey {
                id: db.allocate_id(),
                name,
                owner: table.clone(),
                owner_columns: columns,
                referenced: target_table(db, referenced.node()),
                ref_columns: reference.identifier_names()
            })
        }
        NodeKind::Check => Constraint::CheckExpression(CheckExpression {
            id: db.allocate_id(),
            name,
            column: None,
            expression: node.node().expression().unwrap_or_default().to_owned()
        }),
        NodeKind::Index => Constraint::Index(SqlIndex {
            id:      db.allocate_id(),
            name:    name.unwrap_or_else(|| generated_index_name(table, &columns)),
            columns,
            unique:  false
        }),
        _ => {
            return Err(ModelError::UnsupportedElement {
                table:   table.clone(),
                element: node.node().name.to_string()
            });
        }
    };
    Ok(constraint)
}

fn drop_table(root: NodeCursor<'_>, db: &mut Database) -> Result<(), ModelError> {
    let flags = root.node().flags();
    for child in root.children_of_kind(NodeKind::Table) {
        let table = target_table(db, child.node());
        if flags.if_exists && db.get_table_or_none(&table).is_none() {
            debug!(table = %table, "table missing, IF EXISTS given");
            continue;
        }
        db.delete_table(&table, flags.cascade)?;
    }
    Ok(())
}
