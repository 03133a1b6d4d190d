//! ALTER TABLE handler.
//!
//! Operations are applied in statement order. The first failing operation
//! ends the statement; the ones before it stay applied.

use tracing::{debug, warn};

use super::{
    Mutation, MutationDispatcher, required_child, target_table,
    table::{column_def, table_constraint}
};
use crate::{
    ast::{NodeCursor, NodeKind},
    schema::{Database, Datatype, ModelError, TableName}
};

pub(super) fn register(dispatcher: &mut MutationDispatcher) {
    dispatcher.register_mutation(Mutation::new("altertable", alter_table));
}

fn alter_table(root: NodeCursor<'_>, db: &mut Database) -> Result<(), ModelError> {
    let mut table = target_table(db, required_child(root, NodeKind::Table)?.node());
    if db.get_table_or_none(&table).is_none() {
        if root.node().flags().if_exists {
            debug!(table = %table, "table missing, IF EXISTS given");
            return Ok(());
        }
        return Err(ModelError::MissingTable { table });
    }
    for operation in root.children() {
        if let Some(renamed) = apply_operation(operation, db, &table)? {
            table = renamed;
        }
    }
    Ok(())
}

/// Apply one operation; returns the new table name after `RENAME TO`
fn apply_operation(
    operation: NodeCursor<'_>,
    db: &mut Database,
    table: &TableName
) -> Result<Option<TableName>, ModelError> {
    let node = operation.node();
    let flags = node.flags();
    match node.kind {
        NodeKind::Table => {}
        NodeKind::AddColumn => {
            let exists = db
                .get_table_or_error(table)?
                .has_column(&node.name);
            if exists && flags.if_not_exists {
                debug!(table = %table, column = %node.name, "column exists, IF NOT EXISTS given");
                return Ok(None);
            }
            let def = required_child(operation, NodeKind::ColumnDef)?;
            for constraint in column_def(def, db, table)? {
                db.add_constraint(table, constraint)?;
            }
        }
        NodeKind::DropColumn => {
            let exists = db
                .get_table_or_error(table)?
                .has_column(&node.name);
            if !exists && flags.if_exists {
                debug!(table = %table, column = %node.name, "column missing, IF EXISTS given");
                return Ok(None);
            }
            db.drop_column(table, &node.name)?;
        }
        NodeKind::RenameColumn => {
            let names = operation.identifier_names();
            let [old, new] = names.as_slice() else {
                return Err(ModelError::Integrity(format!(
                    "RENAME COLUMN carries {} identifiers",
                    names.len()
                )));
            };
            db.rename_column(table, old, new)?;
        }
        NodeKind::RenameTable => {
            let new_name = &required_child(operation, NodeKind::Table)?.node().name;
            return db.rename_table(table, new_name).map(Some);
        }
        NodeKind::AddConstraint => {
            for child in operation.children() {
                if child.node().kind == NodeKind::Unsupported {
                    warn!(table = %table, "skipping unsupported constraint: {}", child.node().name);
                    continue;
                }
                let constraint = table_constraint(child, db, table)?;
                db.add_constraint(table, constraint)?;
            }
        }
        NodeKind::DropConstraint => match db.drop_constraint(table, &node.name) {
            Err(ModelError::MissingConstraint { .. }) if flags.if_exists => {
                debug!(table = %table, constraint = %node.name, "constraint missing, IF EXISTS given");
            }
            result => {
                result?;
            }
        },
        NodeKind::DropPrimaryKey => {
            db.table_mut(table)?
                .drop_primary_key()
                .ok_or_else(|| ModelError::MissingConstraint {
                    table: table.clone(),
                    name:  "PRIMARY KEY".into()
                })?;
        }
        NodeKind::AlterColumn => alter_column(operation, db, table)?,
        _ => warn!(
            table = %table,
            "skipping unsupported ALTER TABLE operation: {}",
            node.name
        )
    }
    Ok(None)
}

fn alter_column(operation: NodeCursor<'_>, db: &mut Database, table: &TableName) -> Result<(), ModelError> {
    let node = operation.node();
    let column = node.name.as_str();
    match node.sub_kind.as_deref() {
        Some("set_not_null") => db.set_column_not_null(table, column),
        Some("drop_not_null") => db.drop_column_not_null(table, column),
        Some("set_default") => {
            let default = required_child(operation, NodeKind::Default)?;
            let expression = default.node().expression().unwrap_or_default().to_owned();
            db.set_column_default(table, column, expression)
        }
        Some("drop_default") => db.drop_column_default(table, column),
        Some("set_data_type") => {
            let datatype = required_child(operation, NodeKind::DataType)?;
            db.change_column_datatype(table, column, Datatype::parse(&datatype.node().name))
        }
        other => {
            warn!(
                table = %table,
                column,
                "skipping unsupported ALTER COLUMN operation: {}",
                other.unwrap_or("none")
            );
            Ok(())
        }
    }
}
