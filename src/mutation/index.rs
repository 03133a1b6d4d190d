use compact_str::{CompactString, format_compact};
use tracing::debug;

use super::{Mutation, MutationDispatcher, required_child, target_table};
use crate::{
    ast::{NodeCursor, NodeKind},
    schema::{Database, ModelError, SqlIndex, TableName}
};

pub(super) fn register(dispatcher: &mut MutationDispatcher) {
    dispatcher.register_mutation(Mutation::new("create_index", create_index));
    dispatcher.register_mutation(Mutation::new("drop_index", drop_index));
    dispatcher.register_mutation(Mutation::new("alterindex", alter_index));
}

/// Name given to an index declared without one: `<table>_<columns>_idx`
pub(crate) fn generated_index_name(table: &TableName, columns: &[CompactString]) -> CompactString {
    format_compact!("{}_{}_idx", table.table, columns.join("_"))
}

fn create_index(root: NodeCursor<'_>, db: &mut Database) -> Result<(), ModelError> {
    let flags = root.node().flags();
    let table = target_table(db, required_child(root, NodeKind::Table)?.node());
    let columns = root.identifier_names();
    let name = match root.node().name.as_str() {
        "" => generated_index_name(&table, &columns),
        named => named.into()
    };
    if flags.if_not_exists && db.find_index(&table.schema, &name).is_some() {
        debug!(index = %name, "index exists, IF NOT EXISTS given");
        return Ok(());
    }
    let index = SqlIndex {
        id: db.allocate_id(),
        name,
        columns,
        unique: flags.unique
    };
    db.add_index(&table, index)
}

fn drop_index(root: NodeCursor<'_>, db: &mut Database) -> Result<(), ModelError> {
    let flags = root.node().flags();
    for child in root.children_of_kind(NodeKind::Index) {
        let node = child.node();
        let schema = db
            .resolve_schema(node.table_ref().and_then(|t| t.schema.as_deref()))
            .to_owned();
        match db.drop_index(&schema, &node.name) {
            Err(ModelError::MissingIndex { .. }) if flags.if_exists => {
                debug!(index = %node.name, "index missing, IF EXISTS given");
            }
            result => {
                result?;
            }
        }
    }
    Ok(())
}

/// `ALTER INDEX old RENAME TO new`
fn alter_index(root: NodeCursor<'_>, db: &mut Database) -> Result<(), ModelError> {
    let node = root.node();
    let schema = db
        .resolve_schema(node.table_ref().and_then(|t| t.schema.as_deref()))
        .to_owned();
    let renamed = required_child(root, NodeKind::Index)?;
    db.rename_index(&schema, &node.name, &renamed.node().name)
}
