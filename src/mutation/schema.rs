use tracing::debug;

use super::{Mutation, MutationDispatcher, required_child};
use crate::{
    ast::{NodeCursor, NodeKind},
    schema::{Database, ModelError}
};

pub(super) fn register(dispatcher: &mut MutationDispatcher) {
    dispatcher.register_mutation(Mutation::new("create_schema", create_schema));
    dispatcher.register_mutation(Mutation::new("drop_schema", drop_schema));
}

fn create_schema(root: NodeCursor<'_>, db: &mut Database) -> Result<(), ModelError> {
    let name = &required_child(root, NodeKind::Schema)?.node().name;
    if root.node().flags().if_not_exists && db.schema(name).is_some() {
        debug!(schema = %name, "schema exists, IF NOT EXISTS given");
        return Ok(());
    }
    db.create_schema(name)?;
    Ok(())
}

fn drop_schema(root: NodeCursor<'_>, db: &mut Database) -> Result<(), ModelError> {
    let flags = root.node().flags();
    for schema in root.children_of_kind(NodeKind::Schema) {
        let name = &schema.node().name;
        if flags.if_exists && db.schema(name).is_none() {
            debug!(schema = %name, "schema missing, IF EXISTS given");
            continue;
        }
        db.drop_schema(name, flags.cascade)?;
    }
    Ok(())
}
