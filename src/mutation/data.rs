//! Data statements: modifying roots that leave the schema model unchanged.

use super::{Mutation, MutationDispatcher};
use crate::{
    ast::NodeCursor,
    schema::{Database, ModelError}
};

pub(super) fn register(dispatcher: &mut MutationDispatcher) {
    for key in ["insert", "update", "delete"] {
        dispatcher.register_mutation(Mutation::new(key, unchanged));
    }
}

fn unchanged(_root: NodeCursor<'_>, _db: &mut Database) -> Result<(), ModelError> {
    Ok(())
}
