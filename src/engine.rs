//! Traversal engine.
//!
//! Reconstructs visit/leave events from the flat pre-order node stream. The
//! engine keeps a stack of open nodes and compares each incoming node's depth
//! with the top of the stack:
//!
//! | incoming vs. top | action                                           |
//! |------------------|--------------------------------------------------|
//! | empty stack      | push, visit                                      |
//! | deeper           | push, visit                                      |
//! | equal            | leave + pop top, push, visit                     |
//! | shallower        | leave + pop while top is deeper, then as above   |
//!
//! When the stream ends the stack is drained innermost first, so every visit
//! is matched by exactly one leave.

use std::fmt;

use thiserror::Error;

use crate::ast::{Node, NodeKind};

/// Depth sequence that cannot come from a pre-order walk
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalError {
    #[error(
        "node \"{node}\" at depth {depth} returns to an open node at depth {open_depth}, skipping a level"
    )]
    DepthGap {
        node:       String,
        depth:      usize,
        open_depth: usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Event {
    Visit,
    Leave
}

impl Event {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Visit => "visit",
            Self::Leave => "leave"
        }
    }
}

/// Callback key: lowercase node type plus event, e.g. `table_visit`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DispatchKey {
    pub kind:  NodeKind,
    pub event: Event
}

impl DispatchKey {
    pub const fn visit(kind: NodeKind) -> Self {
        Self {
            kind,
            event: Event::Visit
        }
    }

    pub const fn leave(kind: NodeKind) -> Self {
        Self {
            kind,
            event: Event::Leave
        }
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.tag(), self.event.suffix())
    }
}

/// Walk `nodes`, calling `sink` for every visit and leave event in order.
///
/// # Errors
///
/// Returns [`TraversalError::DepthGap`] when a shallower node, after the
/// deeper open nodes are closed, still sits below the remaining top. No
/// further events are emitted after the error.
///
/// # Example
///
/// ```
/// use sql_schema_linter::{
///     ast::{Node, NodeKind},
///     engine::traverse
/// };
///
/// let nodes = vec![
///     Node::new(NodeKind::Select, "", 0),
///     Node::new(NodeKind::Column, "a", 1),
///     Node::new(NodeKind::From, "", 1),
/// ];
/// let mut keys = Vec::new();
/// traverse(&nodes, |key, _| keys.push(key.to_string())).unwrap();
/// assert_eq!(
///     keys,
///     [
///         "select_visit",
///         "column_visit",
///         "column_leave",
///         "from_visit",
///         "from_leave",
///         "select_leave"
///     ]
/// );
/// ```
pub fn traverse<'a, F>(nodes: &'a [Node], mut sink: F) -> Result<(), TraversalError>
where
    F: FnMut(DispatchKey, &'a Node)
{
    let mut stack: Vec<&'a Node> = Vec::new();
    for node in nodes {
        let mut closed = false;
        while let Some(&top) = stack.last()
            && top.depth > node.depth
        {
            sink(DispatchKey::leave(top.kind), top);
            stack.pop();
            closed = true;
        }
        if let Some(&top) = stack.last() {
            if top.depth == node.depth {
                sink(DispatchKey::leave(top.kind), top);
                stack.pop();
            } else if closed && top.depth < node.depth {
                return Err(TraversalError::DepthGap {
                    node:       node.to_string(),
                    depth:      node.depth,
                    open_depth: top.depth
                });
            }
        }
        stack.push(node);
        sink(DispatchKey::visit(node.kind), node);
    }
    while let Some(top) = stack.pop() {
        sink(DispatchKey::leave(top.kind), top);
    }
    Ok(())
}

/// Collect the event sequence of `nodes`
pub fn events(nodes: &[Node]) -> Result<Vec<(DispatchKey, &Node)>, TraversalError> {
    let mut out = Vec::with_capacity(nodes.len() * 2);
    traverse(nodes, |key, node| out.push((key, node)))?;
    Ok(out)
}
