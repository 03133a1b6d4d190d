//! Owned, flat view of a parsed statement.
//!
//! The traversal engine and the rules never see `sqlparser` types. Each
//! statement is lowered once into a pre-order list of [`Node`]s, each tagged
//! with a [`NodeKind`], a display name and its depth below the statement
//! root. Leave events are not stored; the engine reconstructs them from the
//! depths.
//!
//! ```text
//! SELECT a FROM t WHERE b = 1
//!
//! depth  kind     name
//! 0      Select
//! 1      Column   a
//! 1      From
//! 2      Table    t
//! 1      Where
//! 2      Binary   =
//! 3      Column   b
//! 3      Literal  1
//! ```
//!
//! Node-specific details that rules and mutation handlers need (table and
//! column references, statement flags) travel in [`NodeData`].

mod lower;

use std::{collections::BTreeSet, fmt};

use compact_str::CompactString;
pub use lower::lower_statement;
use serde::Serialize;

/// Type tag of a [`Node`].
///
/// [`NodeKind::tag`] gives the lowercase form used in dispatch keys
/// (`table_visit`) and statement classification tags (`create_table`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeKind {
    Select,
    SetOperation,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    AlterTable,
    AlterColumn,
    AlterIndex,
    Command,
    Truncate,
    With,
    Cte,
    From,
    Join,
    Where,
    Group,
    Having,
    Order,
    Values,
    Assignment,
    Table,
    Subquery,
    Column,
    Star,
    Alias,
    Literal,
    Function,
    Binary,
    Unary,
    Between,
    InList,
    Exists,
    Cast,
    Expression,
    Schema,
    ColumnDef,
    Identifier,
    DataType,
    NotNull,
    PrimaryKey,
    ForeignKey,
    Reference,
    Unique,
    Default,
    Check,
    Index,
    AddColumn,
    DropColumn,
    RenameColumn,
    RenameTable,
    AddConstraint,
    DropConstraint,
    DropPrimaryKey,
    Unsupported
}

impl NodeKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::SetOperation => "setoperation",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Create => "create",
            Self::Drop => "drop",
            Self::AlterTable => "altertable",
            Self::AlterColumn => "altercolumn",
            Self::AlterIndex => "alterindex",
            Self::Command => "command",
            Self::Truncate => "truncate",
            Self::With => "with",
            Self::Cte => "cte",
            Self::From => "from",
            Self::Join => "join",
            Self::Where => "where",
            Self::Group => "group",
            Self::Having => "having",
            Self::Order => "order",
            Self::Values => "values",
            Self::Assignment => "assignment",
            Self::Table => "table",
            Self::Subquery => "subquery",
            Self::Column => "column",
            Self::Star => "star",
            Self::Alias => "alias",
            Self::Literal => "literal",
            Self::Function => "function",
            Self::Binary => "binary",
            Self::Unary => "unary",
            Self::Between => "between",
            Self::InList => "inlist",
            Self::Exists => "exists",
            Self::Cast => "cast",
            Self::Expression => "expression",
            Self::Schema => "schema",
            Self::ColumnDef => "columndef",
            Self::Identifier => "identifier",
            Self::DataType => "datatype",
            Self::NotNull => "notnull",
            Self::PrimaryKey => "primarykey",
            Self::ForeignKey => "foreignkey",
            Self::Reference => "reference",
            Self::Unique => "unique",
            Self::Default => "default",
            Self::Check => "check",
            Self::Index => "index",
            Self::AddColumn => "addcolumn",
            Self::DropColumn => "dropcolumn",
            Self::RenameColumn => "renamecolumn",
            Self::RenameTable => "renametable",
            Self::AddConstraint => "addconstraint",
            Self::DropConstraint => "dropconstraint",
            Self::DropPrimaryKey => "dropprimarykey",
            Self::Unsupported => "unsupported"
        }
    }

    /// Statement roots that change the schema model
    pub fn is_modifying_root(self) -> bool {
        matches!(
            self,
            Self::Create
                | Self::Drop
                | Self::AlterTable
                | Self::AlterColumn
                | Self::AlterIndex
                | Self::Insert
                | Self::Update
                | Self::Delete
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Reference to a (possibly schema-qualified) relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRef {
    pub schema: Option<CompactString>,
    pub name:   CompactString,
    pub alias:  Option<CompactString>
}

impl TableRef {
    /// Name the relation is visible under inside its query scope
    pub fn visible_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Column reference, optionally qualified by a table name or alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRef {
    pub qualifier: Option<CompactString>,
    pub name:      CompactString
}

/// Derived table or scalar subquery
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SubqueryInfo {
    pub alias:    Option<CompactString>,
    /// Output column names of the subquery's projection
    pub columns:  Vec<CompactString>,
    /// True when the projection contains `*`, so `columns` is incomplete
    pub wildcard: bool
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatementFlags {
    pub if_exists:     bool,
    pub if_not_exists: bool,
    pub cascade:       bool,
    pub unique:        bool
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum NodeData {
    #[default]
    None,
    Table(TableRef),
    Column(ColumnRef),
    Subquery(SubqueryInfo),
    Flags(StatementFlags),
    Expression(String)
}

/// One element of the flat pre-order node stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub kind:     NodeKind,
    pub name:     CompactString,
    pub depth:    usize,
    pub sub_kind: Option<CompactString>,
    pub data:     NodeData
}

impl Node {
    pub fn new(kind: NodeKind, name: impl Into<CompactString>, depth: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            depth,
            sub_kind: None,
            data: NodeData::None
        }
    }

    pub fn with_sub_kind(mut self, sub_kind: impl Into<CompactString>) -> Self {
        self.sub_kind = Some(sub_kind.into());
        self
    }

    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = data;
        self
    }

    pub fn type_tag(&self) -> &'static str {
        self.kind.tag()
    }

    pub fn table_ref(&self) -> Option<&TableRef> {
        match &self.data {
            NodeData::Table(t) => Some(t),
            _ => None
        }
    }

    pub fn column_ref(&self) -> Option<&ColumnRef> {
        match &self.data {
            NodeData::Column(c) => Some(c),
            _ => None
        }
    }

    pub fn subquery(&self) -> Option<&SubqueryInfo> {
        match &self.data {
            NodeData::Subquery(s) => Some(s),
            _ => None
        }
    }

    pub fn flags(&self) -> StatementFlags {
        match &self.data {
            NodeData::Flags(f) => *f,
            _ => StatementFlags::default()
        }
    }

    pub fn expression(&self) -> Option<&str> {
        match &self.data {
            NodeData::Expression(e) => Some(e),
            _ => None
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} {}", self.kind, self.name)
        }
    }
}

/// Root type and kind of a statement, e.g. `Create` + `table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementClass {
    pub root: NodeKind,
    pub kind: Option<CompactString>
}

impl StatementClass {
    /// Handler key: `root_kind`, or `root` alone when there is no kind
    pub fn key(&self) -> String {
        match &self.kind {
            Some(kind) => format!("{}_{}", self.root.tag(), kind),
            None => self.root.tag().to_string()
        }
    }

    /// Classification tags matched against rule restriction sets:
    /// the root tag, `root_kind` and the bare kind
    pub fn tags(&self) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        tags.insert(self.root.tag().to_string());
        if let Some(kind) = &self.kind {
            tags.insert(format!("{}_{}", self.root.tag(), kind));
            tags.insert(kind.to_string());
        }
        tags
    }

    pub fn is_modifying(&self) -> bool {
        self.root.is_modifying_root()
    }
}

/// A lowered statement: the pre-order node list rooted at index 0
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatementTree {
    pub nodes: Vec<Node>
}

impl StatementTree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn class(&self) -> StatementClass {
        match self.root() {
            Some(root) => StatementClass {
                root: root.kind,
                kind: root.sub_kind.clone()
            },
            None => StatementClass {
                root: NodeKind::Command,
                kind: None
            }
        }
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Cursor positioned on the root node
    pub fn cursor(&self) -> Option<NodeCursor<'_>> {
        self.root().map(|_| NodeCursor { tree: self, index: 0 })
    }

    /// Index one past the last descendant of `index`
    fn subtree_end(&self, index: usize) -> usize {
        let Some(parent) = self.nodes.get(index) else {
            return index;
        };
        self.nodes[index + 1..]
            .iter()
            .position(|n| n.depth <= parent.depth)
            .map_or(self.nodes.len(), |offset| index + 1 + offset)
    }
}

/// Structural walk over a [`StatementTree`] for mutation handlers
#[derive(Debug, Clone, Copy)]
pub struct NodeCursor<'a> {
    tree:  &'a StatementTree,
    index: usize
}

impl<'a> NodeCursor<'a> {
    pub fn node(&self) -> &'a Node {
        &self.tree.nodes[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The node and all of its descendants, in pre-order
    pub fn subtree(&self) -> &'a [Node] {
        &self.tree.nodes[self.index..self.tree.subtree_end(self.index)]
    }

    pub fn children(&self) -> Vec<NodeCursor<'a>> {
        let depth = self.node().depth;
        let tree = self.tree;
        (self.index + 1..tree.subtree_end(self.index))
            .filter(|&i| tree.nodes[i].depth == depth + 1)
            .map(|index| NodeCursor { tree, index })
            .collect()
    }

    pub fn children_of_kind(&self, kind: NodeKind) -> Vec<NodeCursor<'a>> {
        self.children()
            .into_iter()
            .filter(|c| c.node().kind == kind)
            .collect()
    }

    pub fn child_of_kind(&self, kind: NodeKind) -> Option<NodeCursor<'a>> {
        self.children().into_iter().find(|c| c.node().kind == kind)
    }

    /// Names of the `Identifier` children
    pub fn identifier_names(&self) -> Vec<CompactString> {
        self.children_of_kind(NodeKind::Identifier)
            .into_iter()
            .map(|c| c.node().name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> StatementTree {
        StatementTree::new(vec![
            Node::new(NodeKind::Create, "t", 0).with_sub_kind("table"),
            Node::new(NodeKind::Table, "t", 1),
            Node::new(NodeKind::ColumnDef, "a", 1),
            Node::new(NodeKind::Identifier, "a", 2),
            Node::new(NodeKind::DataType, "INT", 2),
            Node::new(NodeKind::PrimaryKey, "", 1),
            Node::new(NodeKind::Identifier, "a", 2),
        ])
    }

    #[test]
    fn test_class_tags() {
        let class = tree().class();
        assert_eq!(class.key(), "create_table");
        let tags: Vec<String> = class.tags().into_iter().collect();
        assert_eq!(tags, vec!["create", "create_table", "table"]);
        assert!(class.is_modifying());
    }

    #[test]
    fn test_cursor_children_skip_grandchildren() {
        let tree = tree();
        let root = tree.cursor().unwrap();
        let kinds: Vec<NodeKind> = root.children().iter().map(|c| c.node().kind).collect();
        assert_eq!(kinds, vec![NodeKind::Table, NodeKind::ColumnDef, NodeKind::PrimaryKey]);

        let column = root.child_of_kind(NodeKind::ColumnDef).unwrap();
        assert_eq!(column.subtree().len(), 3);
        assert_eq!(column.identifier_names(), vec![CompactString::from("a")]);
    }

    #[test]
    fn test_empty_tree_is_command() {
        let tree = StatementTree::default();
        assert!(tree.cursor().is_none());
        assert_eq!(tree.class().root, NodeKind::Command);
    }
}
