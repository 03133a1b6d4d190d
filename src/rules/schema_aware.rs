//! Rules that check statements against the schema model.

use std::collections::HashSet;

use compact_str::CompactString;

use super::{
    MessageTemplate, Rule, RuleCategory, RuleContext, RuleDefinition, RuleRegistry, Severity
};
use crate::{
    ast::{ColumnRef, Node, NodeKind, TableRef},
    engine::{DispatchKey, Event},
    schema::{Database, TableName}
};

pub fn register(registry: &mut RuleRegistry) {
    registry.register_rule::<UnknownTable>();
    registry.register_rule::<UnknownColumn>();
    registry.register_rule::<UnknownAlias>();
    registry.register_rule::<TableAlreadyExists>();
}

const QUERY_TAGS: &[&str] = &["select", "setoperation"];

/// Events the scope tracker needs to follow a query
const SCOPE_CALLBACKS: &[DispatchKey] = &[
    DispatchKey::visit(NodeKind::Select),
    DispatchKey::leave(NodeKind::Select),
    DispatchKey::visit(NodeKind::Cte),
    DispatchKey::visit(NodeKind::Table),
    DispatchKey::visit(NodeKind::Subquery),
    DispatchKey::visit(NodeKind::Alias),
    DispatchKey::visit(NodeKind::Column),
    DispatchKey::visit(NodeKind::Star)
];

#[derive(Debug, Clone)]
enum Source {
    Table(TableName),
    Derived {
        columns:  Vec<CompactString>,
        wildcard: bool
    },
    /// CTE or unknown table; any column is accepted
    Opaque
}

#[derive(Debug, Clone)]
struct Relation {
    visible: CompactString,
    source:  Source
}

impl Relation {
    fn provides(&self, column: &str, db: &Database) -> bool {
        match &self.source {
            Source::Table(name) => db
                .get_table_or_none(name)
                .is_some_and(|t| t.has_column(column)),
            Source::Derived { columns, wildcard } => {
                *wildcard || columns.iter().any(|c| c.as_str() == column)
            }
            Source::Opaque => true
        }
    }

    fn describe(&self) -> String {
        match &self.source {
            Source::Table(name) => format!("table \"{}\"", name),
            _ => format!("\"{}\"", self.visible)
        }
    }
}

/// One SELECT's visible relations and the column references made in it
#[derive(Debug, Default)]
struct Scope {
    relations:   Vec<Relation>,
    aliases:     Vec<CompactString>,
    columns:     Vec<(Node, ColumnRef)>,
    has_unknown: bool
}

impl Scope {
    fn relation(&self, visible: &str) -> Option<&Relation> {
        self.relations.iter().rev().find(|r| r.visible.as_str() == visible)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    Resolved,
    UnknownQualifier,
    MissingColumn(String),
    Unresolved,
    /// The scope references an unknown table, so nothing is reported
    Suppressed
}

struct ColumnCheck {
    node:       Node,
    column:     ColumnRef,
    resolution: Resolution
}

/// Follows SELECT scopes through the event stream.
///
/// Column references are collected while a SELECT is open and resolved when
/// it closes, because the FROM clause comes after the projection.
#[derive(Debug, Default)]
struct ScopeTracker {
    ctes:   HashSet<CompactString>,
    scopes: Vec<Scope>
}

impl ScopeTracker {
    fn observe(&mut self, key: DispatchKey, node: &Node, db: &Database) -> Vec<ColumnCheck> {
        match (key.kind, key.event) {
            (NodeKind::Select, Event::Visit) => self.scopes.push(Scope::default()),
            (NodeKind::Select, Event::Leave) => return self.close(db),
            (NodeKind::Cte, Event::Visit) => {
                self.ctes.insert(node.name.clone());
            }
            (NodeKind::Table, Event::Visit) => {
                if let Some(table) = node.table_ref() {
                    let (relation, known) = self.relation_for(table, db);
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.has_unknown |= !known;
                        scope.relations.push(relation);
                    }
                }
            }
            (NodeKind::Subquery, Event::Visit) => {
                if let Some(info) = node.subquery()
                    && let Some(alias) = &info.alias
                    && let Some(scope) = self.scopes.last_mut()
                {
                    scope.relations.push(Relation {
                        visible: alias.clone(),
                        source:  Source::Derived {
                            columns:  info.columns.clone(),
                            wildcard: info.wildcard
                        }
                    });
                }
            }
            (NodeKind::Alias, Event::Visit) => {
                if let Some(scope) = self.scopes.last_mut() {
                    scope.aliases.push(node.name.clone());
                }
            }
            (NodeKind::Column | NodeKind::Star, Event::Visit) => {
                if let Some(column) = node.column_ref()
                    && let Some(scope) = self.scopes.last_mut()
                {
                    scope.columns.push((node.clone(), column.clone()));
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn is_cte(&self, table: &TableRef) -> bool {
        table.schema.is_none() && self.ctes.contains(&table.name)
    }

    fn relation_for(&self, table: &TableRef, db: &Database) -> (Relation, bool) {
        let visible = CompactString::from(table.visible_name());
        if self.is_cte(table) {
            return (
                Relation {
                    visible,
                    source: Source::Opaque
                },
                true
            );
        }
        match db.find_table(table.schema.as_deref(), &table.name) {
            Some(found) => (
                Relation {
                    visible,
                    source: Source::Table(found.name.clone())
                },
                true
            ),
            None => (
                Relation {
                    visible,
                    source: Source::Opaque
                },
                false
            )
        }
    }

    fn close(&mut self, db: &Database) -> Vec<ColumnCheck> {
        let Some(scope) = self.scopes.pop() else {
            return Vec::new();
        };
        scope
            .columns
            .iter()
            .map(|(node, column)| ColumnCheck {
                node:       node.clone(),
                column:     column.clone(),
                resolution: resolve(column, &scope, &self.scopes, db)
            })
            .collect()
    }
}

/// Resolve a column against its scope, then the enclosing scopes
fn resolve(column: &ColumnRef, scope: &Scope, outer: &[Scope], db: &Database) -> Resolution {
    let chain = || std::iter::once(scope).chain(outer.iter().rev());
    let resolution = match &column.qualifier {
        Some(qualifier) => match chain().find_map(|s| s.relation(qualifier)) {
            None => Resolution::UnknownQualifier,
            Some(r) if column.name.as_str() == "*" || r.provides(&column.name, db) => {
                Resolution::Resolved
            }
            Some(r) => Resolution::MissingColumn(r.describe())
        },
        None if scope.aliases.contains(&column.name) => Resolution::Resolved,
        None => {
            if chain()
                .flat_map(|s| &s.relations)
                .any(|r| r.provides(&column.name, db))
            {
                Resolution::Resolved
            } else if chain().any(|s| s.has_unknown) {
                Resolution::Suppressed
            } else {
                Resolution::Unresolved
            }
        }
    };
    match resolution {
        Resolution::MissingColumn(_) | Resolution::Unresolved if scope.has_unknown => {
            Resolution::Suppressed
        }
        other => other
    }
}

fn column_display(column: &ColumnRef) -> String {
    match &column.qualifier {
        Some(q) => format!("{}.{}", q, column.name),
        None => column.name.to_string()
    }
}

const UNKNOWN_TABLE_MESSAGES: &[MessageTemplate] = &[MessageTemplate::new(
    "table-not-exists",
    "Table \"{table}\" does not exist",
    Severity::Error
)];

/// Tables referenced by queries and data statements must exist
#[derive(Debug, Default)]
pub struct UnknownTable {
    ctes: HashSet<CompactString>
}

impl Rule for UnknownTable {
    fn on_node(&mut self, key: DispatchKey, cx: &mut RuleContext<'_>) {
        let Some(node) = cx.node() else {
            return;
        };
        if key.kind == NodeKind::Cte {
            self.ctes.insert(node.name.clone());
            return;
        }
        let Some(table) = node.table_ref() else {
            return;
        };
        if table.schema.is_none() && self.ctes.contains(&table.name) {
            return;
        }
        let db = cx.database();
        if db.find_table(table.schema.as_deref(), &table.name).is_none() {
            let name = db.table_name(table.schema.as_deref(), &table.name).to_string();
            cx.create_report("table-not-exists", None, &[("table", name.as_str())]);
        }
    }
}

impl RuleDefinition for UnknownTable {
    const ID: &'static str = "SCHEMA001";
    const NAME: &'static str = "UnknownTable";
    const FILE: &'static str = file!();
    const CATEGORY: RuleCategory = RuleCategory::Schema;
    const RESTRICT: &'static [&'static str] = &["select", "setoperation", "insert", "update", "delete"];
    const MESSAGES: Option<&'static [MessageTemplate]> = Some(UNKNOWN_TABLE_MESSAGES);
    const CALLBACKS: &'static [DispatchKey] = &[
        DispatchKey::visit(NodeKind::Cte),
        DispatchKey::visit(NodeKind::Table)
    ];
}

const UNKNOWN_COLUMN_MESSAGES: &[MessageTemplate] = &[MessageTemplate::new(
    "column-not-exists",
    "Column \"{column}\" does not exist in {relation}",
    Severity::Error
)];

/// Column references must resolve against the tables in scope
#[derive(Debug, Default)]
pub struct UnknownColumn {
    scopes: ScopeTracker
}

impl Rule for UnknownColumn {
    fn on_node(&mut self, key: DispatchKey, cx: &mut RuleContext<'_>) {
        let Some(node) = cx.node() else {
            return;
        };
        for check in self.scopes.observe(key, node, cx.database()) {
            let relation = match check.resolution {
                Resolution::MissingColumn(relation) => relation,
                Resolution::Unresolved => "any table of the query".to_string(),
                _ => continue
            };
            let column = column_display(&check.column);
            cx.create_report(
                "column-not-exists",
                Some(&check.node),
                &[("column", column.as_str()), ("relation", relation.as_str())]
            );
        }
    }
}

impl RuleDefinition for UnknownColumn {
    const ID: &'static str = "SCHEMA002";
    const NAME: &'static str = "UnknownColumn";
    const FILE: &'static str = file!();
    const CATEGORY: RuleCategory = RuleCategory::Schema;
    const RESTRICT: &'static [&'static str] = QUERY_TAGS;
    const MESSAGES: Option<&'static [MessageTemplate]> = Some(UNKNOWN_COLUMN_MESSAGES);
    const CALLBACKS: &'static [DispatchKey] = SCOPE_CALLBACKS;
}

const UNKNOWN_ALIAS_MESSAGES: &[MessageTemplate] = &[MessageTemplate::new(
    "alias-not-exists",
    "Table or alias \"{alias}\" is not defined in this query",
    Severity::Error
)];

/// Column qualifiers must name a table or alias in scope
#[derive(Debug, Default)]
pub struct UnknownAlias {
    scopes: ScopeTracker
}

impl Rule for UnknownAlias {
    fn on_node(&mut self, key: DispatchKey, cx: &mut RuleContext<'_>) {
        let Some(node) = cx.node() else {
            return;
        };
        for check in self.scopes.observe(key, node, cx.database()) {
            if check.resolution != Resolution::UnknownQualifier {
                continue;
            }
            let alias = check.column.qualifier.as_deref().unwrap_or_default();
            cx.create_report("alias-not-exists", Some(&check.node), &[("alias", alias)]);
        }
    }
}

impl RuleDefinition for UnknownAlias {
    const ID: &'static str = "SCHEMA003";
    const NAME: &'static str = "UnknownAlias";
    const FILE: &'static str = file!();
    const CATEGORY: RuleCategory = RuleCategory::Schema;
    const RESTRICT: &'static [&'static str] = QUERY_TAGS;
    const MESSAGES: Option<&'static [MessageTemplate]> = Some(UNKNOWN_ALIAS_MESSAGES);
    const CALLBACKS: &'static [DispatchKey] = SCOPE_CALLBACKS;
}

const TABLE_EXISTS_MESSAGES: &[MessageTemplate] = &[MessageTemplate::new(
    "table-already-exists",
    "Table \"{table}\" already exists",
    Severity::Error
)];

/// CREATE TABLE without IF NOT EXISTS on an existing table
#[derive(Debug, Default)]
pub struct TableAlreadyExists;

impl Rule for TableAlreadyExists {
    fn on_node(&mut self, _key: DispatchKey, cx: &mut RuleContext<'_>) {
        let Some(node) = cx.node() else {
            return;
        };
        let Some(table) = node.table_ref() else {
            return;
        };
        if node.depth != 1 || cx.root().is_some_and(|r| r.flags().if_not_exists) {
            return;
        }
        let db = cx.database();
        if let Some(existing) = db.find_table(table.schema.as_deref(), &table.name) {
            let name = existing.name.to_string();
            cx.create_report("table-already-exists", None, &[("table", name.as_str())]);
        }
    }
}

impl RuleDefinition for TableAlreadyExists {
    const ID: &'static str = "SCHEMA004";
    const NAME: &'static str = "TableAlreadyExists";
    const FILE: &'static str = file!();
    const CATEGORY: RuleCategory = RuleCategory::Schema;
    const TEMPORARY: bool = true;
    const RESTRICT: &'static [&'static str] = &["create_table"];
    const MESSAGES: Option<&'static [MessageTemplate]> = Some(TABLE_EXISTS_MESSAGES);
    const CALLBACKS: &'static [DispatchKey] = &[DispatchKey::visit(NodeKind::Table)];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Datatype;

    fn db() -> Database {
        let mut db = Database::default();
        let t1 = db.create_table(None, "t1").unwrap();
        db.add_column(&t1, "id", Datatype::new("INT")).unwrap();
        db
    }

    fn column(qualifier: Option<&str>, name: &str) -> ColumnRef {
        ColumnRef {
            qualifier: qualifier.map(CompactString::from),
            name:      name.into()
        }
    }

    fn scope_with_t1(db: &Database) -> Scope {
        Scope {
            relations: vec![Relation {
                visible: "a".into(),
                source:  Source::Table(db.table_name(None, "t1"))
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_qualified_column_resolution() {
        let db = db();
        let scope = scope_with_t1(&db);
        assert_eq!(resolve(&column(Some("a"), "id"), &scope, &[], &db), Resolution::Resolved);
        assert_eq!(
            resolve(&column(Some("b"), "id"), &scope, &[], &db),
            Resolution::UnknownQualifier
        );
        assert!(matches!(
            resolve(&column(Some("a"), "nope"), &scope, &[], &db),
            Resolution::MissingColumn(_)
        ));
    }

    #[test]
    fn test_correlated_column_resolves_in_outer_scope() {
        let db = db();
        let outer = scope_with_t1(&db);
        let inner = Scope::default();
        assert_eq!(
            resolve(&column(Some("a"), "id"), &inner, &[outer], &db),
            Resolution::Resolved
        );
    }

    #[test]
    fn test_unknown_table_suppresses_column_checks() {
        let db = db();
        let mut scope = scope_with_t1(&db);
        scope.has_unknown = true;
        assert_eq!(
            resolve(&column(None, "missing"), &scope, &[], &db),
            Resolution::Suppressed
        );
    }

    #[test]
    fn test_projection_alias_is_accepted() {
        let db = db();
        let mut scope = scope_with_t1(&db);
        scope.aliases.push("total".into());
        assert_eq!(resolve(&column(None, "total"), &scope, &[], &db), Resolution::Resolved);
    }
}
