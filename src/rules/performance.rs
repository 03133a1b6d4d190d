use std::collections::HashMap;

use super::{
    MessageTemplate, ReportRequest, Rule, RuleCategory, RuleContext, RuleDefinition,
    RuleRegistry, Severity
};
use crate::{
    ast::NodeKind, engine::DispatchKey, schema::TableName, source::StatementLocation
};

pub fn register(registry: &mut RuleRegistry) {
    registry.register_rule::<MissingForeignKeyIndex>();
}

const FK_INDEX_MESSAGES: &[MessageTemplate] = &[MessageTemplate::new(
    "fk-index-not-exists",
    "Foreign key {fk} on {table}({columns}) referencing {referenced} has no covering index",
    Severity::Warning
)];

/// Foreign keys whose owner columns are not the leading columns of an
/// index, unique constraint or primary key.
///
/// Indexes may be created after the foreign key, so the check runs once on
/// the final model at the end of the run. Each report points at the last
/// statement that declared a foreign key on the owner table.
#[derive(Debug, Default)]
pub struct MissingForeignKeyIndex {
    current:  Option<TableName>,
    declared: HashMap<TableName, (StatementLocation, Option<String>)>
}

impl Rule for MissingForeignKeyIndex {
    fn start_statement_lint(&mut self, _cx: &mut RuleContext<'_>) {
        self.current = None;
    }

    fn on_node(&mut self, key: DispatchKey, cx: &mut RuleContext<'_>) {
        let Some(node) = cx.node() else {
            return;
        };
        match key.kind {
            NodeKind::Table if node.depth == 1 => {
                self.current = node
                    .table_ref()
                    .map(|t| cx.database().table_name(t.schema.as_deref(), &t.name));
            }
            NodeKind::Reference => {
                if let Some(table) = self.current.clone()
                    && let Some(statement) = cx.statement()
                {
                    self.declared
                        .insert(table, (statement.location, statement.preview()));
                }
            }
            _ => {}
        }
    }

    fn end_lint(&mut self, cx: &mut RuleContext<'_>) {
        let db = cx.database();
        for fk in db.foreign_keys() {
            let covered = db
                .get_table_or_none(&fk.owner)
                .is_none_or(|owner| owner.is_covered_by_index(&fk.owner_columns));
            if covered {
                continue;
            }
            let mut request = ReportRequest::new("fk-index-not-exists")
                .with("fk", fk.display_name())
                .with("table", fk.owner.to_string())
                .with("columns", fk.owner_columns.join(", "))
                .with("referenced", fk.referenced.to_string());
            if let Some((location, preview)) = self.declared.get(&fk.owner) {
                request = request.at(*location).preview(preview.clone());
            }
            cx.push_report(request);
        }
    }
}

impl RuleDefinition for MissingForeignKeyIndex {
    const ID: &'static str = "PERF001";
    const NAME: &'static str = "MissingForeignKeyIndex";
    const FILE: &'static str = file!();
    const CATEGORY: RuleCategory = RuleCategory::Performance;
    const PERSISTENT: bool = true;
    const RESTRICT: &'static [&'static str] = &["create_table", "create_index", "altertable"];
    const MESSAGES: Option<&'static [MessageTemplate]> = Some(FK_INDEX_MESSAGES);
    const CALLBACKS: &'static [DispatchKey] = &[
        DispatchKey::visit(NodeKind::Table),
        DispatchKey::visit(NodeKind::Reference)
    ];
    const CODE_PREVIEW: bool = false;
}
