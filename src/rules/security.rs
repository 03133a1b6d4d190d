use super::{
    MessageTemplate, Rule, RuleCategory, RuleContext, RuleDefinition, RuleRegistry, Severity
};
use crate::{
    ast::NodeKind,
    engine::{DispatchKey, Event}
};

pub fn register(registry: &mut RuleRegistry) {
    registry.register_rule::<MissingWhereClause>();
}

const MISSING_WHERE_MESSAGES: &[MessageTemplate] = &[MessageTemplate::new(
    "missing-where",
    "{statement} without WHERE clause affects every row of \"{table}\"",
    Severity::Error
)];

/// UPDATE or DELETE without WHERE.
///
/// Checked when the statement root is left, after every WHERE clause in the
/// statement has been seen.
#[derive(Debug, Default)]
pub struct MissingWhereClause {
    saw_where: bool
}

impl Rule for MissingWhereClause {
    fn on_node(&mut self, key: DispatchKey, cx: &mut RuleContext<'_>) {
        match (key.kind, key.event) {
            (NodeKind::Where, Event::Visit) => {
                if cx.node().is_some_and(|n| n.depth == 1) {
                    self.saw_where = true;
                }
            }
            (NodeKind::Update | NodeKind::Delete, Event::Leave) if !self.saw_where => {
                let (statement, table) = match cx.node() {
                    Some(node) => (node.kind.tag().to_uppercase(), node.name.to_string()),
                    None => return
                };
                cx.create_report(
                    "missing-where",
                    None,
                    &[("statement", statement.as_str()), ("table", table.as_str())]
                );
            }
            _ => {}
        }
    }
}

impl RuleDefinition for MissingWhereClause {
    const ID: &'static str = "SEC001";
    const NAME: &'static str = "MissingWhereClause";
    const FILE: &'static str = file!();
    const CATEGORY: RuleCategory = RuleCategory::Security;
    const RESTRICT: &'static [&'static str] = &["update", "delete"];
    const MESSAGES: Option<&'static [MessageTemplate]> = Some(MISSING_WHERE_MESSAGES);
    const CALLBACKS: &'static [DispatchKey] = &[
        DispatchKey::visit(NodeKind::Where),
        DispatchKey::leave(NodeKind::Update),
        DispatchKey::leave(NodeKind::Delete)
    ];
    const UNDERLINE_ENTIRE_LINE: bool = true;
}
