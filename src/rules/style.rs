use super::{
    MessageTemplate, Rule, RuleCategory, RuleContext, RuleDefinition, RuleRegistry, Severity
};
use crate::{
    ast::NodeKind,
    engine::{DispatchKey, Event}
};

pub fn register(registry: &mut RuleRegistry) {
    registry.register_rule::<SelectStar>();
}

const SELECT_STAR_MESSAGES: &[MessageTemplate] = &[MessageTemplate::new(
    "select-star",
    "Query uses {star} instead of an explicit column list",
    Severity::Info
)];

/// SELECT * is considered bad practice.
///
/// `EXISTS (SELECT * ...)` is the usual idiom and is not reported.
#[derive(Debug, Default)]
pub struct SelectStar {
    exists_depth: usize
}

impl Rule for SelectStar {
    fn on_node(&mut self, key: DispatchKey, cx: &mut RuleContext<'_>) {
        match (key.kind, key.event) {
            (NodeKind::Exists, Event::Visit) => self.exists_depth += 1,
            (NodeKind::Exists, Event::Leave) => {
                self.exists_depth = self.exists_depth.saturating_sub(1)
            }
            (NodeKind::Star, Event::Visit) if self.exists_depth == 0 => {
                let star = cx.node().map(|n| n.name.to_string()).unwrap_or_default();
                cx.create_report("select-star", None, &[("star", star.as_str())]);
            }
            _ => {}
        }
    }
}

impl RuleDefinition for SelectStar {
    const ID: &'static str = "STYLE001";
    const NAME: &'static str = "SelectStar";
    const FILE: &'static str = file!();
    const CATEGORY: RuleCategory = RuleCategory::Style;
    const RESTRICT: &'static [&'static str] = &["select", "setoperation"];
    const MESSAGES: Option<&'static [MessageTemplate]> = Some(SELECT_STAR_MESSAGES);
    const CALLBACKS: &'static [DispatchKey] = &[
        DispatchKey::visit(NodeKind::Exists),
        DispatchKey::leave(NodeKind::Exists),
        DispatchKey::visit(NodeKind::Star)
    ];
}
