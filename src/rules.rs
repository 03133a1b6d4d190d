//! Rule system: rule traits, the registry and the built-in rules.
//!
//! Rules are stateful visitors. The traversal engine produces
//! `<nodeType>_visit` / `<nodeType>_leave` events and the [`RuleRegistry`]
//! routes each one to the registered rules that declare the key and whose
//! restriction set matches the statement.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  events  ┌──────────────┐  requests  ┌──────────────┐
//! │   traverse   │─────────▶│ RuleRegistry │───────────▶│  RuleReport  │
//! └──────────────┘          └──────────────┘            └──────────────┘
//!                                  │
//!                      ┌───────────┼───────────┐
//!                 persistent     normal     temporary
//!                 (whole run)  (per stmt)  (per dispatch)
//! ```
//!
//! Rules queue report requests on the [`RuleContext`]; the registry turns
//! them into [`RuleReport`]s right after every callback, looking the message
//! key up in the rule's templates.
//!
//! # Built-in Rules
//!
//! - **Schema** (`SCHEMA001`-`SCHEMA004`) - Unknown tables, columns and
//!   aliases, duplicate tables
//! - **Performance** (`PERF001`) - Foreign keys without a covering index
//! - **Style** (`STYLE001`) - `SELECT *`
//! - **Security** (`SEC001`) - UPDATE/DELETE without WHERE
//!
//! # Configuration
//!
//! ```toml
//! [rules]
//! disabled = ["STYLE001"]
//!
//! [rules.severity]
//! PERF001 = "error"
//! ```
//!
//! # Implementing Custom Rules
//!
//! ```
//! use sql_schema_linter::{
//!     ast::NodeKind,
//!     engine::DispatchKey,
//!     rules::{
//!         MessageTemplate, Rule, RuleCategory, RuleContext, RuleDefinition, RuleRegistry,
//!         Severity
//!     }
//! };
//!
//! const TEMPLATES: &[MessageTemplate] = &[MessageTemplate::new(
//!     "no-function",
//!     "Function {name} is not allowed",
//!     Severity::Warning
//! )];
//!
//! #[derive(Default)]
//! struct NoFunctions;
//!
//! impl Rule for NoFunctions {
//!     fn on_node(&mut self, _key: DispatchKey, cx: &mut RuleContext<'_>) {
//!         let name = cx.node().map(|n| n.name.to_string()).unwrap_or_default();
//!         cx.create_report("no-function", None, &[("name", name.as_str())]);
//!     }
//! }
//!
//! impl RuleDefinition for NoFunctions {
//!     const ID: &'static str = "CUSTOM001";
//!     const NAME: &'static str = "NoFunctions";
//!     const FILE: &'static str = file!();
//!     const CATEGORY: RuleCategory = RuleCategory::Style;
//!     const MESSAGES: Option<&'static [MessageTemplate]> = Some(TEMPLATES);
//!     const CALLBACKS: &'static [DispatchKey] = &[DispatchKey::visit(NodeKind::Function)];
//! }
//!
//! let mut registry = RuleRegistry::new();
//! assert!(registry.register_rule::<NoFunctions>());
//! ```

mod performance;
mod registry;
mod schema_aware;
mod security;
mod style;
mod types;

pub use registry::{
    Lifetime, ReportRequest, RuleContext, RuleMeta, RuleModule, RuleRegistry, StatementContext
};
pub use types::{MessageTemplate, ReportNode, RuleCategory, RuleReport, Severity};

use crate::engine::DispatchKey;

/// Rule modules loaded by default
pub const BUILTIN_MODULES: &[RuleModule] = &[
    schema_aware::register,
    performance::register,
    style::register,
    security::register
];

/// Callbacks of a rule instance.
///
/// Every method has an empty default; a rule overrides the hooks it needs
/// and lists the node keys it handles in [`RuleDefinition::CALLBACKS`].
pub trait Rule {
    /// Called for every declared `<nodeType>_visit` / `_leave` key, with
    /// the node bound as the context's current node.
    fn on_node(&mut self, _key: DispatchKey, _cx: &mut RuleContext<'_>) {}

    /// Run start; persistent rules only
    fn start_lint(&mut self, _cx: &mut RuleContext<'_>) {}

    /// Run end; persistent rules only
    fn end_lint(&mut self, _cx: &mut RuleContext<'_>) {}

    fn start_statement_lint(&mut self, _cx: &mut RuleContext<'_>) {}

    fn end_statement_lint(&mut self, _cx: &mut RuleContext<'_>) {}
}

/// Static description of a rule class.
///
/// `PERSISTENT` and `TEMPORARY` select the instance lifetime; a rule with
/// neither is a normal rule, re-created before each statement. Setting both
/// is rejected at registration.
pub trait RuleDefinition: Rule + Default + 'static {
    /// Unique rule identifier (e.g., "SCHEMA001")
    const ID: &'static str;
    /// Rule class name
    const NAME: &'static str;
    /// Source file of the rule class
    const FILE: &'static str;
    const CATEGORY: RuleCategory;
    const PERSISTENT: bool = false;
    const TEMPORARY: bool = false;
    /// Statement tags the rule runs for; empty means every statement
    const RESTRICT: &'static [&'static str] = &[];
    const MESSAGES: Option<&'static [MessageTemplate]> = None;
    const CALLBACKS: &'static [DispatchKey] = &[];
    const CODE_PREVIEW: bool = true;
    const UNDERLINE_ENTIRE_LINE: bool = false;
}
