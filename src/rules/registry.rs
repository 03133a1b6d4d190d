//! Rule registration, lifetime handling and report materialization.

use std::collections::{BTreeSet, HashMap};

use compact_str::CompactString;
use tracing::{debug, warn};

use super::{
    MessageTemplate, ReportNode, Rule, RuleCategory, RuleDefinition, RuleReport, Severity
};
use crate::{
    ast::Node, config::RulesConfig, engine::DispatchKey, schema::Database,
    source::StatementLocation
};

/// Loader exposed by a rule module
pub type RuleModule = fn(&mut RuleRegistry);

/// Instance lifetime of a rule class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// One instance for the whole run
    Persistent,
    /// One instance, re-created before each statement
    Normal,
    /// A fresh instance for every dispatch call
    Temporary
}

/// Registration data of a rule class
#[derive(Debug, Clone)]
pub struct RuleMeta {
    pub id:                    &'static str,
    pub name:                  &'static str,
    pub file:                  &'static str,
    pub category:              RuleCategory,
    pub lifetime:              Lifetime,
    pub restrict:              &'static [&'static str],
    pub messages:              Option<&'static [MessageTemplate]>,
    pub callbacks:             &'static [DispatchKey],
    pub code_preview:          bool,
    pub underline_entire_line: bool,
    /// Severity from `[rules.severity]`, replacing the templates' own
    pub severity_override:     Option<Severity>
}

impl RuleMeta {
    /// Whether the rule runs for a statement carrying `tags`
    pub fn applies_to(&self, tags: &BTreeSet<String>) -> bool {
        self.restrict.is_empty() || self.restrict.iter().any(|r| tags.contains(*r))
    }

    pub fn handles(&self, key: DispatchKey) -> bool {
        self.callbacks.contains(&key)
    }
}

/// Statement currently being linted
#[derive(Debug, Clone, Copy)]
pub struct StatementContext<'a> {
    pub location: StatementLocation,
    pub text:     &'a str,
    /// Classification tags: root type, `root_kind` and kind
    pub tags:     &'a BTreeSet<String>,
    pub root:     Option<&'a Node>
}

impl StatementContext<'_> {
    /// First non-empty line of the statement text
    pub fn preview(&self) -> Option<String> {
        self.text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_owned)
    }
}

/// Report queued by a rule, materialized after the callback returns
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub key:           CompactString,
    pub node:          Option<ReportNode>,
    pub location:      Option<StatementLocation>,
    pub preview:       Option<String>,
    pub substitutions: Vec<(CompactString, String)>
}

impl ReportRequest {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn node(mut self, node: &Node) -> Self {
        self.node = Some(ReportNode {
            kind: node.kind,
            name: node.name.clone()
        });
        self
    }

    pub fn at(mut self, location: StatementLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn preview(mut self, preview: Option<String>) -> Self {
        self.preview = preview;
        self
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.substitutions.push((name.into(), value.into()));
        self
    }
}

/// What a rule sees during a callback
pub struct RuleContext<'a> {
    database:  &'a Database,
    statement: Option<StatementContext<'a>>,
    node:      Option<&'a Node>,
    requests:  Vec<ReportRequest>
}

impl<'a> RuleContext<'a> {
    pub fn new(
        database: &'a Database,
        statement: Option<StatementContext<'a>>,
        node: Option<&'a Node>
    ) -> Self {
        Self {
            database,
            statement,
            node,
            requests: Vec::new()
        }
    }

    /// Read-only view of the schema model
    pub fn database(&self) -> &'a Database {
        self.database
    }

    pub fn statement(&self) -> Option<StatementContext<'a>> {
        self.statement
    }

    /// Node bound for the current callback
    pub fn node(&self) -> Option<&'a Node> {
        self.node
    }

    /// Root node of the current statement
    pub fn root(&self) -> Option<&'a Node> {
        self.statement.and_then(|s| s.root)
    }

    /// Queue a report under message `key`.
    ///
    /// `node` defaults to the current node. The report is placed at the
    /// current statement.
    pub fn create_report(&mut self, key: &str, node: Option<&Node>, substitutions: &[(&str, &str)]) {
        let mut request = ReportRequest::new(key);
        if let Some(node) = node.or(self.node) {
            request = request.node(node);
        }
        if let Some(statement) = self.statement {
            request = request.at(statement.location).preview(statement.preview());
        }
        for (name, value) in substitutions {
            request = request.with(name, *value);
        }
        self.requests.push(request);
    }

    /// Queue a fully specified report, e.g. from `end_lint` where no
    /// statement is current
    pub fn push_report(&mut self, request: ReportRequest) {
        self.requests.push(request);
    }

    fn into_requests(self) -> Vec<ReportRequest> {
        self.requests
    }
}

struct RuleEntry {
    meta:     RuleMeta,
    factory:  fn() -> Box<dyn Rule>,
    instance: Option<Box<dyn Rule>>
}

fn instantiate<R: RuleDefinition>() -> Box<dyn Rule> {
    Box::new(R::default())
}

/// Registered rule classes and their live instances.
///
/// Reports come out in traversal order, and for one event in registration
/// order.
pub struct RuleRegistry {
    entries:  Vec<RuleEntry>,
    disabled: Vec<String>,
    severity: HashMap<String, Severity>
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    /// Empty registry without configuration
    pub fn new() -> Self {
        Self::with_config(&RulesConfig::default())
    }

    /// Empty registry applying `[rules]` configuration to later
    /// registrations
    pub fn with_config(config: &RulesConfig) -> Self {
        let mut severity = HashMap::new();
        for (rule_id, level) in &config.severity {
            match Severity::parse(level) {
                Some(level) => {
                    severity.insert(rule_id.to_uppercase(), level);
                }
                None => warn!(rule = %rule_id, level = %level, "unknown severity in [rules.severity]; ignored")
            }
        }
        Self {
            entries: Vec::new(),
            disabled: config.disabled.clone(),
            severity
        }
    }

    /// Call each module's `register`
    pub fn load_modules(&mut self, modules: &[RuleModule]) {
        for register in modules {
            register(self);
        }
    }

    /// Register rule class `R`. Returns whether it was accepted.
    ///
    /// Rejected with a warning: classes that are both persistent and
    /// temporary, and a second class with an already registered name.
    /// Classes disabled in the configuration are skipped silently.
    pub fn register_rule<R: RuleDefinition>(&mut self) -> bool {
        if R::PERSISTENT && R::TEMPORARY {
            warn!(rule = R::NAME, "rule is both persistent and temporary; not registered");
            return false;
        }
        if self.entries.iter().any(|e| e.meta.name == R::NAME) {
            warn!(rule = R::NAME, "rule with this name is already registered; dropped");
            return false;
        }
        if self
            .disabled
            .iter()
            .any(|d| d.eq_ignore_ascii_case(R::ID) || d.eq_ignore_ascii_case(R::NAME))
        {
            debug!(rule = R::NAME, "rule disabled by configuration");
            return false;
        }

        let lifetime = if R::PERSISTENT {
            Lifetime::Persistent
        } else if R::TEMPORARY {
            Lifetime::Temporary
        } else {
            Lifetime::Normal
        };
        let factory: fn() -> Box<dyn Rule> = instantiate::<R>;
        let instance = (lifetime != Lifetime::Temporary).then(factory);
        self.entries.push(RuleEntry {
            meta: RuleMeta {
                id: R::ID,
                name: R::NAME,
                file: R::FILE,
                category: R::CATEGORY,
                lifetime,
                restrict: R::RESTRICT,
                messages: R::MESSAGES,
                callbacks: R::CALLBACKS,
                code_preview: R::CODE_PREVIEW,
                underline_entire_line: R::UNDERLINE_ENTIRE_LINE,
                severity_override: self.severity.get(&R::ID.to_uppercase()).copied()
            },
            factory,
            instance
        });
        debug!(rule = R::NAME, id = R::ID, ?lifetime, "registered rule");
        true
    }

    pub fn rules(&self) -> impl Iterator<Item = &RuleMeta> {
        self.entries.iter().map(|e| &e.meta)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-create every normal instance, dropping per-statement state
    pub fn reset_normal(&mut self) {
        for entry in &mut self.entries {
            if entry.meta.lifetime == Lifetime::Normal {
                entry.instance = Some((entry.factory)());
            }
        }
    }

    pub fn start_lint(&mut self, database: &Database) -> Vec<RuleReport> {
        self.run_hook(database, None, true, |rule, cx| rule.start_lint(cx))
    }

    pub fn end_lint(&mut self, database: &Database) -> Vec<RuleReport> {
        self.run_hook(database, None, true, |rule, cx| rule.end_lint(cx))
    }

    /// Statement hooks reach persistent and normal rules whose restriction
    /// set matches the statement's tags
    pub fn start_statement(&mut self, database: &Database, statement: StatementContext<'_>) -> Vec<RuleReport> {
        self.run_hook(database, Some(statement), false, |rule, cx| {
            rule.start_statement_lint(cx)
        })
    }

    pub fn end_statement(&mut self, database: &Database, statement: StatementContext<'_>) -> Vec<RuleReport> {
        self.run_hook(database, Some(statement), false, |rule, cx| {
            rule.end_statement_lint(cx)
        })
    }

    /// Route one traversal event to every eligible rule declaring `key`
    pub fn dispatch(
        &mut self,
        key: DispatchKey,
        node: &Node,
        database: &Database,
        statement: StatementContext<'_>
    ) -> Vec<RuleReport> {
        let mut reports = Vec::new();
        for entry in &mut self.entries {
            if !entry.meta.handles(key) || !entry.meta.applies_to(statement.tags) {
                continue;
            }
            let mut cx = RuleContext::new(database, Some(statement), Some(node));
            match entry.meta.lifetime {
                Lifetime::Temporary => (entry.factory)().on_node(key, &mut cx),
                Lifetime::Persistent | Lifetime::Normal => match entry.instance.as_mut() {
                    Some(rule) => rule.on_node(key, &mut cx),
                    None => continue
                }
            }
            materialize(&entry.meta, cx.into_requests(), &mut reports);
        }
        reports
    }

    fn run_hook<F>(
        &mut self,
        database: &Database,
        statement: Option<StatementContext<'_>>,
        persistent_only: bool,
        hook: F
    ) -> Vec<RuleReport>
    where
        F: Fn(&mut dyn Rule, &mut RuleContext<'_>)
    {
        let mut reports = Vec::new();
        for entry in &mut self.entries {
            if persistent_only && entry.meta.lifetime != Lifetime::Persistent {
                continue;
            }
            if let Some(statement) = &statement
                && !entry.meta.applies_to(statement.tags)
            {
                continue;
            }
            let Some(rule) = entry.instance.as_mut() else {
                continue;
            };
            let mut cx = RuleContext::new(database, statement, None);
            hook(rule.as_mut(), &mut cx);
            materialize(&entry.meta, cx.into_requests(), &mut reports);
        }
        reports
    }
}

/// Turn queued requests into reports.
///
/// A request is dropped with a warning when the rule has no message
/// templates or none under the requested key.
fn materialize(meta: &RuleMeta, requests: Vec<ReportRequest>, out: &mut Vec<RuleReport>) {
    for request in requests {
        let Some(messages) = meta.messages else {
            warn!(rule = meta.name, key = %request.key, "rule has no messages; report dropped");
            continue;
        };
        let Some(template) = messages.iter().find(|m| m.key == request.key) else {
            warn!(rule = meta.name, key = %request.key, "unknown message key; report dropped");
            continue;
        };
        out.push(RuleReport {
            rule_id:               meta.id,
            rule_name:             template.key,
            rule_class_name:       meta.name,
            rule_class_file:       meta.file,
            category:              meta.category,
            severity:              meta.severity_override.unwrap_or(template.severity),
            message:               render(template.template, &request.substitutions),
            node:                  request.node,
            statement:             request.location,
            preview:               request.preview.filter(|_| meta.code_preview),
            code_preview:          meta.code_preview,
            underline_entire_line: meta.underline_entire_line
        });
    }
}

/// Fill `{name}` placeholders. Placeholders without a value stay verbatim.
fn render(template: &str, substitutions: &[(CompactString, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        match substitutions.iter().find(|(k, _)| k.as_str() == name) {
            Some((_, value)) => out.push_str(value),
            None => {
                debug!(placeholder = name, "no substitution for placeholder");
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subs(pairs: &[(&str, &str)]) -> Vec<(CompactString, String)> {
        pairs
            .iter()
            .map(|(k, v)| (CompactString::from(*k), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let out = render(
            "Table \"{table}\" in {schema}",
            &subs(&[("table", "t1"), ("schema", "dbo")])
        );
        assert_eq!(out, "Table \"t1\" in dbo");
    }

    #[test]
    fn test_render_leaves_unknown_placeholder() {
        assert_eq!(render("{a} and {b}", &subs(&[("a", "x")])), "x and {b}");
    }

    #[test]
    fn test_render_unclosed_brace() {
        assert_eq!(render("open { brace", &[]), "open { brace");
    }
}
