//! Run driver: lint every statement, then apply it to the schema model.
//!
//! Statements are processed strictly in input order. Each statement is
//! linted against the model built from the statements before it, then its
//! mutation is applied, so a `SELECT` only sees tables created earlier in
//! the file.
//!
//! # Example
//!
//! ```
//! use sql_schema_linter::{config::Config, linter::Linter};
//!
//! let mut linter = Linter::new(&Config::default());
//! let run = linter
//!     .run("CREATE TABLE t1 (id INT PRIMARY KEY); SELECT id FROM t1; SELECT x FROM t2;")
//!     .unwrap();
//!
//! assert_eq!(run.report.reports.len(), 1);
//! assert_eq!(run.report.reports[0].rule_id, "SCHEMA001");
//! assert!(run.database.find_table(None, "t1").is_some());
//! ```

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    ast::lower_statement,
    config::{Config, RulesConfig},
    engine::traverse,
    error::{AppResult, format_statement_error, model_error, traversal_error},
    mutation::{MutationDispatcher, MutationFailure, Outcome},
    rules::{self, RuleModule, RuleRegistry, RuleReport, Severity, StatementContext},
    schema::Database,
    source::{SqlDialect, StatementLocation, split_statements}
};

/// Name of the model database built by a run
const DATABASE_NAME: &str = "lint";

/// A statement the parser rejected; it is neither linted nor applied
#[derive(Debug, Clone, Serialize)]
pub struct ParseFailure {
    pub statement: StatementLocation,
    pub message:   String
}

/// What happened to one parsed statement
#[derive(Debug, Clone, Serialize)]
pub struct StatementSummary {
    pub location: StatementLocation,
    /// Classification key, e.g. `create_table`
    pub key:      String,
    /// `None` when the mutation failed
    pub outcome:  Option<Outcome>
}

/// Result of linting one source text
#[derive(Debug, Clone, Default, Serialize)]
pub struct LintReport {
    pub statements:        Vec<StatementSummary>,
    pub reports:           Vec<RuleReport>,
    pub parse_failures:    Vec<ParseFailure>,
    pub mutation_failures: Vec<MutationFailure>,
    pub had_parse_failure: bool,
    /// Statements found in the source, parsed or not
    pub statement_count:   usize
}

impl LintReport {
    fn count(&self, severity: Severity) -> usize {
        self.reports
            .iter()
            .filter(|r| r.severity == severity)
            .count()
    }

    /// Error-level reports plus parse failures
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error) + self.parse_failures.len()
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count(Severity::Info)
    }
}

/// Report together with the schema model the run ended with
#[derive(Debug)]
pub struct LintRun {
    pub report:   LintReport,
    pub database: Database
}

/// Lints SQL text with a rule registry and a mutation dispatcher
pub struct Linter {
    dialect:        SqlDialect,
    default_schema: String,
    rules_config:   RulesConfig,
    rule_modules:   Vec<RuleModule>,
    registry:       RuleRegistry,
    dispatcher:     MutationDispatcher
}

impl Linter {
    /// Linter with the built-in rule and mutation modules
    pub fn new(config: &Config) -> Self {
        let rule_modules = rules::BUILTIN_MODULES.to_vec();
        let mut registry = RuleRegistry::with_config(&config.rules);
        registry.load_modules(&rule_modules);
        Self {
            dialect: config.linter.dialect,
            default_schema: config.linter.default_schema.clone(),
            rules_config: config.rules.clone(),
            rule_modules,
            registry,
            dispatcher: MutationDispatcher::with_builtins()
        }
    }

    /// Load additional rule modules after the built-in ones
    pub fn with_rule_modules(mut self, modules: &[RuleModule]) -> Self {
        self.registry.load_modules(modules);
        self.rule_modules.extend_from_slice(modules);
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn dispatcher_mut(&mut self) -> &mut MutationDispatcher {
        &mut self.dispatcher
    }

    /// Lint `sql` statement by statement, building the schema model as it
    /// goes.
    ///
    /// # Errors
    ///
    /// Fails only on a fatal condition: a node stream with a depth gap or
    /// a schema model integrity violation. Parse and mutation failures are
    /// recorded in the report and the run continues.
    pub fn run(&mut self, sql: &str) -> AppResult<LintRun> {
        let result = self.lint_statements(sql);
        self.rebuild_registry();
        result
    }

    fn lint_statements(&mut self, sql: &str) -> AppResult<LintRun> {
        let mut db = Database::with_default_schema(DATABASE_NAME, &self.default_schema);
        let parser_dialect = self.dialect.into_parser_dialect();
        let statements = split_statements(sql);
        let mut report = LintReport {
            statement_count: statements.len(),
            ..Default::default()
        };

        report.reports.extend(self.registry.start_lint(&db));

        for statement in &statements {
            let location = statement.location;
            let parsed = match statement.parse(parser_dialect.as_ref()) {
                Ok(parsed) => parsed,
                Err(err) => {
                    let message = format_statement_error(&err.to_string(), location);
                    warn!("skipping statement: {}", message);
                    report.parse_failures.push(ParseFailure {
                        statement: location,
                        message
                    });
                    report.had_parse_failure = true;
                    continue;
                }
            };

            let tree = lower_statement(&parsed);
            let class = tree.class();
            let tags = class.tags();
            let key = class.key();
            debug!(
                statement = location.index + 1,
                key = %key,
                nodes = tree.nodes.len(),
                "linting statement"
            );

            self.registry.reset_normal();
            let context = StatementContext {
                location,
                text: &statement.text,
                tags: &tags,
                root: tree.root()
            };
            report
                .reports
                .extend(self.registry.start_statement(&db, context));

            let registry = &mut self.registry;
            let mut found = Vec::new();
            traverse(&tree.nodes, |event, node| {
                found.extend(registry.dispatch(event, node, &db, context));
            })
            .map_err(|err| traversal_error(&err, location))?;
            report.reports.extend(found);
            report
                .reports
                .extend(self.registry.end_statement(&db, context));

            let outcome = match self.dispatcher.dispatch(&tree, &mut db) {
                Ok(outcome) => Some(outcome),
                Err(err) if err.is_fatal() => return Err(model_error(&err)),
                Err(err) => {
                    warn!(statement = location.index + 1, key = %key, "mutation failed: {}", err);
                    report.mutation_failures.push(MutationFailure {
                        statement: location,
                        key:       key.clone(),
                        message:   err.to_string()
                    });
                    None
                }
            };
            report.statements.push(StatementSummary {
                location,
                key,
                outcome
            });
        }

        report.reports.extend(self.registry.end_lint(&db));
        Ok(LintRun {
            report,
            database: db
        })
    }

    /// Fresh rule instances for the next run, also after an aborted one
    fn rebuild_registry(&mut self) {
        let mut registry = RuleRegistry::with_config(&self.rules_config);
        registry.load_modules(&self.rule_modules);
        self.registry = registry;
    }
}
