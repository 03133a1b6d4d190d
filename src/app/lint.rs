//! Lint command execution.

use super::{
    helpers::{
        apply_overrides, calculate_exit_code, create_output_options, parse_failure_caution,
        read_sql_input, write_snapshot
    },
    types::{LintOutcome, LintParams}
};
use crate::{config::Config, error::AppResult, linter::Linter, output::format_lint_report};

/// Executes the lint pipeline.
///
/// 1. Reads the SQL input (file or stdin)
/// 2. Lints it statement by statement while building the schema model
/// 3. Formats the report
/// 4. Writes the model snapshot, printing a caution to stderr first when
///    some statements failed to parse
///
/// # Errors
///
/// Returns an error if the input cannot be read, the snapshot cannot be
/// written or the run hits a fatal model violation.
pub fn run_lint(params: LintParams, config: Config) -> AppResult<LintOutcome> {
    let sql = read_sql_input(&params.input_path)?;
    let config = apply_overrides(config, &params);
    let output_opts = create_output_options(params.output_format, params.no_color, params.verbose);

    let run = Linter::new(&config).run(&sql)?;
    let output = format_lint_report(&run.report, &output_opts);
    let exit_code = calculate_exit_code(&run.report);

    let mut caution = None;
    if let Some(path) = &params.snapshot_path {
        caution = parse_failure_caution(&run.report);
        if let Some(text) = &caution {
            eprintln!("{}", text);
        }
        write_snapshot(path, &run.database)?;
    }

    Ok(LintOutcome {
        exit_code,
        output,
        caution
    })
}

/// One line per registered rule: id, class name, category and restriction
pub fn format_rule_list(config: &Config) -> String {
    let linter = Linter::new(config);
    linter
        .registry()
        .rules()
        .map(|rule| {
            let restrict = if rule.restrict.is_empty() {
                String::from("all statements")
            } else {
                rule.restrict.join(", ")
            };
            format!(
                "{:<10} {:<24} {:<12} {:?} [{}]",
                rule.id,
                rule.name,
                format!("{:?}", rule.category),
                rule.lifetime,
                restrict
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
