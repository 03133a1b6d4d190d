use colored::Colorize;
use serde::Serialize;

use crate::{
    linter::LintReport,
    rules::{RuleReport, Severity}
};

/// Output format for results
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool,
    pub verbose: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true,
            verbose: false
        }
    }
}

/// Machine-readable report with its severity totals
#[derive(Debug, Serialize)]
pub struct ReportOutput<'a> {
    pub summary: Summary,
    #[serde(flatten)]
    pub report:  &'a LintReport
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub statements: usize,
    pub errors:     usize,
    pub warnings:   usize,
    pub infos:      usize
}

impl Summary {
    pub fn of(report: &LintReport) -> Self {
        Self {
            statements: report.statement_count,
            errors:     report.error_count(),
            warnings:   report.warning_count(),
            infos:      report.info_count()
        }
    }
}

/// Format a lint report based on output options
pub fn format_lint_report(report: &LintReport, opts: &OutputOptions) -> String {
    let output = ReportOutput {
        summary: Summary::of(report),
        report
    };
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(&output).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(&output).unwrap_or_default(),
        OutputFormat::Text => format_text_report(report, opts)
    }
}

fn severity_label(severity: Severity, colored: bool) -> String {
    let label = severity.to_string();
    if !colored {
        return label;
    }
    match severity {
        Severity::Error => label.red().bold().to_string(),
        Severity::Warning => label.yellow().bold().to_string(),
        Severity::Info => label.blue().to_string()
    }
}

fn format_rule_report(report: &RuleReport, opts: &OutputOptions) -> String {
    let location = match report.statement {
        Some(at) => format!("{}:{}", at.line, at.column),
        None => String::from("-")
    };
    let rule = if opts.colored {
        report.rule_id.cyan().to_string()
    } else {
        report.rule_id.to_string()
    };
    let mut line = format!(
        "{:<8} {} [{}] {}\n",
        location,
        severity_label(report.severity, opts.colored),
        rule,
        report.message
    );
    if report.code_preview
        && let Some(preview) = &report.preview
    {
        line.push_str(&format!("         | {}\n", preview));
        if report.underline_entire_line {
            line.push_str(&format!("         | {}\n", "^".repeat(preview.chars().count())));
        }
    }
    if opts.verbose {
        line.push_str(&format!(
            "         = {} ({}) {}\n",
            report.rule_class_name, report.rule_name, report.rule_class_file
        ));
    }
    line
}

fn format_text_report(report: &LintReport, opts: &OutputOptions) -> String {
    let mut output = String::new();
    let header = "=== SQL Lint Report ===";
    if opts.colored {
        output.push_str(&header.bold().to_string());
    } else {
        output.push_str(header);
    }
    output.push_str("\n\n");

    for failure in &report.parse_failures {
        output.push_str(&format!(
            "{}:{} {} {}\n",
            failure.statement.line,
            failure.statement.column,
            severity_label(Severity::Error, opts.colored),
            failure.message
        ));
    }

    for rule_report in &report.reports {
        output.push_str(&format_rule_report(rule_report, opts));
    }

    if !report.mutation_failures.is_empty() {
        output.push('\n');
        for failure in &report.mutation_failures {
            output.push_str(&format!(
                "Statement #{} ({}) not applied to the schema model: {}\n",
                failure.statement.index + 1,
                failure.key,
                failure.message
            ));
        }
    }

    if opts.verbose {
        output.push('\n');
        for statement in &report.statements {
            let outcome = match statement.outcome {
                Some(outcome) => format!("{:?}", outcome),
                None => String::from("Failed")
            };
            output.push_str(&format!(
                "Statement #{} {} -> {}\n",
                statement.location.index + 1,
                statement.key,
                outcome
            ));
        }
    }

    let summary = Summary::of(report);
    let totals = format!(
        "\n{} statement(s): {} error(s), {} warning(s), {} info\n",
        summary.statements, summary.errors, summary.warnings, summary.infos
    );
    if opts.colored && summary.errors > 0 {
        output.push_str(&totals.red().to_string());
    } else if opts.colored && summary.warnings > 0 {
        output.push_str(&totals.yellow().to_string());
    } else if opts.colored {
        output.push_str(&totals.green().to_string());
    } else {
        output.push_str(&totals);
    }
    output
}
