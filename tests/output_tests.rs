// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use pretty_assertions::assert_eq;
use sql_schema_linter::{
    config::Config,
    linter::{LintReport, Linter},
    output::{OutputFormat, OutputOptions, Summary, format_lint_report}
};

fn report_for(sql: &str) -> LintReport {
    Linter::new(&Config::default()).run(sql).unwrap().report
}

fn plain(format: OutputFormat) -> OutputOptions {
    OutputOptions {
        format,
        colored: false,
        verbose: false
    }
}

const MIXED: &str = "CREATE TABLE t1 (id INT);\nSELECT * FROM t1;\nSELECT id FROM t2;\nDELETE FROM t1;";

#[test]
fn test_output_options_default() {
    let opts = OutputOptions::default();
    assert!(matches!(opts.format, OutputFormat::Text));
    assert!(opts.colored);
    assert!(!opts.verbose);
}

#[test]
fn test_summary_counts_by_severity() {
    let report = report_for(MIXED);
    assert_eq!(
        Summary::of(&report),
        Summary {
            statements: 4,
            errors:     2,
            warnings:   0,
            infos:      1
        }
    );
}

#[test]
fn test_text_report_layout() {
    let output = format_lint_report(&report_for(MIXED), &plain(OutputFormat::Text));

    assert!(output.starts_with("=== SQL Lint Report ===\n\n"));
    assert!(output.contains("2:1      INFO [STYLE001]"));
    assert!(output.contains("3:1      ERROR [SCHEMA001] Table \"dbo.t2\" does not exist"));
    assert!(output.contains("4:1      ERROR [SEC001]"));
    assert!(output.ends_with("\n4 statement(s): 2 error(s), 0 warning(s), 1 info\n"));
}

#[test]
fn test_text_report_preview() {
    let output = format_lint_report(&report_for(MIXED), &plain(OutputFormat::Text));
    assert!(output.contains("         | SELECT id FROM t2"));
}

#[test]
fn test_report_without_statement_has_no_location() {
    let report = report_for(
        "CREATE TABLE parent (id INT PRIMARY KEY);\n\
         CREATE TABLE child (parent_id INT REFERENCES parent (id));"
    );
    let output = format_lint_report(&report, &plain(OutputFormat::Text));
    assert!(output.contains("WARN [PERF001]"));
    assert!(output.contains("0 error(s), 1 warning(s), 0 info"));
}

#[test]
fn test_text_report_lists_parse_and_mutation_failures() {
    let report = report_for("SELEC 1;\nCREATE TABLE t2 (t1_id INT REFERENCES t1 (id));");
    let output = format_lint_report(&report, &plain(OutputFormat::Text));

    assert!(output.contains("1:1 ERROR Statement #1 parse error"));
    assert!(output.contains("Statement #2 (create_table) not applied to the schema model"));
}

#[test]
fn test_verbose_text_shows_rule_class_and_outcomes() {
    let opts = OutputOptions {
        verbose: true,
        ..plain(OutputFormat::Text)
    };
    let output = format_lint_report(&report_for(MIXED), &opts);

    assert!(output.contains("= UnknownTable (table-not-exists)"));
    assert!(output.contains("Statement #1 create_table -> Applied"));
    assert!(output.contains("Statement #2 select -> NotModifying"));
}

#[test]
fn test_colored_text_differs_from_plain() {
    let report = report_for(MIXED);
    let opts = OutputOptions {
        colored: true,
        ..plain(OutputFormat::Text)
    };
    colored::control::set_override(true);
    let colored = format_lint_report(&report, &opts);
    colored::control::unset_override();

    assert!(colored.contains("SQL Lint Report"));
    assert_ne!(colored, format_lint_report(&report, &plain(OutputFormat::Text)));
}

#[test]
fn test_json_report() {
    let output = format_lint_report(&report_for(MIXED), &plain(OutputFormat::Json));
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["summary"]["statements"], 4);
    assert_eq!(value["summary"]["errors"], 2);
    assert_eq!(value["reports"].as_array().unwrap().len(), 3);
    assert_eq!(value["reports"][1]["rule_id"], "SCHEMA001");
    assert_eq!(value["had_parse_failure"], false);
}

#[test]
fn test_yaml_report() {
    let output = format_lint_report(&report_for(MIXED), &plain(OutputFormat::Yaml));
    let value: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();

    assert_eq!(value["summary"]["infos"].as_u64(), Some(1));
    assert_eq!(value["statement_count"].as_u64(), Some(4));
}

#[test]
fn test_empty_report() {
    let output = format_lint_report(&LintReport::default(), &plain(OutputFormat::Text));
    assert!(output.contains("0 statement(s): 0 error(s), 0 warning(s), 0 info"));
}
