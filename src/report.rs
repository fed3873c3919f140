//! Deterministic, diffable rendering of run results and exit status.
//!
//! Nothing time- or environment-dependent ends up in the text, so two runs
//! over the same input render byte-identical output.

use std::fmt::Write;

use crate::app::import_use_case::ImportSummary;
use crate::app::validate_use_case::{Severity, ValidationReport};
use crate::constants::{EXIT_CLEAN, EXIT_CONTENT_ISSUES};
use crate::error::CatalogError;

/// What a run produced
#[derive(Debug)]
pub enum RunOutcome<'a> {
    Import(&'a ImportSummary),
    Validation(&'a ValidationReport),
    Aborted(&'a CatalogError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub exit_code: i32,
}

pub fn render(outcome: RunOutcome<'_>) -> Rendered {
    match outcome {
        RunOutcome::Import(summary) => render_import(summary),
        RunOutcome::Validation(report) => render_validation(report),
        RunOutcome::Aborted(error) => Rendered {
            text: format!("aborted: {}\n", error),
            exit_code: error.exit_code(),
        },
    }
}

fn render_import(summary: &ImportSummary) -> Rendered {
    let mut text = String::new();
    let _ = writeln!(text, "Import summary");
    let _ = writeln!(text, "  imported: {}", summary.imported);
    let _ = writeln!(text, "  updated: {}", summary.updated);
    let _ = writeln!(text, "  skipped (duplicate): {}", summary.skipped_duplicate);
    let _ = writeln!(text, "  rejected: {}", summary.rejected.len());

    if summary.has_rejections() {
        let mut rejected = summary.rejected.clone();
        rejected.sort_by(|a, b| a.row.cmp(&b.row).then_with(|| a.reason.cmp(&b.reason)));
        let _ = writeln!(text, "Rejected rows:");
        for r in &rejected {
            let _ = writeln!(text, "  row {}: {}", r.row, r.reason);
        }
        let _ = writeln!(text, "Import completed with rejected rows");
    } else {
        let _ = writeln!(text, "Import completed");
    }

    Rendered {
        text,
        exit_code: if summary.has_rejections() {
            EXIT_CONTENT_ISSUES
        } else {
            EXIT_CLEAN
        },
    }
}

fn render_validation(report: &ValidationReport) -> Rendered {
    let mut issues = report.issues.clone();
    issues.sort();

    let mut text = String::new();
    let _ = writeln!(text, "Validation summary");
    let _ = writeln!(text, "  files scanned: {}", report.files_scanned);
    let _ = writeln!(text, "  errors: {}", report.error_count());
    let _ = writeln!(text, "  warnings: {}", report.warning_count());
    if report.unresolved_links > 0 {
        let _ = writeln!(text, "  unresolved links: {}", report.unresolved_links);
    }

    if !issues.is_empty() {
        let _ = writeln!(text, "Issues:");
        for issue in &issues {
            let label = match issue.severity {
                Severity::Error => "ERROR",
                Severity::Warning => "WARN",
            };
            let _ = writeln!(
                text,
                "  {} {} [{}]: {}",
                label, issue.file, issue.field, issue.message
            );
        }
    }

    if report.is_failing() {
        let _ = writeln!(text, "Validation failed");
    } else {
        let _ = writeln!(text, "Validation passed");
    }

    Rendered {
        text,
        exit_code: if report.is_failing() {
            EXIT_CONTENT_ISSUES
        } else {
            EXIT_CLEAN
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::import_use_case::RejectedRow;
    use crate::app::validate_use_case::ValidationIssue;

    #[test]
    fn clean_import_exits_zero() {
        let summary = ImportSummary {
            imported: 3,
            ..ImportSummary::default()
        };
        let rendered = render(RunOutcome::Import(&summary));
        assert_eq!(rendered.exit_code, 0);
        assert_eq!(
            rendered.text,
            concat!(
                "Import summary\n",
                "  imported: 3\n",
                "  updated: 0\n",
                "  skipped (duplicate): 0\n",
                "  rejected: 0\n",
                "Import completed\n",
            )
        );
    }

    #[test]
    fn rejections_are_listed_by_row_and_exit_one() {
        let summary = ImportSummary {
            imported: 2,
            rejected: vec![
                RejectedRow { row: 9, reason: "invalid url: x".to_string() },
                RejectedRow { row: 3, reason: "missing required field: url".to_string() },
            ],
            ..ImportSummary::default()
        };
        let rendered = render(RunOutcome::Import(&summary));
        assert_eq!(rendered.exit_code, 1);
        let row3 = rendered.text.find("row 3:").unwrap();
        let row9 = rendered.text.find("row 9:").unwrap();
        assert!(row3 < row9);
        assert!(rendered.text.ends_with("Import completed with rejected rows\n"));
    }

    #[test]
    fn warnings_alone_do_not_fail_validation() {
        let report = ValidationReport {
            files_scanned: 1,
            issues: vec![ValidationIssue::warning(
                "a.json",
                "source.url_repository",
                "unreachable",
            )],
            unresolved_links: 0,
        };
        let rendered = render(RunOutcome::Validation(&report));
        assert_eq!(rendered.exit_code, 0);
        assert!(rendered.text.contains("  WARN a.json [source.url_repository]: unreachable\n"));
    }

    #[test]
    fn validation_output_is_order_independent() {
        let a = ValidationIssue::error("b.json", "category", "bad");
        let b = ValidationIssue::error("a.json", "name", "bad");
        let c = ValidationIssue::warning("a.json", "category", "meh");
        let first = ValidationReport {
            files_scanned: 2,
            issues: vec![a.clone(), b.clone(), c.clone()],
            unresolved_links: 0,
        };
        let second = ValidationReport {
            files_scanned: 2,
            issues: vec![c, a, b],
            unresolved_links: 0,
        };

        let r1 = render(RunOutcome::Validation(&first));
        let r2 = render(RunOutcome::Validation(&second));
        assert_eq!(r1, r2);
        assert_eq!(r1.exit_code, 1);
        let lines: Vec<&str> = r1
            .text
            .lines()
            .filter(|l| l.starts_with("  ERROR") || l.starts_with("  WARN"))
            .collect();
        assert_eq!(
            lines,
            vec![
                "  WARN a.json [category]: meh",
                "  ERROR a.json [name]: bad",
                "  ERROR b.json [category]: bad",
            ]
        );
    }

    #[test]
    fn fatal_errors_exit_two() {
        let err = CatalogError::Config("bad".to_string());
        let rendered = render(RunOutcome::Aborted(&err));
        assert_eq!(rendered.exit_code, 2);
        assert_eq!(rendered.text, "aborted: Configuration error: bad\n");
    }
}
