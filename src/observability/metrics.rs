//! Metrics for the catalog pipeline
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! embedding process installs a recorder, so these calls are free in the CLI.

use std::fmt;

/// Enum representing all metric names used in the system
/// This eliminates magic strings and provides compile-time safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Import metrics
    ImportRowsImported,
    ImportRowsUpdated,
    ImportRowsSkippedDuplicate,
    ImportRowsRejected,

    // Validation metrics
    ValidateFilesScanned,
    ValidateIssuesDetected,

    // Link check metrics
    LinkChecksReachable,
    LinkChecksUnreachable,
    LinkChecksUnresolved,
}

impl MetricName {
    /// Get the metric name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ImportRowsImported => "catalog_import_rows_imported_total",
            MetricName::ImportRowsUpdated => "catalog_import_rows_updated_total",
            MetricName::ImportRowsSkippedDuplicate => "catalog_import_rows_skipped_duplicate_total",
            MetricName::ImportRowsRejected => "catalog_import_rows_rejected_total",

            MetricName::ValidateFilesScanned => "catalog_validate_files_scanned_total",
            MetricName::ValidateIssuesDetected => "catalog_validate_issues_detected_total",

            MetricName::LinkChecksReachable => "catalog_link_checks_reachable_total",
            MetricName::LinkChecksUnreachable => "catalog_link_checks_unreachable_total",
            MetricName::LinkChecksUnresolved => "catalog_link_checks_unresolved_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub mod importer {
    use super::MetricName;

    pub fn row_imported() {
        ::metrics::counter!(MetricName::ImportRowsImported.as_str()).increment(1);
    }

    pub fn row_updated() {
        ::metrics::counter!(MetricName::ImportRowsUpdated.as_str()).increment(1);
    }

    pub fn row_skipped_duplicate() {
        ::metrics::counter!(MetricName::ImportRowsSkippedDuplicate.as_str()).increment(1);
    }

    pub fn row_rejected() {
        ::metrics::counter!(MetricName::ImportRowsRejected.as_str()).increment(1);
    }
}

pub mod validator {
    use super::MetricName;

    pub fn files_scanned(count: usize) {
        ::metrics::counter!(MetricName::ValidateFilesScanned.as_str()).increment(count as u64);
    }

    /// Record that an issue was detected, labelled by severity
    pub fn issue_detected(severity: &str) {
        ::metrics::counter!(
            MetricName::ValidateIssuesDetected.as_str(),
            "severity" => severity.to_string()
        )
        .increment(1);
    }
}

pub mod links {
    use super::MetricName;

    pub fn reachable() {
        ::metrics::counter!(MetricName::LinkChecksReachable.as_str()).increment(1);
    }

    pub fn unreachable() {
        ::metrics::counter!(MetricName::LinkChecksUnreachable.as_str()).increment(1);
    }

    pub fn unresolved(count: usize) {
        ::metrics::counter!(MetricName::LinkChecksUnresolved.as_str()).increment(count as u64);
    }
}
