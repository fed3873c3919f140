use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::app::ports::{LinkChecker, LinkStatus};
use crate::catalog::{record_file_name, CatalogIndex};
use crate::config::{LinksConfig, RulesConfig};
use crate::constants::{
    FIELD_CATEGORY, FIELD_COUNTRY, FIELD_DESCRIPTION, FIELD_DOCUMENTATION, FIELD_LICENSE,
    FIELD_METADATA_FILENAME, FIELD_NAME, FIELD_PLATFORM, FIELD_URL, RECORD_LEVEL_FIELD,
};
use crate::normalize::{canonical_url, candidate_stems, slugify};
use crate::observability::metrics::{links as link_metrics, validator as validate_metrics};
use crate::schema::RecordSchema;
use crate::types::ProjectRecord;

/// Severity levels for validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Fails the run
    Error,
    /// Reported only
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single finding against one catalog file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ValidationIssue {
    /// File name inside the catalog directory
    pub file: String,
    /// Dotted field path, or `<record>` for whole-record findings
    pub field: String,
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(file: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            field: field.to_string(),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(file: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            field: field.to_string(),
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Findings of one validation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub files_scanned: usize,
    pub issues: Vec<ValidationIssue>,
    /// Link checks abandoned on cancellation; never counted as issues
    pub unresolved_links: usize,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Warning).count()
    }

    /// Failing when any error-severity issue exists; warnings never fail a run
    pub fn is_failing(&self) -> bool {
        self.error_count() > 0
    }
}

/// Scans the whole catalog and enforces per-record and cross-record rules.
pub struct ValidateUseCase {
    rules: RulesConfig,
    links: LinksConfig,
    schema: RecordSchema,
    link_checker: Option<Arc<dyn LinkChecker>>,
}

impl ValidateUseCase {
    pub fn new(rules: RulesConfig, links: LinksConfig, schema: RecordSchema) -> Self {
        Self {
            rules,
            links,
            schema,
            link_checker: None,
        }
    }

    /// Enable reachability checks of every record's repository URL
    pub fn with_link_checker(mut self, checker: Arc<dyn LinkChecker>) -> Self {
        self.link_checker = Some(checker);
        self
    }

    #[instrument(
        skip_all,
        fields(dir = %catalog.dir().display(), check_links = self.link_checker.is_some())
    )]
    pub async fn run(&self, catalog: &CatalogIndex, cancel: CancellationToken) -> ValidationReport {
        let mut report = ValidationReport::default();
        // Stems with a URL worth probing, keyed for stable merge
        let mut link_targets: BTreeMap<String, String> = BTreeMap::new();

        for entry in catalog.foreign_entries() {
            let message = if entry.is_dir {
                "not a record file (directory)"
            } else {
                "not a record file (expected .json extension)"
            };
            report
                .issues
                .push(ValidationIssue::warning(&entry.file_name, RECORD_LEVEL_FIELD, message));
        }

        for stem in catalog.stems() {
            let file = record_file_name(stem);
            debug!("Validating {}", file);
            report.files_scanned += 1;

            let content = match fs::read_to_string(catalog.record_path(stem)) {
                Ok(content) => content,
                Err(e) => {
                    report.issues.push(ValidationIssue::error(
                        &file,
                        RECORD_LEVEL_FIELD,
                        format!("file could not be read: {}", e),
                    ));
                    continue;
                }
            };

            let (issues, url) = self.check_record(stem, &content);
            report.issues.extend(issues);
            if let Some(url) = url {
                link_targets.insert(stem.to_string(), url);
            }
        }

        report.issues.extend(duplicate_url_issues(catalog));

        if let Some(checker) = &self.link_checker {
            let (issues, unresolved) = self
                .check_links(checker.clone(), link_targets, cancel)
                .await;
            report.issues.extend(issues);
            report.unresolved_links = unresolved;
        }

        report.issues.sort();
        validate_metrics::files_scanned(report.files_scanned);
        for issue in &report.issues {
            validate_metrics::issue_detected(&issue.severity.to_string());
        }

        info!(
            "Validated {} files: {} errors, {} warnings",
            report.files_scanned,
            report.error_count(),
            report.warning_count()
        );
        report
    }

    /// Per-file checks. Returns the issues and, for a structurally sound
    /// record, the URL to check.
    pub fn check_record(
        &self,
        stem: &str,
        content: &str,
    ) -> (Vec<ValidationIssue>, Option<String>) {
        let file = record_file_name(stem);
        let mut issues = Vec::new();

        let value: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(e) => {
                issues.push(ValidationIssue::error(
                    &file,
                    RECORD_LEVEL_FIELD,
                    format!("not valid JSON: {}", e),
                ));
                return (issues, None);
            }
        };

        let violations = self.schema.violations(&value);
        if !violations.is_empty() {
            issues.extend(
                violations
                    .into_iter()
                    .map(|v| ValidationIssue::error(&file, &v.field, v.message)),
            );
            return (issues, None);
        }

        let record: ProjectRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                issues.push(ValidationIssue::error(
                    &file,
                    RECORD_LEVEL_FIELD,
                    format!("does not match the record structure: {}", e),
                ));
                return (issues, None);
            }
        };

        for (field, value) in [
            (FIELD_NAME, &record.name),
            (FIELD_DESCRIPTION, &record.description),
            (FIELD_CATEGORY, &record.category),
            (FIELD_COUNTRY, &record.country),
            (FIELD_PLATFORM, &record.source.platform),
        ] {
            if value.trim().is_empty() {
                issues.push(ValidationIssue::error(&file, field, "required field is empty"));
            }
        }

        if !record.category.is_empty() && !self.rules.is_allowed_category(&record.category) {
            issues.push(ValidationIssue::error(
                &file,
                FIELD_CATEGORY,
                format!("category '{}' is not in the allowed set", record.category),
            ));
        }

        if let Some(license) = &record.source.license {
            if self.rules.canonical_license(license) != Some(license.as_str()) {
                issues.push(ValidationIssue::error(
                    &file,
                    FIELD_LICENSE,
                    format!("unrecognized license '{}'", license),
                ));
            }
        }

        if let Some(doc) = &record.source.url_documentation {
            if canonical_url(doc).is_none() {
                issues.push(ValidationIssue::error(
                    &file,
                    FIELD_DOCUMENTATION,
                    format!("invalid url '{}'", doc),
                ));
            }
        }

        if record.metadata.filename != file {
            issues.push(ValidationIssue::error(
                &file,
                FIELD_METADATA_FILENAME,
                format!("metadata names '{}' but the file is '{}'", record.metadata.filename, file),
            ));
        }

        let canonical = canonical_url(&record.source.url_repository);
        match &canonical {
            None => issues.push(ValidationIssue::error(
                &file,
                FIELD_URL,
                format!("invalid url '{}'", record.source.url_repository),
            )),
            Some(c) if *c != record.source.url_repository => issues.push(ValidationIssue::warning(
                &file,
                FIELD_URL,
                format!("url is not canonical: expected {}", c),
            )),
            Some(_) => {}
        }

        // Disambiguated names are only acceptable when derived from this record's own URL
        let stem_matches = match &canonical {
            Some(c) => candidate_stems(&record.name, c).iter().any(|s| s == stem),
            None => slugify(&record.name) == stem,
        };
        if !stem_matches {
            issues.push(ValidationIssue::error(
                &file,
                FIELD_NAME,
                format!(
                    "filename does not match slug of name (expected {})",
                    record_file_name(&slugify(&record.name))
                ),
            ));
        }

        (issues, canonical)
    }

    /// Check URLs in a bounded pool. Results are merged by stem, so completion
    /// order never shows in the report. Returns the warnings and the number of
    /// checks abandoned on cancellation.
    async fn check_links(
        &self,
        checker: Arc<dyn LinkChecker>,
        targets: BTreeMap<String, String>,
        cancel: CancellationToken,
    ) -> (Vec<ValidationIssue>, usize) {
        let total = targets.len();
        info!("Checking {} links with concurrency {}", total, self.links.concurrency);

        // The phase deadline cancels a child token, leaving the caller's untouched
        let (cancel, deadline) = match self.links.max_duration() {
            Some(limit) => {
                let phase = cancel.child_token();
                let expire = phase.clone();
                let timer = tokio::spawn(async move {
                    tokio::time::sleep(limit).await;
                    warn!("Link checks exceeded {:?}; cancelling", limit);
                    expire.cancel();
                });
                (phase, Some(timer))
            }
            None => (cancel, None),
        };

        let semaphore = Arc::new(Semaphore::new(self.links.concurrency.max(1)));
        let mut set = JoinSet::new();

        for (stem, url) in targets {
            let checker = checker.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            set.spawn(async move {
                let permit = tokio::select! {
                    _ = cancel.cancelled() => return None,
                    permit = semaphore.acquire_owned() => permit,
                };
                let Ok(_permit) = permit else {
                    return None;
                };
                // Do not start new checks once cancelled
                if cancel.is_cancelled() {
                    return None;
                }
                let status = checker.check(&url).await;
                Some((stem, url, status))
            });
        }

        let mut results: HashMap<String, (String, LinkStatus)> = HashMap::new();
        let mut collect = |joined: Option<(String, String, LinkStatus)>| {
            if let Some((stem, url, status)) = joined {
                results.insert(stem, (url, status));
            }
        };

        loop {
            tokio::select! {
                biased;
                joined = set.join_next() => match joined {
                    Some(Ok(outcome)) => collect(outcome),
                    Some(Err(e)) => warn!("Link check task failed: {}", e),
                    None => break,
                },
                _ = cancel.cancelled() => {
                    warn!(
                        "Link checks cancelled; waiting up to {:?} for in-flight checks",
                        self.links.grace_period()
                    );
                    let grace = tokio::time::sleep(self.links.grace_period());
                    tokio::pin!(grace);
                    loop {
                        tokio::select! {
                            joined = set.join_next() => match joined {
                                Some(Ok(outcome)) => collect(outcome),
                                Some(Err(e)) => debug!("Link check task ended: {}", e),
                                None => break,
                            },
                            _ = &mut grace => {
                                set.abort_all();
                                break;
                            }
                        }
                    }
                    break;
                }
            }
        }

        let mut stems: Vec<&String> = results.keys().collect();
        stems.sort();
        let mut issues = Vec::new();
        for stem in stems {
            let (url, status) = &results[stem];
            match status {
                LinkStatus::Reachable => link_metrics::reachable(),
                LinkStatus::Unreachable(reason) => {
                    link_metrics::unreachable();
                    issues.push(ValidationIssue::warning(
                        &record_file_name(stem),
                        FIELD_URL,
                        format!("unreachable link {}: {}", url, reason),
                    ));
                }
            }
        }

        if let Some(timer) = deadline {
            timer.abort();
        }

        let unresolved = total - results.len();
        if unresolved > 0 {
            link_metrics::unresolved(unresolved);
        }
        (issues, unresolved)
    }
}

/// Every file whose canonical URL is shared with another file gets one
/// error naming the others.
fn duplicate_url_issues(catalog: &CatalogIndex) -> Vec<ValidationIssue> {
    let mut by_url: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for stem in catalog.stems() {
        if let Some(url) = catalog.entry(stem).and_then(|e| e.canonical_url.as_deref()) {
            by_url.entry(url).or_default().push(stem);
        }
    }

    let mut issues = Vec::new();
    for (url, stems) in by_url {
        if stems.len() < 2 {
            continue;
        }
        for stem in &stems {
            let others: Vec<String> = stems
                .iter()
                .filter(|s| *s != stem)
                .map(|s| record_file_name(s))
                .collect();
            issues.push(ValidationIssue::error(
                &record_file_name(stem),
                RECORD_LEVEL_FIELD,
                format!("duplicate canonical url {} (also in {})", url, others.join(", ")),
            ));
        }
    }
    issues
}
