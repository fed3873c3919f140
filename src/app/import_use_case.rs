use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::catalog::{record_file_name, CatalogIndex};
use crate::config::{ImportConfig, RulesConfig};
use crate::normalize::{
    canonical_url, candidate_stems, sanitize_description, sanitize_name, sanitize_text,
};
use crate::observability::metrics::importer as import_metrics;
use crate::submission::ImportRow;
use crate::types::{MaintenanceStatus, MergePolicy, Owner, OwnerKind, ProjectSubmission};

/// A row that could not be imported, with the line it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub row: u64,
    pub reason: String,
}

/// Result of one import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub updated: usize,
    pub skipped_duplicate: usize,
    pub rejected: Vec<RejectedRow>,
}

impl ImportSummary {
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }

    pub fn rows_seen(&self) -> usize {
        self.imported + self.updated + self.skipped_duplicate + self.rejected.len()
    }
}

/// What happened to a single row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Imported { stem: String },
    Updated { stem: String },
    SkippedDuplicate { stem: String },
    Rejected { reason: String },
}

/// Turns validated submission rows into catalog records.
pub struct ImportUseCase {
    rules: RulesConfig,
    import: ImportConfig,
    overwrite: bool,
    imported_at: DateTime<Utc>,
}

impl ImportUseCase {
    pub fn new(rules: RulesConfig, import: ImportConfig, overwrite: bool) -> Self {
        Self {
            rules,
            import,
            overwrite,
            imported_at: Utc::now(),
        }
    }

    /// Fix the clock used for `submitted_at` when a row carries no timestamp
    pub fn with_import_time(mut self, imported_at: DateTime<Utc>) -> Self {
        self.imported_at = imported_at;
        self
    }

    /// Process rows in order. Row problems are collected, never propagated.
    #[instrument(skip_all, fields(rows = rows.len(), overwrite = self.overwrite))]
    pub fn run(&self, rows: &[ImportRow], catalog: &mut CatalogIndex) -> ImportSummary {
        let mut summary = ImportSummary::default();

        for row in rows {
            match self.import_row(row, catalog) {
                RowOutcome::Imported { stem } => {
                    info!("✓ Created {}", record_file_name(&stem));
                    import_metrics::row_imported();
                    summary.imported += 1;
                }
                RowOutcome::Updated { stem } => {
                    info!("Updated {}", record_file_name(&stem));
                    import_metrics::row_updated();
                    summary.updated += 1;
                }
                RowOutcome::SkippedDuplicate { stem } => {
                    debug!("Row {} already catalogued as {}", row.position, stem);
                    import_metrics::row_skipped_duplicate();
                    summary.skipped_duplicate += 1;
                }
                RowOutcome::Rejected { reason } => {
                    warn!("Rejected row {}: {}", row.position, reason);
                    import_metrics::row_rejected();
                    summary.rejected.push(RejectedRow {
                        row: row.position,
                        reason,
                    });
                }
            }
        }

        info!(
            "Processed {} rows: {} imported, {} updated, {} rejected",
            summary.rows_seen(),
            summary.imported,
            summary.updated,
            summary.rejected.len()
        );
        summary
    }

    /// Normalize, place and write a single row.
    pub fn import_row(&self, row: &ImportRow, catalog: &mut CatalogIndex) -> RowOutcome {
        let submission = match self.normalize_row(row) {
            Ok(submission) => submission,
            Err(reason) => return RowOutcome::Rejected { reason },
        };

        // Same project already catalogued, possibly under another name
        let known = catalog.stem_for_url(&submission.url_repository).map(str::to_string);
        if let Some(stem) = known {
            return self.merge_into(&stem, &submission, catalog);
        }

        let free_stem = candidate_stems(&submission.name, &submission.url_repository)
            .into_iter()
            .find(|stem| !catalog.contains_stem(stem));
        let Some(stem) = free_stem else {
            return RowOutcome::Rejected {
                reason: format!("no free filename for {}", submission.name),
            };
        };

        let record = submission.into_record(record_file_name(&stem), self.import.source.clone());
        match catalog.write_record(&stem, &record) {
            Ok(()) => RowOutcome::Imported { stem },
            Err(e) => {
                error!("Failed to write {}: {}", record.metadata.filename, e);
                RowOutcome::Rejected {
                    reason: format!("failed to write {}: {}", record.metadata.filename, e),
                }
            }
        }
    }

    fn merge_into(
        &self,
        stem: &str,
        incoming: &ProjectSubmission,
        catalog: &mut CatalogIndex,
    ) -> RowOutcome {
        let existing = match catalog.read_record(stem) {
            Ok(existing) => existing,
            Err(e) => {
                return RowOutcome::Rejected {
                    reason: format!(
                        "existing record {} could not be read: {}",
                        record_file_name(stem),
                        e
                    ),
                }
            }
        };

        let merged = existing.merged_with(
            incoming,
            MergePolicy {
                overwrite: self.overwrite,
                protected_fields: &self.import.protected_fields,
            },
        );
        if merged == existing {
            return RowOutcome::SkippedDuplicate {
                stem: stem.to_string(),
            };
        }

        match catalog.write_record(stem, &merged) {
            Ok(()) => RowOutcome::Updated {
                stem: stem.to_string(),
            },
            Err(e) => RowOutcome::Rejected {
                reason: format!("failed to write {}: {}", record_file_name(stem), e),
            },
        }
    }

    /// Clean a raw row, or explain why the row is unusable. Optional columns
    /// left blank stay `None`.
    pub fn normalize_row(&self, row: &ImportRow) -> std::result::Result<ProjectSubmission, String> {
        let name = sanitize_name(&row.name);
        let url = sanitize_text(&row.url);
        let description = sanitize_description(&row.description);
        let category = sanitize_text(&row.category).to_lowercase();
        let country = sanitize_text(&row.country);

        let missing: Vec<&str> = [
            ("name", &name),
            ("url", &url),
            ("description", &description),
            ("category", &category),
            ("country", &country),
        ]
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| *field)
        .collect();
        match missing.len() {
            0 => {}
            1 => return Err(format!("missing required field: {}", missing[0])),
            _ => return Err(format!("missing required fields: {}", missing.join(", "))),
        }

        let canonical = canonical_url(&url).ok_or_else(|| format!("invalid url: {}", url))?;

        if !self.rules.is_allowed_category(&category) {
            return Err(format!("invalid category: {}", category));
        }

        let status = match non_blank(&row.status) {
            None => None,
            Some(raw) => Some(
                MaintenanceStatus::parse(&raw).ok_or_else(|| format!("invalid status: {}", raw))?,
            ),
        };

        let license = match non_blank(&row.license) {
            Some(raw) => Some(
                self.rules
                    .canonical_license(&raw)
                    .map(str::to_string)
                    .ok_or_else(|| format!("unrecognized license: {}", raw))?,
            ),
            None => None,
        };

        let platform = non_blank(&row.platform).map(|p| p.to_lowercase());
        let language = non_blank(&row.language);

        let url_documentation = match non_blank(&row.documentation_url) {
            Some(raw) => Some(
                canonical_url(&raw).ok_or_else(|| format!("invalid documentation url: {}", raw))?,
            ),
            None => None,
        };

        let owner = self.owner_from_row(row)?;

        Ok(ProjectSubmission {
            name,
            description,
            category,
            country,
            status,
            url_repository: canonical,
            platform,
            license,
            language,
            url_documentation,
            owner,
            submitted_at: self.submitted_at(row.timestamp.as_deref()),
        })
    }

    fn owner_from_row(&self, row: &ImportRow) -> std::result::Result<Option<Owner>, String> {
        let Some(raw_kind) = non_blank(&row.owner_type) else {
            return Ok(None);
        };
        let kind = OwnerKind::parse(&raw_kind)
            .ok_or_else(|| format!("invalid owner type: {}", raw_kind))?;

        let (name, website, description) = match kind {
            OwnerKind::Organization => (
                &row.organization_name,
                &row.organization_website,
                &row.organization_description,
            ),
            OwnerKind::Individual => (&row.individual_name, &None, &None),
            OwnerKind::Community => (
                &row.community_name,
                &row.community_website,
                &row.community_description,
            ),
        };

        let name = name.as_deref().map(sanitize_name).unwrap_or_default();
        if name.is_empty() {
            return Err("missing required field: owner.name".to_string());
        }

        let url_website = match non_blank(website) {
            Some(raw) => Some(
                canonical_url(&raw).ok_or_else(|| format!("invalid owner website: {}", raw))?,
            ),
            None => None,
        };

        let description = description
            .as_deref()
            .map(sanitize_description)
            .filter(|d| !d.is_empty());

        let is_a_startup = match (kind, non_blank(&row.organization_startup)) {
            (OwnerKind::Organization, Some(raw)) => Some(
                parse_yes_no(&raw).ok_or_else(|| format!("invalid startup answer: {}", raw))?,
            ),
            _ => None,
        };

        Ok(Some(Owner {
            kind,
            name,
            url_website,
            description,
            is_a_startup,
        }))
    }

    /// Normalize the form timestamp to RFC 3339 UTC; fall back to the import time.
    fn submitted_at(&self, raw: Option<&str>) -> String {
        let parsed = raw.map(str::trim).and_then(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    self.import
                        .date_order
                        .formats()
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                        .map(|naive| naive.and_utc())
                })
        });

        if parsed.is_none() {
            if let Some(raw) = raw {
                debug!("Unrecognized submission timestamp '{}', using import time", raw);
            }
        }

        parsed
            .unwrap_or(self.imported_at)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Sanitized value of an optional column, `None` when blank
fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(sanitize_text).filter(|v| !v.is_empty())
}

fn parse_yes_no(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}
