use serde::{Deserialize, Serialize};

use crate::constants::{
    FIELD_CATEGORY, FIELD_COUNTRY, FIELD_DESCRIPTION, FIELD_DOCUMENTATION, FIELD_LANGUAGE,
    FIELD_LICENSE, FIELD_OWNER, FIELD_PLATFORM, FIELD_STATUS,
};
use crate::normalize::{platform_for_host, url_host};

/// A single catalogued project, stored as one JSON file per record.
///
/// Field order here is the key order on disk; keep it stable so re-writes
/// produce clean diffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub name: String,
    pub description: String,
    pub category: String,
    pub country: String,
    pub status: MaintenanceStatus,
    pub source: SourceInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    pub metadata: SubmissionMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub url_repository: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "type")]
    pub kind: OwnerKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Only asked of organizations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_a_startup: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Organization,
    Individual,
    Community,
}

impl OwnerKind {
    /// Parse the free-text answer of the submission form
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "organization" | "organisation" | "company" => Some(OwnerKind::Organization),
            "individual" => Some(OwnerKind::Individual),
            "community" => Some(OwnerKind::Community),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceStatus {
    #[default]
    Active,
    Archived,
}

impl MaintenanceStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "active" => Some(MaintenanceStatus::Active),
            "archived" => Some(MaintenanceStatus::Archived),
            _ => None,
        }
    }
}

/// Where a record came from and when it was submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    pub filename: String,
    pub source: String,
    pub submitted_at: String,
}

/// What a submission row actually supplied. Blank optional columns stay
/// `None`, so defaults only ever reach brand-new records.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSubmission {
    pub name: String,
    pub description: String,
    pub category: String,
    pub country: String,
    pub status: Option<MaintenanceStatus>,
    /// Canonical form
    pub url_repository: String,
    pub platform: Option<String>,
    pub license: Option<String>,
    pub language: Option<String>,
    pub url_documentation: Option<String>,
    pub owner: Option<Owner>,
    pub submitted_at: String,
}

impl ProjectSubmission {
    /// Build a new record, filling status and platform defaults.
    pub fn into_record(self, filename: String, source: String) -> ProjectRecord {
        let platform = match self.platform {
            Some(platform) => platform,
            None => url_host(&self.url_repository)
                .map(|host| platform_for_host(&host))
                .unwrap_or_default(),
        };

        ProjectRecord {
            name: self.name,
            description: self.description,
            category: self.category,
            country: self.country,
            status: self.status.unwrap_or_default(),
            source: SourceInfo {
                url_repository: self.url_repository,
                platform,
                license: self.license,
                language: self.language,
                url_documentation: self.url_documentation,
            },
            owner: self.owner,
            metadata: SubmissionMetadata {
                filename,
                source,
                submitted_at: self.submitted_at,
            },
        }
    }
}

/// How a re-imported row is folded into an existing record
#[derive(Debug, Clone, Copy)]
pub struct MergePolicy<'a> {
    pub overwrite: bool,
    pub protected_fields: &'a [String],
}

impl MergePolicy<'_> {
    fn replaces(&self, field: &str, existing_present: bool) -> bool {
        if !existing_present {
            return true;
        }
        self.overwrite && !self.protected_fields.iter().any(|p| p == field)
    }
}

fn merge_text(existing: &mut String, incoming: &str, field: &str, policy: &MergePolicy<'_>) {
    if incoming.is_empty() {
        return;
    }
    if policy.replaces(field, !existing.trim().is_empty()) {
        *existing = incoming.to_string();
    }
}

fn merge_option<T: Clone>(
    existing: &mut Option<T>,
    incoming: &Option<T>,
    field: &str,
    policy: &MergePolicy<'_>,
) {
    if let Some(value) = incoming {
        if policy.replaces(field, existing.is_some()) {
            *existing = Some(value.clone());
        }
    }
}

impl ProjectRecord {
    /// Fold a submission into this record. `name`, the repository URL and
    /// `metadata` identify the record and are never touched; values the row
    /// left blank never replace anything.
    pub fn merged_with(
        &self,
        incoming: &ProjectSubmission,
        policy: MergePolicy<'_>,
    ) -> ProjectRecord {
        let mut merged = self.clone();
        let source = &mut merged.source;

        merge_text(&mut merged.description, &incoming.description, FIELD_DESCRIPTION, &policy);
        merge_text(&mut merged.category, &incoming.category, FIELD_CATEGORY, &policy);
        merge_text(&mut merged.country, &incoming.country, FIELD_COUNTRY, &policy);
        // Status always has a value on disk, so only an overwrite can change it
        if let Some(status) = incoming.status {
            if policy.replaces(FIELD_STATUS, true) {
                merged.status = status;
            }
        }
        if let Some(platform) = &incoming.platform {
            merge_text(&mut source.platform, platform, FIELD_PLATFORM, &policy);
        }
        merge_option(&mut source.license, &incoming.license, FIELD_LICENSE, &policy);
        merge_option(&mut source.language, &incoming.language, FIELD_LANGUAGE, &policy);
        merge_option(
            &mut source.url_documentation,
            &incoming.url_documentation,
            FIELD_DOCUMENTATION,
            &policy,
        );
        merge_option(&mut merged.owner, &incoming.owner, FIELD_OWNER, &policy);

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(description: &str, license: Option<&str>) -> ProjectRecord {
        ProjectRecord {
            name: "Ferris".to_string(),
            description: description.to_string(),
            category: "devtools".to_string(),
            country: "Germany".to_string(),
            status: MaintenanceStatus::Active,
            source: SourceInfo {
                url_repository: "https://github.com/acme/ferris".to_string(),
                platform: "github".to_string(),
                license: license.map(str::to_string),
                language: None,
                url_documentation: None,
            },
            owner: None,
            metadata: SubmissionMetadata {
                filename: "ferris.json".to_string(),
                source: "form".to_string(),
                submitted_at: "2024-01-01T00:00:00Z".to_string(),
            },
        }
    }

    fn submission(description: &str, license: Option<&str>) -> ProjectSubmission {
        ProjectSubmission {
            name: "Ferris".to_string(),
            description: description.to_string(),
            category: "devtools".to_string(),
            country: "Germany".to_string(),
            status: None,
            url_repository: "https://github.com/acme/ferris".to_string(),
            platform: None,
            license: license.map(str::to_string),
            language: None,
            url_documentation: None,
            owner: None,
            submitted_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn merge_without_overwrite_only_fills_absent_fields() {
        let existing = record("Hand curated", None);
        let incoming = submission("Stale form text", Some("MIT"));
        let merged = existing.merged_with(
            &incoming,
            MergePolicy { overwrite: false, protected_fields: &[] },
        );
        assert_eq!(merged.description, "Hand curated");
        assert_eq!(merged.source.license.as_deref(), Some("MIT"));
    }

    #[test]
    fn overwrite_respects_protected_fields() {
        let existing = record("Hand curated", Some("MIT"));
        let mut incoming = submission("New text", Some("Apache-2.0"));
        incoming.status = Some(MaintenanceStatus::Archived);
        let protected = vec![FIELD_DESCRIPTION.to_string()];
        let merged = existing.merged_with(
            &incoming,
            MergePolicy { overwrite: true, protected_fields: &protected },
        );
        assert_eq!(merged.description, "Hand curated");
        assert_eq!(merged.source.license.as_deref(), Some("Apache-2.0"));
        assert_eq!(merged.status, MaintenanceStatus::Archived);
    }

    #[test]
    fn overwrite_never_applies_defaults_for_blank_columns() {
        let mut existing = record("Hand curated", Some("MIT"));
        existing.status = MaintenanceStatus::Archived;
        existing.source.platform = "self-hosted".to_string();

        let merged = existing.merged_with(
            &submission("Hand curated", Some("MIT")),
            MergePolicy { overwrite: true, protected_fields: &[] },
        );
        assert_eq!(merged.status, MaintenanceStatus::Archived);
        assert_eq!(merged.source.platform, "self-hosted");
        assert_eq!(merged, existing);
    }

    #[test]
    fn new_record_gets_status_and_platform_defaults() {
        let record =
            submission("Text", None).into_record("ferris.json".to_string(), "form".to_string());
        assert_eq!(record.status, MaintenanceStatus::Active);
        assert_eq!(record.source.platform, "github");
        assert_eq!(record.metadata.filename, "ferris.json");
        assert_eq!(record.metadata.source, "form");

        let mut supplied = submission("Text", None);
        supplied.status = Some(MaintenanceStatus::Archived);
        supplied.platform = Some("forgejo".to_string());
        let record = supplied.into_record("ferris.json".to_string(), "form".to_string());
        assert_eq!(record.status, MaintenanceStatus::Archived);
        assert_eq!(record.source.platform, "forgejo");
    }

    #[test]
    fn resubmitting_stored_values_is_a_no_op() {
        let existing = record("Same", Some("MIT"));
        let mut incoming = submission("Same", Some("MIT"));
        incoming.status = Some(MaintenanceStatus::Active);
        incoming.platform = Some("github".to_string());
        let merged = existing.merged_with(
            &incoming,
            MergePolicy { overwrite: true, protected_fields: &[] },
        );
        assert_eq!(merged, existing);
    }

    #[test]
    fn owner_kind_accepts_form_spellings() {
        assert_eq!(OwnerKind::parse("Organization"), Some(OwnerKind::Organization));
        assert_eq!(OwnerKind::parse(" individual "), Some(OwnerKind::Individual));
        assert_eq!(OwnerKind::parse("Nobody"), None);
    }
}
