//! Reading the tabular submission export.
//!
//! The header is resolved once into a `ColumnMap`; rows are then read by
//! index. Any problem with the file as a whole (unreadable, not UTF-8,
//! inconsistent row widths, missing required columns) aborts the import
//! before a single row is processed.

use csv::{ReaderBuilder, StringRecord};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::config::ColumnsConfig;
use crate::error::{CatalogError, Result};

/// Column positions for every target field. Optional columns may be absent
/// from the export.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    name: usize,
    url: usize,
    description: usize,
    category: usize,
    country: usize,
    license: Option<usize>,
    status: Option<usize>,
    platform: Option<usize>,
    language: Option<usize>,
    documentation_url: Option<usize>,
    timestamp: Option<usize>,
    owner_type: Option<usize>,
    organization_name: Option<usize>,
    organization_website: Option<usize>,
    organization_description: Option<usize>,
    organization_startup: Option<usize>,
    individual_name: Option<usize>,
    community_name: Option<usize>,
    community_website: Option<usize>,
    community_description: Option<usize>,
}

impl ColumnMap {
    /// Resolve header names. Every missing required column is reported at once.
    pub fn from_headers(headers: &StringRecord, columns: &ColumnsConfig) -> Result<Self> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted.trim()))
        };

        let mut missing = Vec::new();
        let mut required = |wanted: &str| match find(wanted) {
            Some(i) => i,
            None => {
                missing.push(wanted.to_string());
                0
            }
        };

        let name = required(&columns.name);
        let url = required(&columns.url);
        let description = required(&columns.description);
        let category = required(&columns.category);
        let country = required(&columns.country);

        if !missing.is_empty() {
            return Err(CatalogError::MissingColumns(missing));
        }

        Ok(ColumnMap {
            name,
            url,
            description,
            category,
            country,
            license: find(&columns.license),
            status: find(&columns.status),
            platform: find(&columns.platform),
            language: find(&columns.language),
            documentation_url: find(&columns.documentation_url),
            timestamp: find(&columns.timestamp),
            owner_type: find(&columns.owner_type),
            organization_name: find(&columns.organization_name),
            organization_website: find(&columns.organization_website),
            organization_description: find(&columns.organization_description),
            organization_startup: find(&columns.organization_startup),
            individual_name: find(&columns.individual_name),
            community_name: find(&columns.community_name),
            community_website: find(&columns.community_website),
            community_description: find(&columns.community_description),
        })
    }

    fn row(&self, position: u64, record: &StringRecord) -> ImportRow {
        let get = |i: usize| record.get(i).unwrap_or_default().to_string();
        let opt = |i: Option<usize>| i.map(get).filter(|v| !v.trim().is_empty());

        ImportRow {
            position,
            name: get(self.name),
            url: get(self.url),
            description: get(self.description),
            category: get(self.category),
            country: get(self.country),
            license: opt(self.license),
            status: opt(self.status),
            platform: opt(self.platform),
            language: opt(self.language),
            documentation_url: opt(self.documentation_url),
            timestamp: opt(self.timestamp),
            owner_type: opt(self.owner_type),
            organization_name: opt(self.organization_name),
            organization_website: opt(self.organization_website),
            organization_description: opt(self.organization_description),
            organization_startup: opt(self.organization_startup),
            individual_name: opt(self.individual_name),
            community_name: opt(self.community_name),
            community_website: opt(self.community_website),
            community_description: opt(self.community_description),
        }
    }
}

/// One raw, unnormalized submission row. `position` is the line the row
/// starts on in the source file (the header is line 1).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRow {
    pub position: u64,
    pub name: String,
    pub url: String,
    pub description: String,
    pub category: String,
    pub country: String,
    pub license: Option<String>,
    pub status: Option<String>,
    pub platform: Option<String>,
    pub language: Option<String>,
    pub documentation_url: Option<String>,
    pub timestamp: Option<String>,
    pub owner_type: Option<String>,
    pub organization_name: Option<String>,
    pub organization_website: Option<String>,
    pub organization_description: Option<String>,
    pub organization_startup: Option<String>,
    pub individual_name: Option<String>,
    pub community_name: Option<String>,
    pub community_website: Option<String>,
    pub community_description: Option<String>,
}

/// Load every row of a submission export.
pub fn read_submission(path: &Path, columns: &ColumnsConfig) -> Result<Vec<ImportRow>> {
    info!("Loading submissions from {}", path.display());
    let content = fs::read_to_string(path)?;
    parse_submission(&content, columns)
}

/// Parse submission rows from CSV text.
pub fn parse_submission(content: &str, columns: &ColumnsConfig) -> Result<Vec<ImportRow>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let map = ColumnMap::from_headers(&headers, columns)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let position = record.position().map(|p| p.line()).unwrap_or_default();
        rows.push(map.row(position, &record));
    }

    debug!("Parsed {} submission rows", rows.len());
    Ok(rows)
}
