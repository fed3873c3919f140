//! The catalog handle: a loaded index of record file stems and canonical URLs.
//!
//! Built once per run from the catalog directory and passed explicitly to the
//! importer and the validator. The only mutation is `write_record`, which
//! appends the freshly written stem so later rows in the same run see it.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::constants::RECORD_EXTENSION;
use crate::error::{CatalogError, Result};
use crate::normalize::canonical_url;
use crate::types::ProjectRecord;

/// What the index knows about one record file without fully parsing it
#[derive(Debug, Clone, Default)]
pub struct IndexEntry {
    pub name: Option<String>,
    pub canonical_url: Option<String>,
}

/// A directory entry that cannot be a record (subdirectory, wrong extension)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignEntry {
    pub file_name: String,
    pub is_dir: bool,
}

#[derive(Debug)]
pub struct CatalogIndex {
    dir: PathBuf,
    entries: BTreeMap<String, IndexEntry>,
    by_url: HashMap<String, String>,
    foreign: Vec<ForeignEntry>,
}

impl CatalogIndex {
    /// Scan `dir`. Fails only if the directory itself cannot be read; record
    /// files that do not parse are still indexed so their stems stay taken.
    pub fn load(dir: &Path) -> Result<Self> {
        let not_accessible = |reason: String| CatalogError::CatalogDirectory {
            path: dir.to_path_buf(),
            reason,
        };

        if !dir.is_dir() {
            return Err(not_accessible("not a directory".to_string()));
        }

        let mut index = CatalogIndex {
            dir: dir.to_path_buf(),
            entries: BTreeMap::new(),
            by_url: HashMap::new(),
            foreign: Vec::new(),
        };

        let read_dir = fs::read_dir(dir).map_err(|e| not_accessible(e.to_string()))?;
        for entry in read_dir {
            let entry = entry.map_err(|e| not_accessible(e.to_string()))?;
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();

            if path.is_dir() {
                index.foreign.push(ForeignEntry { file_name, is_dir: true });
                continue;
            }

            let stem = match record_stem(&file_name) {
                Some(stem) => stem.to_string(),
                None => {
                    index.foreign.push(ForeignEntry { file_name, is_dir: false });
                    continue;
                }
            };

            let summary = summarize_file(&path);
            index.entries.insert(stem, summary);
        }
        index.foreign.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        // Stems are iterated in sorted order, so the first holder of a URL is stable
        for (stem, entry) in &index.entries {
            if let Some(url) = &entry.canonical_url {
                if let Some(first) = index.by_url.get(url) {
                    warn!("Catalog already holds {} twice ({} and {})", url, first, stem);
                    continue;
                }
                index.by_url.insert(url.clone(), stem.clone());
            }
        }

        debug!("Indexed {} record files in {}", index.entries.len(), dir.display());
        Ok(index)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_stem(&self, stem: &str) -> bool {
        self.entries.contains_key(stem)
    }

    /// Stem of the record that owns a canonical URL, if any
    pub fn stem_for_url(&self, canonical: &str) -> Option<&str> {
        self.by_url.get(canonical).map(|s| s.as_str())
    }

    pub fn entry(&self, stem: &str) -> Option<&IndexEntry> {
        self.entries.get(stem)
    }

    /// Record stems in alphabetical order
    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Entries that live in the catalog directory but are not record files
    pub fn foreign_entries(&self) -> &[ForeignEntry] {
        &self.foreign
    }

    pub fn record_path(&self, stem: &str) -> PathBuf {
        self.dir.join(record_file_name(stem))
    }

    pub fn read_record(&self, stem: &str) -> Result<ProjectRecord> {
        let content = fs::read_to_string(self.record_path(stem))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write a record and register its stem and URL in the index.
    pub fn write_record(&mut self, stem: &str, record: &ProjectRecord) -> Result<()> {
        let path = self.record_path(stem);
        fs::write(&path, to_record_json(record)?)?;
        debug!("Wrote {}", path.display());

        let canonical = canonical_url(&record.source.url_repository);
        if let Some(url) = &canonical {
            self.by_url.entry(url.clone()).or_insert_with(|| stem.to_string());
        }
        self.entries.insert(
            stem.to_string(),
            IndexEntry {
                name: Some(record.name.clone()),
                canonical_url: canonical,
            },
        );
        Ok(())
    }
}

pub fn record_file_name(stem: &str) -> String {
    format!("{}.{}", stem, RECORD_EXTENSION)
}

/// Stem of a record file name, or None if it does not carry the record extension
pub fn record_stem(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(RECORD_EXTENSION)?.strip_suffix('.')?;
    if stem.is_empty() {
        None
    } else {
        Some(stem)
    }
}

/// Serialize a record the way it is stored: 2-space indentation, stable key
/// order, trailing newline.
pub fn to_record_json(record: &ProjectRecord) -> Result<String> {
    let mut json = serde_json::to_string_pretty(record)?;
    json.push('\n');
    Ok(json)
}

fn summarize_file(path: &Path) -> IndexEntry {
    let parsed = fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok());

    let Some(value) = parsed else {
        debug!("Indexing unparsable record {}", path.display());
        return IndexEntry::default();
    };

    IndexEntry {
        name: value.get("name").and_then(Value::as_str).map(str::to_string),
        canonical_url: value
            .pointer("/source/url_repository")
            .and_then(Value::as_str)
            .and_then(canonical_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MaintenanceStatus, SourceInfo, SubmissionMetadata};
    use tempfile::tempdir;

    fn sample(name: &str, url: &str) -> ProjectRecord {
        ProjectRecord {
            name: name.to_string(),
            description: "A sample".to_string(),
            category: "web".to_string(),
            country: "France".to_string(),
            status: MaintenanceStatus::Active,
            source: SourceInfo {
                url_repository: url.to_string(),
                platform: "github".to_string(),
                license: Some("MIT".to_string()),
                language: None,
                url_documentation: None,
            },
            owner: None,
            metadata: SubmissionMetadata {
                filename: "sample.json".to_string(),
                source: "form".to_string(),
                submitted_at: "2024-03-01T10:00:00Z".to_string(),
            },
        }
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempdir().unwrap();
        let err = CatalogIndex::load(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, CatalogError::CatalogDirectory { .. }));
    }

    #[test]
    fn written_record_round_trips_and_is_indexed() {
        let dir = tempdir().unwrap();
        let mut index = CatalogIndex::load(dir.path()).unwrap();
        assert!(index.is_empty());
        let record = sample("Sample", "https://github.com/acme/sample");

        index.write_record("sample", &record).unwrap();

        assert!(!index.is_empty());
        assert!(index.contains_stem("sample"));
        assert_eq!(index.stem_for_url("https://github.com/acme/sample"), Some("sample"));
        assert_eq!(index.read_record("sample").unwrap(), record);

        let on_disk = fs::read_to_string(dir.path().join("sample.json")).unwrap();
        assert!(on_disk.ends_with("}\n"));
        assert!(on_disk.starts_with("{\n  \"name\": \"Sample\",\n  \"description\""));
    }

    #[test]
    fn load_indexes_urls_canonically_and_keeps_unparsable_stems() {
        let dir = tempdir().unwrap();
        let record = sample("Sample", "https://GitHub.com/acme/sample/");
        fs::write(dir.path().join("sample.json"), to_record_json(&record).unwrap()).unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("README.md"), "# notes").unwrap();
        fs::create_dir(dir.path().join("drafts")).unwrap();

        let index = CatalogIndex::load(dir.path()).unwrap();

        assert_eq!(index.len(), 2);
        assert!(index.contains_stem("broken"));
        assert_eq!(index.stem_for_url("https://github.com/acme/sample"), Some("sample"));
        assert_eq!(
            index.foreign_entries(),
            &[
                ForeignEntry { file_name: "README.md".to_string(), is_dir: false },
                ForeignEntry { file_name: "drafts".to_string(), is_dir: true },
            ]
        );
    }

    #[test]
    fn record_stem_requires_the_extension() {
        assert_eq!(record_stem("widget.json"), Some("widget"));
        assert_eq!(record_stem("widget.json.bak"), None);
        assert_eq!(record_stem(".json"), None);
        assert_eq!(record_stem("widgetjson"), None);
    }
}
