/// Catalog-wide constants shared by the importer, validator and reporter.

/// Extension every record file carries
pub const RECORD_EXTENSION: &str = "json";

/// Default catalog location, relative to the repository root
pub const DEFAULT_CATALOG_DIR: &str = "awesome/projects";

/// Default configuration file, optional when not passed explicitly
pub const DEFAULT_CONFIG_PATH: &str = "catalog.toml";

/// Stem used when a name has no ASCII alphanumerics at all
pub const FALLBACK_SLUG: &str = "project";

/// Length of the URL hash appended on the last disambiguation step
pub const URL_HASH_SUFFIX_LEN: usize = 6;

/// Pseudo-field used for issues spanning more than one record
pub const RECORD_LEVEL_FIELD: &str = "<record>";

// Process exit codes
pub const EXIT_CLEAN: i32 = 0;
pub const EXIT_CONTENT_ISSUES: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

// Record field paths, as they appear in record files and in issue reports
pub const FIELD_NAME: &str = "name";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_COUNTRY: &str = "country";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_URL: &str = "source.url_repository";
pub const FIELD_PLATFORM: &str = "source.platform";
pub const FIELD_LICENSE: &str = "source.license";
pub const FIELD_LANGUAGE: &str = "source.language";
pub const FIELD_DOCUMENTATION: &str = "source.url_documentation";
pub const FIELD_OWNER: &str = "owner";
pub const FIELD_METADATA_FILENAME: &str = "metadata.filename";

/// Categories accepted when the configuration does not override them
pub fn default_categories() -> Vec<String> {
    [
        "ai",
        "cloud",
        "communication",
        "database",
        "devtools",
        "education",
        "finance",
        "gaming",
        "health",
        "infrastructure",
        "library",
        "media",
        "mobile",
        "networking",
        "operating-system",
        "productivity",
        "science",
        "security",
        "web",
        "other",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// SPDX identifiers accepted when the configuration does not override them
pub fn default_licenses() -> Vec<String> {
    [
        "AGPL-3.0",
        "Apache-2.0",
        "BSD-2-Clause",
        "BSD-3-Clause",
        "BSL-1.0",
        "CC0-1.0",
        "EPL-2.0",
        "EUPL-1.2",
        "GPL-2.0",
        "GPL-3.0",
        "ISC",
        "LGPL-2.1",
        "LGPL-3.0",
        "MIT",
        "MPL-2.0",
        "Unlicense",
        "Zlib",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Fields a re-import keeps even with `--overwrite`, unless configured otherwise
pub fn default_protected_fields() -> Vec<String> {
    vec![
        FIELD_DESCRIPTION.to_string(),
        FIELD_CATEGORY.to_string(),
        FIELD_STATUS.to_string(),
    ]
}
