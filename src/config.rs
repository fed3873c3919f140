use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants::{
    default_categories, default_licenses, default_protected_fields, DEFAULT_CONFIG_PATH,
};
use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub import: ImportConfig,
    pub columns: ColumnsConfig,
    pub rules: RulesConfig,
    pub links: LinksConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Record fields that keep their curated value even when overwriting
    pub protected_fields: Vec<String>,
    /// Label stored in `metadata.source` for newly written records
    pub source: String,
    /// How slash-separated form timestamps such as `05/06/2024` are read
    pub date_order: DateOrder,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            protected_fields: default_protected_fields(),
            source: "form".to_string(),
            date_order: DateOrder::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateOrder {
    /// `MM/DD/YYYY`, as spreadsheet exports of US-locale forms produce
    #[default]
    MonthFirst,
    /// `DD/MM/YYYY`
    DayFirst,
}

impl DateOrder {
    /// Timestamp formats tried after RFC 3339, in order
    pub fn formats(&self) -> &'static [&'static str] {
        match self {
            DateOrder::MonthFirst => &["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"],
            DateOrder::DayFirst => &["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S"],
        }
    }
}

/// Header names of the submission export, one per target field.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub name: String,
    pub url: String,
    pub description: String,
    pub category: String,
    pub country: String,
    pub license: String,
    pub status: String,
    pub platform: String,
    pub language: String,
    pub documentation_url: String,
    pub timestamp: String,
    pub owner_type: String,
    pub organization_name: String,
    pub organization_website: String,
    pub organization_description: String,
    pub organization_startup: String,
    pub individual_name: String,
    pub community_name: String,
    pub community_website: String,
    pub community_description: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            name: "Name".to_string(),
            url: "Repository url".to_string(),
            description: "Description".to_string(),
            category: "Category".to_string(),
            country: "Country".to_string(),
            license: "License".to_string(),
            status: "Status".to_string(),
            platform: "Platform".to_string(),
            language: "Language".to_string(),
            documentation_url: "Documentation url".to_string(),
            timestamp: "Timestamp".to_string(),
            owner_type: "Who is the owner of this project?".to_string(),
            organization_name: "Company Name".to_string(),
            organization_website: "Company Website".to_string(),
            organization_description: "Company Description".to_string(),
            organization_startup: "Your company is a Startup?".to_string(),
            individual_name: "Owner Full Name or Username".to_string(),
            community_name: "Community Name".to_string(),
            community_website: "Community Website".to_string(),
            community_description: "Community Description".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub allowed_categories: Vec<String>,
    pub recognized_licenses: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            allowed_categories: default_categories(),
            recognized_licenses: default_licenses(),
        }
    }
}

impl RulesConfig {
    pub fn is_allowed_category(&self, category: &str) -> bool {
        self.allowed_categories.iter().any(|c| c == category)
    }

    /// Canonical spelling of a license identifier, matched case-insensitively
    pub fn canonical_license(&self, license: &str) -> Option<&str> {
        self.recognized_licenses
            .iter()
            .find(|l| l.eq_ignore_ascii_case(license))
            .map(|l| l.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub timeout_secs: u64,
    pub retries: u32,
    pub concurrency: usize,
    pub grace_period_ms: u64,
    /// Deadline for the whole link-check phase; unlimited when unset
    pub max_duration_ms: Option<u64>,
    pub user_agent: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            retries: 1,
            concurrency: 8,
            grace_period_ms: 2000,
            max_duration_ms: None,
            user_agent: concat!("oss_catalog/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl LinksConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_ms.map(Duration::from_millis)
    }
}

impl Config {
    /// Load configuration. An explicit path must exist; the default path is
    /// optional and falls back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        if !explicit && !config_path.exists() {
            return Ok(Config::default());
        }

        let config_content = fs::read_to_string(config_path).map_err(|e| {
            CatalogError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.rules.allowed_categories.is_empty() {
            return Err(CatalogError::Config(
                "rules.allowed_categories must not be empty".to_string(),
            ));
        }
        if self.links.concurrency == 0 {
            return Err(CatalogError::Config(
                "links.concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
