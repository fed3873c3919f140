use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::app::import_use_case::{ImportSummary, ImportUseCase};
use crate::app::ports::LinkChecker;
use crate::app::validate_use_case::{ValidateUseCase, ValidationReport};
use crate::catalog::CatalogIndex;
use crate::config::Config;
use crate::error::Result;
use crate::schema::RecordSchema;
use crate::submission::read_submission;

/// Entry points composing the catalog handle, the use cases and configuration.
/// Every `Err` returned here aborted the run before any row or file was
/// processed.
pub struct Pipeline;

impl Pipeline {
    /// Import a submission export into the catalog directory.
    #[instrument(skip(config), fields(csv = %csv_path.display(), catalog = %catalog_dir.display()))]
    pub fn import(
        csv_path: &Path,
        catalog_dir: &Path,
        overwrite: bool,
        config: &Config,
    ) -> Result<ImportSummary> {
        let mut catalog = CatalogIndex::load(catalog_dir)?;
        let rows = read_submission(csv_path, &config.columns)?;
        if catalog.is_empty() {
            info!("Importing {} rows into an empty catalog", rows.len());
        } else {
            info!("Importing {} rows into a catalog of {} records", rows.len(), catalog.len());
        }

        let use_case = ImportUseCase::new(config.rules.clone(), config.import.clone(), overwrite);
        Ok(use_case.run(&rows, &mut catalog))
    }

    /// Validate every record in the catalog directory. Link checks run only
    /// when a checker is supplied.
    #[instrument(skip(config, link_checker, cancel), fields(catalog = %catalog_dir.display()))]
    pub async fn validate(
        catalog_dir: &Path,
        config: &Config,
        link_checker: Option<Arc<dyn LinkChecker>>,
        cancel: CancellationToken,
    ) -> Result<ValidationReport> {
        let catalog = CatalogIndex::load(catalog_dir)?;
        let schema = RecordSchema::bundled()?;

        let mut use_case = ValidateUseCase::new(config.rules.clone(), config.links.clone(), schema);
        if let Some(checker) = link_checker {
            use_case = use_case.with_link_checker(checker);
        }
        Ok(use_case.run(&catalog, cancel).await)
    }
}
