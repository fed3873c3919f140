use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use oss_catalog::app::ports::LinkChecker;
use oss_catalog::config::Config;
use oss_catalog::constants::DEFAULT_CATALOG_DIR;
use oss_catalog::error::Result;
use oss_catalog::infra::http_client::ReqwestLinkChecker;
use oss_catalog::logging;
use oss_catalog::pipeline::Pipeline;
use oss_catalog::report::{render, Rendered, RunOutcome};

#[derive(Parser)]
#[command(name = "oss_catalog")]
#[command(about = "Import and validate the open-source project catalog")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to catalog.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a submission export into the catalog
    Import {
        /// Path to the CSV export
        #[arg(long)]
        csv: PathBuf,
        /// Catalog directory holding one JSON file per project
        #[arg(long, default_value = DEFAULT_CATALOG_DIR)]
        catalog: PathBuf,
        /// Let re-imports replace existing, non-protected fields
        #[arg(long)]
        overwrite: bool,
    },
    /// Validate every record in the catalog
    Validate {
        /// Catalog directory holding one JSON file per project
        #[arg(long, default_value = DEFAULT_CATALOG_DIR)]
        catalog: PathBuf,
        /// Check every repository URL over HTTP
        #[arg(long)]
        check_links: bool,
    },
}

async fn run(cli: Cli) -> Result<Rendered> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Import {
            csv,
            catalog,
            overwrite,
        } => {
            info!("Starting import from {}", csv.display());
            let summary = Pipeline::import(&csv, &catalog, overwrite, &config)?;
            Ok(render(RunOutcome::Import(&summary)))
        }
        Commands::Validate {
            catalog,
            check_links,
        } => {
            let cancel = CancellationToken::new();
            let checker: Option<Arc<dyn LinkChecker>> = if check_links {
                let http = ReqwestLinkChecker::new(&config.links)?;
                // Only link checks are cancellable; otherwise Ctrl-C keeps its default
                let on_interrupt = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupted; no further link checks will be started");
                        on_interrupt.cancel();
                    }
                });
                Some(Arc::new(http))
            } else {
                None
            };

            info!("Validating {}", catalog.display());
            let report = Pipeline::validate(&catalog, &config, checker, cancel).await?;
            Ok(render(RunOutcome::Validation(&report)))
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    let rendered = match run(cli).await {
        Ok(rendered) => rendered,
        Err(e) => {
            error!("Run aborted: {}", e);
            render(RunOutcome::Aborted(&e))
        }
    };

    print!("{}", rendered.text);
    std::process::exit(rendered.exit_code);
}
