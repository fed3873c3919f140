use anyhow::{Context, Result};
use clap::Parser;
use oss_catalog::schema::RecordSchema;
use serde_json::Value;
use std::{fs, path::PathBuf};

/// Validate a single project record file against the record schema.
#[derive(Parser, Debug)]
#[command(
    name = "validate-record",
    version,
    about = "Validate a record JSON file against the schema"
)]
struct Cli {
    /// Path to the record JSON file to validate
    path: PathBuf,

    /// Optional path to a schema file (defaults to the bundled project.v1 schema)
    #[arg(long)]
    schema: Option<PathBuf>,
}

fn load_json(path: &PathBuf) -> Result<Value> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let json: Value = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
    Ok(json)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let schema = match &args.schema {
        Some(path) => RecordSchema::from_value(load_json(path)?),
        None => RecordSchema::bundled(),
    }
    .context("Failed to compile JSON Schema")?;

    let instance = load_json(&args.path)?;

    let violations = schema.violations(&instance);
    if violations.is_empty() {
        println!("valid");
        return Ok(());
    }

    eprintln!("invalid:");
    for violation in violations {
        eprintln!("- {} at {}", violation.message, violation.field);
    }
    std::process::exit(1)
}
