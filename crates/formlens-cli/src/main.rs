use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use formlens_analytics::{FieldAnalyticsService, InMemoryResponseStore, InMemorySchemaStore};
use formlens_core::{init_tracing, ConfigManager, FormResponse, FormSchema};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(name = "formlens")]
#[command(about = "FormLens - field-level analytics for form responses", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to .formlens.toml or ~/.formlens/config.toml)
    #[arg(short, long, global = true, env = "FORMLENS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze exported responses against a form schema
    Report {
        /// JSON file holding the form schema (`{"pages": [...]}`)
        #[arg(short, long)]
        schema: PathBuf,

        /// JSON file holding an array of responses
        #[arg(short, long)]
        responses: PathBuf,

        /// Only analyze this field
        #[arg(short, long)]
        field: Option<String>,

        /// Form id reported in the output
        #[arg(long, default_value = "form")]
        form_id: String,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::from_file(path),
        None => ConfigManager::load(),
    }
    .context("Failed to load configuration")?;
    init_tracing(&manager.config().logging);

    match execute_command(&cli.command, &manager).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn execute_command(command: &Commands, manager: &ConfigManager) -> Result<String> {
    match command {
        Commands::Report {
            schema,
            responses,
            field,
            form_id,
            pretty,
        } => {
            let value = run_report(manager, schema, responses, field.as_deref(), form_id).await?;
            let rendered = if *pretty {
                serde_json::to_string_pretty(&value)?
            } else {
                serde_json::to_string(&value)?
            };
            Ok(rendered)
        }
        Commands::Config => manager
            .to_toml()
            .context("Failed to render configuration"),
    }
}

async fn run_report(
    manager: &ConfigManager,
    schema_path: &Path,
    responses_path: &Path,
    field: Option<&str>,
    form_id: &str,
) -> Result<serde_json::Value> {
    let schema: FormSchema = read_json(schema_path)?;
    let responses: Vec<FormResponse> = read_json(responses_path)?;
    debug!(
        fields = schema.fields().count(),
        responses = responses.len(),
        "Loaded form export"
    );

    let schemas = InMemorySchemaStore::new();
    schemas.set_schema(form_id, schema);
    let store = InMemoryResponseStore::new();
    store.extend(form_id, responses);

    let service =
        FieldAnalyticsService::new(Arc::new(store), Arc::new(schemas), manager.config());

    let value = match field {
        Some(field_id) => serde_json::to_value(
            service
                .get_field_analytics_by_id(form_id, field_id)
                .await
                .with_context(|| format!("Failed to analyze field '{}'", field_id))?,
        )?,
        None => serde_json::to_value(
            service
                .get_all_fields_analytics(form_id)
                .await
                .context("Failed to analyze form")?,
        )?,
    };
    Ok(value)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
