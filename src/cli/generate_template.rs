//! generate-template subcommand
//!
//! Emits a flat JSON secret template with one key per placeholder.

use super::{EXIT_ERROR, EXIT_OK, resolve_config_target};
use crate::config::read_required_json_file;
use crate::placeholders::{find_placeholders, secret_template};
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the generate-template subcommand
#[derive(Args, Debug)]
pub struct GenerateTemplateArgs {
    /// Local config file path (default: ./config/{env}.json)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Environment (default: APP_ENV or "local")
    #[arg(short, long, value_name = "ENV")]
    pub env: Option<String>,

    /// Output file path (stdout if not specified)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Run the generate-template command and return its exit code.
pub async fn run(args: GenerateTemplateArgs) -> u8 {
    match execute(&args).await {
        Ok(()) => EXIT_OK,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            EXIT_ERROR
        }
    }
}

async fn execute(args: &GenerateTemplateArgs) -> Result<()> {
    let (_, config_path) = resolve_config_target(args.config.as_ref(), args.env.as_deref());
    let config = read_required_json_file(&config_path).await?;

    let placeholders = find_placeholders(&config);
    if placeholders.is_empty() {
        eprintln!("No <aws_secret_manager> placeholders found in config.");
        return Ok(());
    }

    let rendered = serde_json::to_string_pretty(&secret_template(&placeholders))?;
    match args.output {
        Some(ref path) => {
            let path = std::path::absolute(path)
                .with_context(|| format!("invalid output path {}", path.display()))?;
            tokio::fs::write(&path, format!("{}\n", rendered))
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Template written to: {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
