//! compare-secret subcommand
//!
//! Lists `<aws_secret_manager>` placeholders in a config file that have no
//! matching key in the environment's secret.

use super::{EXIT_ERROR, EXIT_FINDINGS, EXIT_OK, SecretStoreArgs, resolve_config_target};
use crate::config::{package_name, read_required_json_file, resolve_secret_name};
use crate::error::{ConfigError, ErrorCode};
use crate::format::{OutputFormat, to_json_line};
use crate::placeholders::{find_placeholders, missing_keys};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// Arguments for the compare-secret subcommand
#[derive(Args, Debug)]
pub struct CompareSecretArgs {
    /// Local config file path (default: ./config/{env}.json)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Secret name (default: {packageName}/{env})
    #[arg(short, long, value_name = "NAME")]
    pub secret: Option<String>,

    /// Environment (default: APP_ENV or "local")
    #[arg(short, long, value_name = "ENV")]
    pub env: Option<String>,

    #[command(flatten)]
    pub store: SecretStoreArgs,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    pub output: OutputFormat,
}

/// Result of reconciling placeholders against a secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The config has no placeholders
    NoPlaceholders,
    /// Every placeholder has a key in the secret
    Complete { secret: String },
    /// Placeholders without a key in the secret
    Missing { secret: String, keys: Vec<String> },
}

#[derive(Debug, Serialize)]
struct SecretReport<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
    message: String,
    missing: &'a [String],
}

/// Run the compare-secret command and return its exit code.
pub async fn run(args: CompareSecretArgs) -> u8 {
    match execute(&args).await {
        Ok(outcome) => {
            report(args.output, &outcome);
            match outcome {
                Reconciliation::Missing { .. } => EXIT_FINDINGS,
                _ => EXIT_OK,
            }
        }
        Err(err) => {
            match args.output {
                OutputFormat::Json => {
                    let report = SecretReport {
                        status: "error",
                        code: err.downcast_ref::<ConfigError>().map(ConfigError::code),
                        message: err.to_string(),
                        missing: &[],
                    };
                    println!("{}", to_json_line(&report));
                }
                OutputFormat::Text => eprintln!("Error: {}", err),
            }
            EXIT_ERROR
        }
    }
}

async fn execute(args: &CompareSecretArgs) -> Result<Reconciliation> {
    let (env, config_path) = resolve_config_target(args.config.as_ref(), args.env.as_deref());
    debug!(env = %env, config = %config_path.display(), "Checking placeholders");

    let config = read_required_json_file(&config_path).await?;
    let placeholders = find_placeholders(&config);
    if placeholders.is_empty() {
        return Ok(Reconciliation::NoPlaceholders);
    }

    let secret = resolve_secret_name(
        args.secret.as_deref(),
        || package_name(&args.store.manifest),
        &env,
    )
    .await?;
    let payload = args.store.store().fetch(&secret).await?;

    let keys = missing_keys(&placeholders, &payload);
    if keys.is_empty() {
        Ok(Reconciliation::Complete { secret })
    } else {
        Ok(Reconciliation::Missing { secret, keys })
    }
}

fn report(output: OutputFormat, outcome: &Reconciliation) {
    match (output, outcome) {
        (OutputFormat::Json, Reconciliation::NoPlaceholders) => println!(
            "{}",
            to_json_line(&SecretReport {
                status: "ok",
                code: None,
                message: "No placeholders found in config".to_string(),
                missing: &[],
            })
        ),
        (OutputFormat::Json, Reconciliation::Complete { .. }) => println!(
            "{}",
            to_json_line(&SecretReport {
                status: "ok",
                code: None,
                message: "All placeholders present in secret".to_string(),
                missing: &[],
            })
        ),
        (OutputFormat::Json, Reconciliation::Missing { keys, .. }) => println!(
            "{}",
            to_json_line(&SecretReport {
                status: "missing",
                code: None,
                message: format!("{} placeholder(s) missing", keys.len()),
                missing: keys,
            })
        ),
        (OutputFormat::Text, Reconciliation::NoPlaceholders) => {
            println!("No <aws_secret_manager> placeholders found in config.");
        }
        (OutputFormat::Text, Reconciliation::Complete { secret }) => {
            println!("All placeholders are present in secret \"{}\".", secret);
        }
        (OutputFormat::Text, Reconciliation::Missing { secret, keys }) => {
            println!("Missing keys in secret \"{}\":", secret);
            for key in keys {
                println!("  - {}", key);
            }
        }
    }
}
