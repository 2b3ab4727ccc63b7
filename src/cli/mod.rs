//! CLI command definitions for strata
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.
//!
//! Every command returns a process exit code:
//! `0` success or no differences, `1` differences or missing keys,
//! `2` operational error.

pub mod compare_configs;
pub mod compare_secret;
pub mod generate_template;

use crate::config::{DEFAULT_MANIFEST_FILE, resolve_env};
use crate::secrets::{CommandSecretStore, DEFAULT_REGION, FileSecretStore, SecretStore};
use clap::{Args, Parser, Subcommand};
use compare_configs::CompareConfigsArgs;
use compare_secret::CompareSecretArgs;
use generate_template::GenerateTemplateArgs;
use std::path::PathBuf;
use std::sync::Arc;

/// Success, or nothing to report.
pub const EXIT_OK: u8 = 0;
/// Differences or missing keys were found.
pub const EXIT_FINDINGS: u8 = 1;
/// The command could not complete.
pub const EXIT_ERROR: u8 = 2;

/// Layered configuration tools: compare environments and reconcile secrets
#[derive(Parser, Debug)]
#[command(name = "strata", author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare the merged configs of two environments
    CompareConfigs(CompareConfigsArgs),

    /// Find placeholder keys missing from the secret store
    CompareSecret(CompareSecretArgs),

    /// Generate a secret template from <aws_secret_manager> placeholders
    GenerateTemplate(GenerateTemplateArgs),
}

impl Command {
    /// Run the selected command and return its exit code.
    pub async fn run(self) -> u8 {
        match self {
            Command::CompareConfigs(args) => compare_configs::run(args).await,
            Command::CompareSecret(args) => compare_secret::run(args).await,
            Command::GenerateTemplate(args) => generate_template::run(args).await,
        }
    }
}

/// Secret store selection shared by commands that read secrets.
#[derive(Args, Debug, Clone)]
pub struct SecretStoreArgs {
    /// AWS region
    #[arg(short, long, default_value = DEFAULT_REGION)]
    pub region: String,

    /// AWS CLI profile
    #[arg(long, value_name = "PROFILE")]
    pub aws_profile: Option<String>,

    /// Read secrets from <DIR>/<secret name>.json instead of AWS
    #[arg(long, value_name = "DIR")]
    pub secrets_dir: Option<PathBuf>,

    /// Package manifest used to derive secret names (default: ./package.json)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_MANIFEST_FILE)]
    pub manifest: PathBuf,
}

impl SecretStoreArgs {
    /// Build the selected secret store.
    pub fn store(&self) -> Arc<dyn SecretStore> {
        match self.secrets_dir {
            Some(ref dir) => Arc::new(FileSecretStore::new(dir)),
            None => {
                let mut store = CommandSecretStore::new(&self.region);
                if let Some(ref profile) = self.aws_profile {
                    store = store.with_profile(profile);
                }
                Arc::new(store)
            }
        }
    }
}

/// Default config file for an environment: `./config/<env>.json`.
pub fn default_config_path(env: &str) -> PathBuf {
    PathBuf::from(crate::config::DEFAULT_CONFIG_DIR).join(format!("{}.json", env))
}

/// Resolve the `--env` option and the config file it selects.
pub fn resolve_config_target(config: Option<&PathBuf>, env: Option<&str>) -> (String, PathBuf) {
    let env = resolve_env(env);
    let path = config
        .cloned()
        .unwrap_or_else(|| default_config_path(&env));
    (env, path)
}
