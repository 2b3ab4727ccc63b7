//! compare-configs subcommand
//!
//! Merges the configuration of two environments and reports every path
//! whose value differs.

use super::{EXIT_ERROR, EXIT_FINDINGS, EXIT_OK, SecretStoreArgs};
use crate::config::{
    ConfigMerger, ConfigSource, DEFAULT_CONFIG_DIR, DEFAULT_RC_FILE, MergeOptions, MergerOptions,
    parse_order, render_secret_template,
};
use crate::diff::render::render_table;
use crate::diff::{self, DiffEntry, DiffStatus, ObjectDiff, PropertyDiff};
use crate::error::ErrorReport;
use crate::format::{OutputFormat, to_json_line};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// Arguments for the compare-configs subcommand
#[derive(Args, Debug)]
pub struct CompareConfigsArgs {
    /// First environment
    #[arg(long, value_name = "ENV")]
    pub env1: String,

    /// Second environment
    #[arg(long, value_name = "ENV")]
    pub env2: String,

    /// Config directory
    #[arg(short = 'd', long, default_value = DEFAULT_CONFIG_DIR, value_name = "PATH")]
    pub config_dir: PathBuf,

    /// Local override file
    #[arg(long, default_value = DEFAULT_RC_FILE, value_name = "FILE")]
    pub rc: PathBuf,

    /// Secret name template with {env} placeholder (default: {packageName}/{env})
    #[arg(short, long = "secret", value_name = "TEMPLATE")]
    pub secret_template: Option<String>,

    #[command(flatten)]
    pub store: SecretStoreArgs,

    /// Comma-separated merge sources
    #[arg(long, default_value = "default,env,secrets", value_delimiter = ',', value_name = "LIST")]
    pub sources: Vec<String>,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    pub output: OutputFormat,
}

impl CompareConfigsArgs {
    fn merger(&self, env: &str) -> ConfigMerger {
        let mut options = MergerOptions::default()
            .with_config_dir(&self.config_dir)
            .with_rc_path(&self.rc)
            .with_manifest_path(&self.store.manifest)
            .with_env(env);
        if let Some(ref template) = self.secret_template {
            options = options.with_secret_name(render_secret_template(template, env));
        }
        ConfigMerger::new(options, self.store.store())
    }
}

#[derive(Debug, Serialize)]
struct CompareReport<'a> {
    env1: &'a str,
    env2: &'a str,
    status: DiffStatus,
    diff: &'a [PropertyDiff],
    entries: Vec<DiffEntry>,
}

/// Run the compare-configs command and return its exit code.
pub async fn run(args: CompareConfigsArgs) -> u8 {
    match execute(&args).await {
        Ok((order, diff)) => {
            report(&args, &order, &diff);
            if diff.has_differences() {
                EXIT_FINDINGS
            } else {
                EXIT_OK
            }
        }
        Err(err) => {
            match args.output {
                OutputFormat::Json => println!("{}", to_json_line(&ErrorReport::from_anyhow(&err))),
                OutputFormat::Text => eprintln!("Error: {}", err),
            }
            EXIT_ERROR
        }
    }
}

async fn execute(args: &CompareConfigsArgs) -> Result<(Vec<ConfigSource>, ObjectDiff)> {
    let order = parse_order(args.sources.as_slice())?;
    // Secrets were asked for by name, so fetch them for local and test too.
    let options = MergeOptions::default()
        .with_order(order.clone())
        .with_secrets_for_local(true)
        .with_secrets_for_test(true);

    let first = args.merger(&args.env1);
    let second = args.merger(&args.env2);
    debug!(?first, ?second, "Comparing environments");

    let (config1, config2) = tokio::try_join!(first.merge(&options), second.merge(&options))?;
    Ok((order, diff::diff(&config1, &config2)))
}

fn report(args: &CompareConfigsArgs, order: &[ConfigSource], diff: &ObjectDiff) {
    match args.output {
        OutputFormat::Json => {
            let report = CompareReport {
                env1: &args.env1,
                env2: &args.env2,
                status: diff.status,
                diff: &diff.diff,
                entries: diff.flatten(),
            };
            println!("{}", to_json_line(&report));
        }
        OutputFormat::Text => {
            let sources: Vec<&str> = order.iter().map(ConfigSource::as_str).collect();
            println!("Comparing configs: {} vs {}", args.env1, args.env2);
            println!("Sources: {}", sources.join(", "));
            println!();
            println!("{}", render_table(diff, &args.env1, &args.env2));
            if diff.has_differences() {
                let summary = diff.summary();
                println!(
                    "Summary: {} changes (+{} -{} ~{})",
                    summary.total(),
                    summary.added,
                    summary.deleted,
                    summary.updated
                );
            }
        }
    }
}
