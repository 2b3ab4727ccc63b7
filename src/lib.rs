//! Layered JSON configuration.
//!
//! Merges default, environment, secret store and local override sources in
//! a caller-chosen order, and compares merged configurations structurally.
//!
//! ```no_run
//! use std::sync::Arc;
//! use strata_config::config::{ConfigMerger, MergeOptions, MergerOptions};
//! use strata_config::secrets::CommandSecretStore;
//!
//! # async fn example() -> strata_config::error::Result<()> {
//! let merger = ConfigMerger::new(
//!     MergerOptions::default().with_env("production"),
//!     Arc::new(CommandSecretStore::new("eu-west-1")),
//! );
//! let config = merger.merge(&MergeOptions::default()).await?;
//! println!("{}", config["database"]["host"]);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod format;
pub mod logging;
pub mod placeholders;
pub mod secrets;
