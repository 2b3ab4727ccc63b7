//! Configuration sources and merge order validation.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// A configuration source that can take part in a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// `<config_dir>/default.json`
    Default,
    /// `<config_dir>/<env>.json`
    Env,
    /// Secret store payload for the resolved secret name
    Secrets,
    /// Local override file
    Rc,
}

impl ConfigSource {
    /// Every source, in the default merge order.
    pub const ALL: [ConfigSource; 4] = [
        ConfigSource::Default,
        ConfigSource::Env,
        ConfigSource::Secrets,
        ConfigSource::Rc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Default => "default",
            ConfigSource::Env => "env",
            ConfigSource::Secrets => "secrets",
            ConfigSource::Rc => "rc",
        }
    }

    /// Comma separated list of valid source names, for error messages.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConfigSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(ConfigSource::Default),
            "env" => Ok(ConfigSource::Env),
            "secrets" => Ok(ConfigSource::Secrets),
            "rc" => Ok(ConfigSource::Rc),
            _ => Err(ConfigError::InvalidSource {
                value: s.to_string(),
                valid: Self::valid_names(),
            }),
        }
    }
}

/// Check that a merge order is non-empty and names each source at most once.
pub fn validate_order(order: &[ConfigSource]) -> Result<()> {
    if order.is_empty() {
        return Err(ConfigError::EmptyOrder);
    }
    for (i, source) in order.iter().enumerate() {
        if order[..i].contains(source) {
            return Err(ConfigError::DuplicateSource(source.to_string()));
        }
    }
    Ok(())
}

/// Parse and validate a merge order given as source names.
pub fn parse_order<S: AsRef<str>>(names: &[S]) -> Result<Vec<ConfigSource>> {
    let order = names
        .iter()
        .map(|name| name.as_ref().trim().parse())
        .collect::<Result<Vec<ConfigSource>>>()?;
    validate_order(&order)?;
    Ok(order)
}
