//! Host configuration, read from a TOML file
//!
//! ```toml
//! random_seed = 1234
//! instruction_limit = 1000000
//! log_filter = "lantern=debug"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::zrand::ZRand;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Fixed seed for a repeatable random sequence
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Stop after this many instructions
    #[serde(default)]
    pub instruction_limit: Option<u64>,
    /// env_logger filter used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            random_seed: None,
            instruction_limit: None,
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(s: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Random source for a new engine: seeded when a seed is configured.
    pub fn rng(&self) -> ZRand {
        match self.random_seed {
            Some(seed) => ZRand::new_predictable(seed),
            None => ZRand::new_uniform(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zrand::RandMode;
    use test_log::test;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.rng().mode(), RandMode::RandomUniform);
    }

    #[test]
    fn test_all_fields() {
        let config = Config::from_toml_str(
            "random_seed = 99\ninstruction_limit = 5000\nlog_filter = \"lantern=trace\"\n",
        )
        .unwrap();
        assert_eq!(config.random_seed, Some(99));
        assert_eq!(config.instruction_limit, Some(5000));
        assert_eq!(config.log_filter, "lantern=trace");
        assert_eq!(config.rng().mode(), RandMode::Predictable);
    }

    #[test]
    fn test_rejects_unknown_and_mistyped_keys() {
        assert!(matches!(
            Config::from_toml_str("seed = 1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::from_toml_str("random_seed = \"x\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/nonexistent/lantern.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/lantern.toml"));
    }
}
