//! Server configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file,
//! then `ROLLD_*` environment variables. CLI flags are applied on top by
//! the binary.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::DEFAULT_MAX_DICE;
use crate::dice::{DieSource, RngSource};

/// Default listen port
pub const DEFAULT_PORT: u16 = 5050;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Figment(#[from] figment::Error),

    #[error("max_dice must be at least 1")]
    ZeroMaxDice,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Seed for the die generator; unset means seeded from the OS
    pub seed: Option<u64>,
    /// Most dice a single batch may draw
    pub max_dice: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            seed: None,
            max_dice: DEFAULT_MAX_DICE,
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file_exact(path));
        }
        let config: Config = figment.merge(Env::prefixed("ROLLD_")).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_dice == 0 {
            return Err(ConfigError::ZeroMaxDice);
        }
        Ok(())
    }

    /// Build the die source this configuration asks for
    pub fn die_source(&self) -> Box<dyn DieSource + Send> {
        match self.seed {
            Some(seed) => Box::new(RngSource::seeded(seed)),
            None => Box::new(RngSource::from_os()),
        }
    }
}
