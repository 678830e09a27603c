use serde::Deserialize;
use std::{num::NonZeroUsize, path::PathBuf};
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "RATEMYPETS_";
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = NonZeroUsize::new(5).unwrap();

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
}

/// Settings read from `RATEMYPETS_*` environment variables.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct FeedConfig {
    /// Posts per feed page. Fixed for the lifetime of a [`crate::Feed`].
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroUsize,
    /// Where the signed-in session is kept between runs. Not persisted when unset.
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

fn default_page_size() -> NonZeroUsize {
    DEFAULT_PAGE_SIZE
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            session_file: None,
        }
    }
}

impl FeedConfig {
    /// Reads the config from the process environment, after loading a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if e.not_found() {
                debug!("No .env file found");
            } else {
                return Err(e.into());
            }
        }

        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter(vars)?)
    }
}
