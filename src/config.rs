use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::browser::{RemoteEndpoint, DEFAULT_DELAY, DEFAULT_TIMEOUT};
use crate::{Result, ToolboxError};

/// Slack added on top of the delay when the timeout would leave too little
/// room for navigation and actions.
pub const DELAY_MARGIN: Duration = Duration::from_secs(10);

/// Delays above this are allowed but logged as unusual.
pub const LARGE_DELAY: Duration = Duration::from_secs(60);

pub const DEFAULT_LOGLEVEL: &str = "info";

/// File-backed defaults. Every key is optional; CLI flags given explicitly
/// take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    pub loglevel: String,
    pub remote_debugging_port: Option<String>,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            delay: DEFAULT_DELAY,
            loglevel: DEFAULT_LOGLEVEL.to_string(),
            remote_debugging_port: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// `~/.config/that-cli-web-toolbox/config.toml`
    pub fn central_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| {
            home.join(".config")
                .join("that-cli-web-toolbox")
                .join("config.toml")
        })
    }

    /// Load from `path` when given, else from the central config when it
    /// exists, else return defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::central_config_path().filter(|p| p.is_file()) {
                Some(central) => central,
                None => return Ok(Self::default()),
            },
        };
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(ToolboxError::config("timeout must be greater than zero"));
        }
        if self.delay.subsec_nanos() != 0 {
            return Err(ToolboxError::config(format!(
                "delay must be a whole number of seconds: {:?}",
                self.delay
            )));
        }
        if let Some(endpoint) = &self.remote_debugging_port {
            RemoteEndpoint::parse(endpoint)?;
        }
        Ok(())
    }
}

/// The timeout actually used for a session: at least `delay` plus
/// [`DELAY_MARGIN`], with the boundary itself also raised.
pub fn effective_timeout(timeout: Duration, delay: Duration) -> Duration {
    let floor = delay + DELAY_MARGIN;
    if timeout <= floor {
        floor
    } else {
        timeout
    }
}
