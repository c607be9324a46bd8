//! Relay configuration
//!
//! Settings come from the first file found among `$MOGISEND_CONFIG`,
//! `~/.mogisend.toml` and `/etc/mogisend.toml`; `$MOGISEND_RELAY` then
//! overrides the relay host and port.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::sendmail::error::SendmailError;

/// Explicit configuration file path
pub const CONFIG_ENV: &str = "MOGISEND_CONFIG";

/// `host` or `host:port` of the relay, overriding the file
pub const RELAY_ENV: &str = "MOGISEND_RELAY";

pub const USER_CONFIG_FILE: &str = ".mogisend.toml";
pub const SYSTEM_CONFIG_PATH: &str = "/etc/mogisend.toml";

/// Where delivery goes and how it is logged
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SMTP relay host
    pub relay: String,

    /// SMTP relay port
    pub port: u16,

    /// Upgrade the relay connection with STARTTLS
    pub starttls: bool,

    /// Domain used to qualify bare user names
    pub domain: Option<String>,

    /// Log file, used when it can be opened for writing
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay: "localhost".to_string(),
            port: 25,
            starttls: false,
            domain: None,
            log_file: Some(PathBuf::from("/var/log/mogisend.log")),
        }
    }
}

impl Config {
    /// Load configuration from the environment and the standard locations
    pub fn load() -> Result<Self, SendmailError> {
        let explicit = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = Self::load_from(explicit.as_deref(), &default_paths())?;

        if let Ok(relay) = env::var(RELAY_ENV) {
            config.apply_relay_override(&relay)?;
        }

        Ok(config)
    }

    /// Load from `explicit` if given (it must exist), else from the first
    /// existing candidate, else defaults
    pub fn load_from(explicit: Option<&Path>, candidates: &[PathBuf]) -> Result<Self, SendmailError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, SendmailError> {
        let content = fs::read_to_string(path)
            .map_err(|e| SendmailError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::parse(&content)
            .map_err(|e| SendmailError::Config(format!("{}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply a `host` or `host:port` relay override
    pub fn apply_relay_override(&mut self, value: &str) -> Result<(), SendmailError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SendmailError::Config(format!("{RELAY_ENV} is empty")));
        }

        match value.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && !host.contains(':') => {
                self.port = port.parse().map_err(|_| {
                    SendmailError::Config(format!("{RELAY_ENV}: invalid port {port:?}"))
                })?;
                self.relay = host.to_string();
            }
            _ => self.relay = value.to_string(),
        }
        Ok(())
    }

    /// Domain for bare user names: configured, else this host's name
    pub fn default_domain(&self) -> Option<String> {
        self.domain.clone().or_else(|| {
            hostname::get()
                .ok()
                .and_then(|name| name.into_string().ok())
                .filter(|name| !name.is_empty())
        })
    }
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(USER_CONFIG_FILE));
    }
    paths.push(PathBuf::from(SYSTEM_CONFIG_PATH));
    paths
}
