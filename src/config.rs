//! Configuration loading for SMS Bridge.
//!
//! Settings live in `~/.smsbridge/settings.json`. Every field is optional;
//! command-line flags (and their `SMSBRIDGE_*` environment variables) take
//! precedence over the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Get the SMS Bridge home directory (~/.smsbridge).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".smsbridge"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.smsbridge/settings.json, or defaults if it does not exist.
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_settings_path()?)
}

/// Load settings from an explicit path. A missing file yields defaults.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        tracing::debug!("No settings file at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    settings.validate()?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// HTTP server configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Delivery client configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Connect and whole-request timeout for relay calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Longest a delivery command may run before it is killed.
    #[serde(default = "default_deliver_timeout")]
    pub deliver_timeout_secs: u64,
    /// Command run per message; `{to}`, `{body}` and `{id}` are substituted.
    pub deliver_command: Option<Vec<String>>,
}

fn default_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    5
}

fn default_deliver_timeout() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
            deliver_timeout_secs: default_deliver_timeout(),
            deliver_command: None,
        }
    }
}

/// SMS Bridge settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    /// Shared secret expected in the `X-Token` header.
    pub token: Option<String>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be non-zero".to_string()));
        }
        if self.client.poll_interval_secs == 0 {
            return Err(Error::Config(
                "client.poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.client.request_timeout_secs == 0 || self.client.deliver_timeout_secs == 0 {
            return Err(Error::Config(
                "client timeouts must be at least 1 second".to_string(),
            ));
        }
        if let Some(cmd) = &self.client.deliver_command {
            if cmd.is_empty() {
                return Err(Error::Config(
                    "client.deliver_command must name a program".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The configured token, or an error when none (or a blank one) is set.
    pub fn require_token(&self) -> Result<&str> {
        match self.token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(Error::Config(
                "No token configured. Pass --token, set SMSBRIDGE_TOKEN, or add \"token\" to settings.json".to_string(),
            )),
        }
    }
}
