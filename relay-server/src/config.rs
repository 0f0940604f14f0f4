//! Configuration module.
//!
//! Settings come from a local JSON file (`serverConfig.json` by default),
//! with environment variables taking precedence over file values. The result
//! is immutable and shared as `Arc<Config>` for the life of the process.

use std::{env, fs, io::ErrorKind, path::Path};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ConfigError;

/// Settings file read when `RELAY_CONFIG_PATH` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "serverConfig.json";

/// Webhook route used when none is configured.
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";

/// Inbound port used when none is configured.
pub const DEFAULT_PORT: u16 = 8008;

/// Routes served by the relay itself.
const RESERVED_PATHS: &[&str] = &["/health", "/api/config"];

static URL_CREDENTIALS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//[^/@:]+:[^/@]+@").expect("static regex"));

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Jenkins endpoint every delivery is forwarded to
    pub target_jenkins_url: String,

    /// Route the inbound webhook is served on
    pub webhook_path: String,

    /// Port for the web server to listen on
    pub incoming_port: u16,

    /// Shared secret for `X-Hub-Signature-256` verification
    pub github_webhook_secret: Option<String>,
}

/// On-disk settings. Every key is optional here; required keys are checked
/// after environment overrides are applied.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    target_jenkins_url: Option<String>,
    webhook_path: Option<String>,
    incoming_port: Option<i64>,
    github_webhook_secret: Option<String>,
}

impl Config {
    /// Build a configuration directly, with defaults for everything but the target.
    pub fn new(target_jenkins_url: impl Into<String>) -> Self {
        Config {
            target_jenkins_url: target_jenkins_url.into(),
            webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
            incoming_port: DEFAULT_PORT,
            github_webhook_secret: None,
        }
    }

    /// Set the shared webhook secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.github_webhook_secret = normalize_secret(Some(secret.into()));
        self
    }

    /// Load from the settings file named by `RELAY_CONFIG_PATH` (or the
    /// default path), with environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var("RELAY_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    /// Load from a settings file, with environment overrides.
    ///
    /// A missing file is tolerated so that a deployment can be configured
    /// from the environment alone.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let settings = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str::<SettingsFile>(&raw).map_err(|source| {
                ConfigError::Parse {
                    path: path_str.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path_str, "config_file_not_found");
                SettingsFile::default()
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path_str,
                    source,
                })
            }
        };

        resolve(settings, |name| env::var(name).ok())
    }

    /// Whether signature verification is enabled.
    pub fn has_secret(&self) -> bool {
        self.github_webhook_secret.is_some()
    }

    /// Target URL with any embedded credentials replaced by `***:***`.
    pub fn masked_target_url(&self) -> String {
        mask_credentials(&self.target_jenkins_url)
    }
}

/// Replace `//user:pass@` in a URL with `//***:***@`.
pub fn mask_credentials(url: &str) -> String {
    URL_CREDENTIALS.replace(url, "//***:***@").into_owned()
}

/// Merge file settings with environment overrides and apply defaults.
fn resolve<F>(file: SettingsFile, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let target_jenkins_url = non_empty("TARGET_JENKINS_URL")
        .or(file.target_jenkins_url)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingTargetUrl)?;

    let webhook_path = non_empty("WEBHOOK_PATH")
        .or(file.webhook_path)
        .unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string());
    if !webhook_path.starts_with('/') || RESERVED_PATHS.contains(&webhook_path.as_str()) {
        return Err(ConfigError::InvalidWebhookPath(webhook_path));
    }

    let port = match non_empty("INCOMING_PORT") {
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(p) => Some(p),
            Err(_) => {
                warn!(env_var = "INCOMING_PORT", value = %raw, "Invalid port, ignoring override");
                file.incoming_port
            }
        },
        None => file.incoming_port,
    };
    let incoming_port = match port {
        Some(p) => u16::try_from(p)
            .ok()
            .filter(|p| *p != 0)
            .ok_or(ConfigError::InvalidPort(p))?,
        None => DEFAULT_PORT,
    };

    let github_webhook_secret = normalize_secret(
        lookup("GITHUB_WEBHOOK_SECRET")
            .filter(|v| !v.is_empty())
            .or(file.github_webhook_secret),
    );

    Ok(Config {
        target_jenkins_url,
        webhook_path,
        incoming_port,
        github_webhook_secret,
    })
}

/// An empty secret means "not configured". Whitespace is a real secret.
fn normalize_secret(secret: Option<String>) -> Option<String> {
    secret.filter(|s| !s.is_empty())
}
