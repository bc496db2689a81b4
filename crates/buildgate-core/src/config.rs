use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 18990;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Identity used when a request names no schedule key of its own.
pub const DEFAULT_SCHEDULE_KEY: &str = "default";
/// Mode-B delay when the request does not carry `x-delay-seconds`.
pub const DEFAULT_DELAY_SECONDS: u32 = 300;
/// Hard timeout for the outbound trigger call.
pub const DEFAULT_TRIGGER_TIMEOUT_SECS: u64 = 30;

/// Top-level config (buildgate.toml + BUILDGATE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuildgateConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Shared secret required on schedule requests (via `x-webhook-secret`
    /// header or `?secret=`). Absent disables the check.
    #[serde(default)]
    pub secret: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            secret: None,
        }
    }
}

/// Outbound trigger settings.
///
/// When `url` is set the deployment is statically targeted: requests need
/// not carry `x-webhook-url` and `delay_seconds` supplies the delay for
/// requests without `x-delay-seconds`. A per-request URL still wins when
/// supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: TriggerMethod,
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            url: None,
            method: TriggerMethod::default(),
            delay_seconds: DEFAULT_DELAY_SECONDS,
            timeout_secs: DEFAULT_TRIGGER_TIMEOUT_SECS,
        }
    }
}

/// HTTP method used for the trigger call. No body is sent either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerMethod {
    #[default]
    Post,
    Get,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_delay_seconds() -> u32 {
    DEFAULT_DELAY_SECONDS
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TRIGGER_TIMEOUT_SECS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.buildgate/buildgate.db", home)
}

impl BuildgateConfig {
    /// Load config from a TOML file with BUILDGATE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.buildgate/buildgate.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: BuildgateConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("BUILDGATE_").split("_"))
            .extract()
            .map_err(|e| crate::error::BuildgateError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.buildgate/buildgate.toml", home)
}
