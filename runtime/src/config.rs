//! Runtime configuration.
//!
//! Values come from defaults, then `PAGESURE_*` environment variables, then
//! command-line flags (applied by the CLI on top of [`RuntimeConfig::from_env`]).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Origins allowed to call the API from a browser when none are configured.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "https://pagesure-1.onrender.com"];

/// Errors reading configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("invalid listen address {0:?}")]
    Address(String),
}

/// Everything the server and scraper need to start.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub bind: String,
    pub port: u16,
    /// Scrapes allowed to run at once; further requests queue.
    pub max_concurrent_scrapes: usize,
    pub cors_origins: Vec<String>,
    pub db_path: PathBuf,
    /// Explicit Chromium binary; discovered when unset.
    pub chromium_path: Option<PathBuf>,
    pub nav_timeout_ms: u64,
    /// Delay after navigation so client-rendered content can appear.
    pub settle_ms: u64,
    pub audit_log: Option<PathBuf>,
    pub log_json: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3001,
            max_concurrent_scrapes: 2,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            db_path: pagesure_home().join("pagesure.db"),
            chromium_path: None,
            nav_timeout_ms: 30_000,
            settle_ms: 2_000,
            audit_log: None,
            log_json: false,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PAGESURE_BIND") {
            self.bind = v.trim().to_string();
        }
        if let Some(v) = get("PORT") {
            self.port = parse_var("PORT", &v)?;
        }
        if let Some(v) = get("PAGESURE_MAX_CONCURRENT_SCRAPES") {
            let n: usize = parse_var("PAGESURE_MAX_CONCURRENT_SCRAPES", &v)?;
            if n == 0 {
                return Err(ConfigError::Invalid {
                    var: "PAGESURE_MAX_CONCURRENT_SCRAPES",
                    value: v,
                });
            }
            self.max_concurrent_scrapes = n;
        }
        if let Some(v) = get("PAGESURE_CORS_ORIGINS") {
            self.cors_origins = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = get("PAGESURE_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = get("PAGESURE_CHROMIUM_PATH") {
            self.chromium_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("PAGESURE_NAV_TIMEOUT_MS") {
            self.nav_timeout_ms = parse_var("PAGESURE_NAV_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("PAGESURE_SETTLE_MS") {
            self.settle_ms = parse_var("PAGESURE_SETTLE_MS", &v)?;
        }
        if let Some(v) = get("PAGESURE_AUDIT_LOG") {
            self.audit_log = Some(PathBuf::from(v));
        }
        if let Some(v) = get("PAGESURE_LOG_JSON") {
            self.log_json = matches!(v.trim(), "1" | "true" | "yes");
        }
        Ok(())
    }

    /// Socket address the HTTP server listens on.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.bind, self.port);
        raw.parse().map_err(|_| ConfigError::Address(raw))
    }
}

fn parse_var<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
    })
}

/// The PageSure home directory (`$PAGESURE_HOME` or `~/.pagesure`).
pub fn pagesure_home() -> PathBuf {
    if let Ok(p) = std::env::var("PAGESURE_HOME") {
        return PathBuf::from(p);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".pagesure")
}
