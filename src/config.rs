use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port, overridden by `PORT`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log filter directives, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Base URL of the code execution backend
    pub executor_url: Option<String>,

    /// Timeout for a single execution request
    #[serde(default = "default_executor_timeout_secs")]
    pub executor_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        Self::from_vars(std::env::vars())
    }

    /// Build the configuration from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).map_err(ConfigError::EnvError)
    }

    /// Tracing filter: `RUST_LOG` wins, then `LOG_LEVEL`, then plain `info`
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn executor_timeout(&self) -> Duration {
        Duration::from_secs(self.executor_timeout_secs)
    }

    /// Allowed CORS origins, empty when none are configured
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect()
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            executor_url: None,
            executor_timeout_secs: default_executor_timeout_secs(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(envy::Error),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "colabri_code=debug,tower_http=debug,axum::rejection=trace,info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_executor_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn falls_back_to_defaults() {
        let config = Config::from_vars(Vec::new()).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.server_address(), "0.0.0.0:5000");
        assert!(config.executor_url.is_none());
        assert!(config.is_development());
    }

    #[test]
    fn port_is_overridden_by_environment() {
        let config = Config::from_vars(vars(&[
            ("PORT", "8080"),
            ("EXECUTOR_URL", "http://runner:2000"),
            ("EXECUTOR_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.executor_url.as_deref(), Some("http://runner:2000"));
        assert_eq!(config.executor_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn invalid_port_is_an_error() {
        assert!(Config::from_vars(vars(&[("PORT", "not-a-port")])).is_err());
    }

    #[test]
    fn log_level_is_read_from_environment() {
        let config = Config::from_vars(vars(&[("LOG_LEVEL", "colabri_code=trace,warn")])).unwrap();
        assert_eq!(config.log_level, "colabri_code=trace,warn");
        assert!(EnvFilter::try_new(&config.log_level).is_ok());
    }

    #[test]
    fn default_log_level_is_a_valid_filter() {
        let config = Config::from_vars(Vec::new()).unwrap();
        assert!(config.log_level.contains("colabri_code=debug"));
        assert!(EnvFilter::try_new(&config.log_level).is_ok());
    }

    #[test]
    fn cors_origins_are_split() {
        let config = Config::from_vars(vars(&[(
            "CORS_ORIGINS",
            "http://a.test, http://b.test,,",
        )]))
        .unwrap();
        assert_eq!(config.cors_origin_list(), vec!["http://a.test", "http://b.test"]);
    }
}
