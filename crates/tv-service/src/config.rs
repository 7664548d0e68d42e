use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default timeout for trust-authority requests in seconds.
const DEFAULT_AUTHORITY_TIMEOUT_SECONDS: u64 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub authority_url: String,
    pub authority_timeout: Duration,
    /// Retention window for verification records. `None` keeps records for
    /// the lifetime of the process.
    pub record_ttl: Option<Duration>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8083".to_string());

        let authority_url = vars
            .get("AUTHORITY_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTHORITY_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let authority_timeout = match vars.get("AUTHORITY_TIMEOUT_SECONDS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ConfigError::InvalidValue("AUTHORITY_TIMEOUT_SECONDS".to_string(), raw.clone())
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue(
                        "AUTHORITY_TIMEOUT_SECONDS".to_string(),
                        "must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_AUTHORITY_TIMEOUT_SECONDS),
        };

        let record_ttl = match vars.get("RECORD_TTL_SECONDS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ConfigError::InvalidValue("RECORD_TTL_SECONDS".to_string(), raw.clone())
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Config {
            bind_address,
            authority_url,
            authority_timeout,
            record_ttl,
        })
    }
}
