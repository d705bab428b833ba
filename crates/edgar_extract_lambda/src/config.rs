use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use edgar_extract_core::cors::CorsPolicy;
use edgar_extract_core::outputs::DeclaredOutputs;
use thiserror::Error;

use crate::adapters::edgar_submissions::DEFAULT_EDGAR_BASE_URL;
use crate::handlers::extract::DEFAULT_EXTRACT_TIMEOUT;

pub const ENV_TABLE_NAME: &str = "TABLE_NAME";
pub const ENV_FILINGS_STORE: &str = "FILINGS_STORE";
pub const ENV_CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
pub const ENV_CORS_ALLOWED_METHODS: &str = "CORS_ALLOWED_METHODS";
pub const ENV_EXTRACT_TIMEOUT_SECS: &str = "EXTRACT_TIMEOUT_SECS";
pub const ENV_EDGAR_BASE_URL: &str = "EDGAR_BASE_URL";
pub const ENV_EDGAR_USER_AGENT: &str = "EDGAR_USER_AGENT";
pub const ENV_LOCAL_BIND_ADDRESS: &str = "LOCAL_BIND_ADDRESS";
pub const ENV_API_ENDPOINT: &str = "API_ENDPOINT";

pub const DEFAULT_CORS_ALLOWED_METHODS: &str = "POST";
pub const DEFAULT_EDGAR_USER_AGENT: &str = "edgar-extract admin@example.com";
pub const DEFAULT_LOCAL_BIND_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_LOCAL_TABLE_NAME: &str = "filings-local";
// Lambda's hard ceiling.
const MAX_EXTRACT_TIMEOUT_SECS: u64 = 900;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

fn invalid(name: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        message: message.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    DynamoDb,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dynamodb" => Ok(Self::DynamoDb),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected 'dynamodb' or 'memory', got '{other}'")),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DynamoDb => f.write_str("dynamodb"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// Settings read once at process start.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub store_kind: StoreKind,
    pub table_name: String,
    pub cors: CorsPolicy,
    pub extract_timeout: Duration,
    pub edgar_base_url: String,
    pub edgar_user_agent: String,
    pub local_bind_address: String,
    pub api_endpoint: Option<String>,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let store_kind = match read(ENV_FILINGS_STORE) {
            Some(value) => value
                .parse::<StoreKind>()
                .map_err(|message| invalid(ENV_FILINGS_STORE, message))?,
            None => StoreKind::DynamoDb,
        };

        let table_name = match (read(ENV_TABLE_NAME), store_kind) {
            (Some(name), _) => name,
            (None, StoreKind::Memory) => DEFAULT_LOCAL_TABLE_NAME.to_string(),
            (None, StoreKind::DynamoDb) => return Err(ConfigError::Missing(ENV_TABLE_NAME)),
        };
        validate_table_name(&table_name)?;

        let cors = CorsPolicy::from_settings(
            &read(ENV_CORS_ALLOWED_METHODS)
                .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_METHODS.to_string()),
            &read(ENV_CORS_ALLOWED_ORIGINS).unwrap_or_default(),
        )
        .map_err(|error| invalid("CORS settings", error.message()))?;

        let extract_timeout = match read(ENV_EXTRACT_TIMEOUT_SECS) {
            Some(value) => parse_timeout(&value)?,
            None => DEFAULT_EXTRACT_TIMEOUT,
        };

        let edgar_base_url =
            read(ENV_EDGAR_BASE_URL).unwrap_or_else(|| DEFAULT_EDGAR_BASE_URL.to_string());
        reqwest::Url::parse(&edgar_base_url)
            .map_err(|error| invalid(ENV_EDGAR_BASE_URL, error.to_string()))?;

        Ok(Self {
            store_kind,
            table_name,
            cors,
            extract_timeout,
            edgar_base_url,
            edgar_user_agent: read(ENV_EDGAR_USER_AGENT)
                .unwrap_or_else(|| DEFAULT_EDGAR_USER_AGENT.to_string()),
            local_bind_address: read(ENV_LOCAL_BIND_ADDRESS)
                .unwrap_or_else(|| DEFAULT_LOCAL_BIND_ADDRESS.to_string()),
            api_endpoint: read(ENV_API_ENDPOINT),
        })
    }

    pub fn declared_outputs(&self, fallback_endpoint: &str) -> DeclaredOutputs {
        DeclaredOutputs::new(
            self.api_endpoint.as_deref().unwrap_or(fallback_endpoint),
            self.table_name.as_str(),
        )
    }
}

/// DynamoDB table naming rules.
fn validate_table_name(name: &str) -> Result<(), ConfigError> {
    if !(3..=255).contains(&name.len()) {
        return Err(invalid(
            ENV_TABLE_NAME,
            format!("'{name}' must be between 3 and 255 characters"),
        ));
    }
    if !name
        .bytes()
        .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.'))
    {
        return Err(invalid(
            ENV_TABLE_NAME,
            format!("'{name}' may only contain letters, digits, '_', '-' and '.'"),
        ));
    }
    Ok(())
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    let seconds: u64 = value.parse().map_err(|_| {
        invalid(
            ENV_EXTRACT_TIMEOUT_SECS,
            format!("'{value}' is not a whole number of seconds"),
        )
    })?;
    if seconds == 0 || seconds > MAX_EXTRACT_TIMEOUT_SECS {
        return Err(invalid(
            ENV_EXTRACT_TIMEOUT_SECS,
            format!("must be between 1 and {MAX_EXTRACT_TIMEOUT_SECS}, got {seconds}"),
        ));
    }
    Ok(Duration::from_secs(seconds))
}
