//! Client settings loaded via OrthoConfig.
//!
//! Values come from `SKILL_EXCHANGE_*` environment variables or a
//! configuration file. Backend identifiers are only required when the
//! Appwrite adapters are built.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use crate::outbound::appwrite::AppwriteConnection;

const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_LOGIN_RETRY_DELAY_MS: u64 = 1_000;

/// Errors raised while loading or interpreting settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration sources could not be read or parsed.
    #[error("failed to load settings: {message}")]
    Load { message: String },
    /// A setting needed by the selected backend is absent.
    #[error("missing setting `{key}` (set SKILL_EXCHANGE_{env})")]
    Missing { key: &'static str, env: &'static str },
    /// The endpoint is not an absolute base URL.
    #[error("invalid endpoint `{value}`: {reason}")]
    InvalidEndpoint { value: String, reason: String },
}

/// Settings for reaching the backend and tuning signup auto-login.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SKILL_EXCHANGE")]
pub struct SkillExchangeSettings {
    /// API root of the backend.
    #[ortho_config(default = String::from(DEFAULT_ENDPOINT))]
    pub endpoint: String,
    /// Backend project id.
    pub project_id: Option<String>,
    /// Database holding the profile collection.
    pub database_id: Option<String>,
    /// Profile collection id.
    pub collection_id: Option<String>,
    /// Per-request timeout in milliseconds.
    #[ortho_config(default = DEFAULT_REQUEST_TIMEOUT_MS)]
    pub request_timeout_ms: u64,
    /// Auto-login attempts after signup, including the first.
    #[ortho_config(default = DEFAULT_MAX_ATTEMPTS)]
    pub login_max_attempts: u32,
    /// Pause between auto-login attempts in milliseconds.
    #[ortho_config(default = DEFAULT_LOGIN_RETRY_DELAY_MS)]
    pub login_retry_delay_ms: u64,
}

impl SkillExchangeSettings {
    /// Load settings from the environment and configuration files.
    ///
    /// Command-line flags are owned by the CLI, so only the program name is
    /// passed to the loader.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("skillx")]).map_err(|err| ConfigError::Load {
            message: err.to_string(),
        })
    }

    /// Configured endpoint, which must be an absolute base URL.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let raw = self.endpoint.trim();
        let url = Url::parse(raw).map_err(|err| ConfigError::InvalidEndpoint {
            value: raw.to_owned(),
            reason: err.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEndpoint {
                value: raw.to_owned(),
                reason: "not a base URL".to_owned(),
            });
        }
        Ok(url)
    }

    /// Backend project id.
    pub fn project_id(&self) -> Result<&str, ConfigError> {
        required(self.project_id.as_deref(), "project_id", "PROJECT_ID")
    }

    /// Database id.
    pub fn database_id(&self) -> Result<&str, ConfigError> {
        required(self.database_id.as_deref(), "database_id", "DATABASE_ID")
    }

    /// Collection id.
    pub fn collection_id(&self) -> Result<&str, ConfigError> {
        required(self.collection_id.as_deref(), "collection_id", "COLLECTION_ID")
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Retry policy for the auto-login after signup.
    pub fn login_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(
            self.login_max_attempts,
            Duration::from_millis(self.login_retry_delay_ms),
        )
    }

    /// Connection details for the Appwrite adapters.
    pub fn appwrite_connection(&self) -> Result<AppwriteConnection, ConfigError> {
        Ok(AppwriteConnection {
            endpoint: self.endpoint()?,
            project_id: self.project_id()?.to_owned(),
        })
    }
}

fn required<'a>(
    value: Option<&'a str>,
    key: &'static str,
    env: &'static str,
) -> Result<&'a str, ConfigError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing { key, env })
}
