use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ProviderError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const PRODUCTION_BASE_URL: &str = "https://api.agentplatform.io";

/// Settings the Transport Core is constructed from. Read once at startup by
/// the adapter crate and never mutated afterwards.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    #[serde(default)]
    pub environment: Option<String>,
    /// Overrides the URL derived from `environment` when set.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Organization scope for legacy endpoints.
    #[serde(default)]
    pub organization: Option<String>,
    /// Requester email for legacy endpoints.
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

// Hand-written so the credential never reaches a log line.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .field("user_email", &self.user_email)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            environment: None,
            base_url: None,
            organization: None,
            user_email: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn environment(&self) -> Environment {
        Environment::from_selector(self.environment.as_deref())
    }

    /// Base URL with any trailing slash removed.
    pub fn resolved_base_url(&self) -> String {
        let url = match &self.base_url {
            Some(url) => url.clone(),
            None => self.environment().base_url(),
        };
        url.trim_end_matches('/').to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::Config("api key must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ProviderError::Config(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            api_key_set = !self.api_key.is_empty(),
            environment = %self.environment(),
            base_url = %self.resolved_base_url(),
            timeout_secs = self.timeout_secs,
            "Loaded ProviderConfig"
        );
        debug!(config = ?self, "ProviderConfig loaded (full debug)");
    }
}

/// Deployment the provider talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Production,
    Named(String),
}

impl Environment {
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector.map(str::trim) {
            None | Some("") => Environment::Production,
            Some(s) if s.eq_ignore_ascii_case("production") || s.eq_ignore_ascii_case("prod") => {
                Environment::Production
            }
            Some(s) => Environment::Named(s.to_ascii_lowercase()),
        }
    }

    pub fn base_url(&self) -> String {
        match self {
            Environment::Production => PRODUCTION_BASE_URL.to_string(),
            Environment::Named(name) => format!("https://api-{name}.agentplatform.io"),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => f.write_str("production"),
            Environment::Named(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_selects_base_url() {
        let mut config = ProviderConfig::new("key");
        assert_eq!(config.resolved_base_url(), "https://api.agentplatform.io");

        config.environment = Some("Staging".into());
        assert_eq!(
            config.resolved_base_url(),
            "https://api-staging.agentplatform.io"
        );

        config.base_url = Some("http://localhost:8080/".into());
        assert_eq!(config.resolved_base_url(), "http://localhost:8080");
    }

    #[test]
    fn validate_rejects_blank_key_and_zero_timeout() {
        assert!(ProviderConfig::new("  ").validate().is_err());

        let mut config = ProviderConfig::new("key");
        config.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.timeout_secs = 5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let rendered = format!("{:?}", ProviderConfig::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }
}
