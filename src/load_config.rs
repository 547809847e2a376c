use anyhow::Result;
use platform_provider_core::config::DEFAULT_TIMEOUT_SECS;
use platform_provider_core::ProviderConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

pub const API_KEY_VAR: &str = "PROVIDER_API_KEY";
pub const ENVIRONMENT_VAR: &str = "PROVIDER_ENV";

/// Settings file contents. Secrets never live here.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct StaticConfig {
    #[serde(default)]
    environment: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    organization: Option<String>,
    #[serde(default)]
    user_email: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

/// Loads a static YAML settings file (no secrets) and injects the API key and
/// environment selector from the process environment.
/// Returns a validated ProviderConfig or an error naming what was missing.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ProviderConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!(error = ?e, "Ignoring unreadable .env file");
        }
    }

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    // An empty file is a valid "all defaults" configuration.
    let static_conf: StaticConfig = if config_content.trim().is_empty() {
        StaticConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    let api_key = match std::env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => {
            info!("{API_KEY_VAR} found in env");
            key
        }
        Ok(_) => {
            error!("{API_KEY_VAR} is set but empty");
            anyhow::bail!("{API_KEY_VAR} environment variable is empty");
        }
        Err(e) => {
            error!(error = ?e, "{API_KEY_VAR} environment variable not set");
            return Err(anyhow::anyhow!("{API_KEY_VAR} environment variable not set: {e}"));
        }
    };

    let environment = match std::env::var(ENVIRONMENT_VAR) {
        Ok(env) if !env.trim().is_empty() => {
            info!(environment = %env, "{ENVIRONMENT_VAR} overrides the configured environment");
            Some(env)
        }
        _ => static_conf.environment,
    };

    let config = ProviderConfig {
        api_key,
        environment,
        base_url: static_conf.base_url,
        organization: static_conf.organization,
        user_email: static_conf.user_email,
        timeout_secs: static_conf.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
    };

    if let Err(e) = config.validate() {
        error!(error = %e, "Merged configuration is invalid");
        anyhow::bail!("{e}");
    }

    config.trace_loaded();
    Ok(config)
}
