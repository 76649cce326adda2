use std::env;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Environment variable consulted for the API token
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Conventional config file path, read from the working directory
pub const CONFIG_FILE: &str = ".issue-pilot.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "GitHub token not found. Set the {TOKEN_ENV_VAR} environment variable \
         or add github.token to {CONFIG_FILE}"
    )]
    TokenNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Hard cap GitHub places on page size
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,

    /// Page size used when the caller doesn't ask for one
    #[serde(default = "default_per_page")]
    pub default_per_page: u32,
}

fn default_max_per_page() -> u32 {
    100
}

fn default_per_page() -> u32 {
    30
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_page: default_max_per_page(),
            default_per_page: default_per_page(),
        }
    }
}

impl RateLimitConfig {
    /// Clamp a requested page size to the configured maximum
    pub fn clamp_per_page(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_per_page)
            .min(self.max_per_page)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalityConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// Client configuration, built once at construction and immutable after
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub personality: PersonalityConfig,

    /// Token from the config file; lowest rung of the precedence ladder
    #[serde(default)]
    pub token: Option<String>,

    /// API base URL override; `None` means the public GitHub API
    #[serde(default)]
    pub api_url: Option<String>,
}

/// Deep merge two config values, with `update` taking precedence.
///
/// When both sides hold a map the merge recurses per key; any other pairing
/// replaces the base value with the update wholesale.
pub fn merge(base: &Value, update: &Value) -> Value {
    match (base, update) {
        (Value::Object(base_map), Value::Object(update_map)) => {
            let mut result = base_map.clone();
            for (key, value) in update_map {
                let merged = match result.get(key) {
                    Some(existing) => merge(existing, value),
                    None => value.clone(),
                };
                result.insert(key.clone(), merged);
            }
            Value::Object(result)
        }
        _ => update.clone(),
    }
}

/// Pure resolution core: precedence and merging with every input already
/// in hand, so tests need neither the environment nor a filesystem.
///
/// Token precedence is explicit > env > merged config value.
pub fn resolve_with(
    explicit_token: Option<&str>,
    env_token: Option<&str>,
    file_section: Option<Value>,
    overrides: Option<Value>,
) -> Result<(String, Config), ConfigError> {
    let defaults = serde_json::to_value(Config::default()).unwrap_or(Value::Null);

    let mut merged = defaults;
    if let Some(file_value) = file_section {
        merged = merge(&merged, &file_value);
    }
    if let Some(override_value) = overrides {
        merged = merge(&merged, &override_value);
    }

    // A well-formed token must survive even when some other section is
    // structurally bogus, so it is pulled out before the typed fallback.
    let merged_token = merged
        .get("token")
        .and_then(Value::as_str)
        .map(str::to_string);

    // A structurally bogus config (wrong types) degrades to defaults
    // rather than failing; only a missing token is fatal.
    let config: Config = serde_json::from_value(merged).unwrap_or_else(|e| {
        debug!("Config did not deserialize cleanly, using defaults: {}", e);
        Config::default()
    });

    let token = explicit_token
        .map(str::to_string)
        .or_else(|| env_token.map(str::to_string))
        .or(merged_token)
        .ok_or(ConfigError::TokenNotFound)?;

    Ok((token, config))
}

impl Config {
    /// Resolve the token and effective config from an explicit token,
    /// explicit overrides, and the config file (when present).
    pub fn resolve(
        explicit_token: Option<&str>,
        overrides: Option<Value>,
        file_path: Option<&Path>,
    ) -> Result<(String, Config), ConfigError> {
        let path = file_path.unwrap_or_else(|| Path::new(CONFIG_FILE));
        let file_section = load_file_section(path);
        let env_token = env::var(TOKEN_ENV_VAR).ok();
        resolve_with(
            explicit_token,
            env_token.as_deref(),
            file_section,
            overrides,
        )
    }
}

/// Read the `github:` section of the config file. An unreadable or
/// malformed file is ignored and acts like an empty config.
fn load_file_section(path: &Path) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    let parsed: serde_yaml::Value = match serde_yaml::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            debug!("Ignoring malformed config file {:?}: {}", path, e);
            return None;
        }
    };
    let json = serde_json::to_value(parsed).ok()?;
    json.get("github").cloned().filter(Value::is_object)
}
