//! Configuration for the synchronization client.
//!
//! [`ClientConfig`] can be loaded from environment variables, or from a YAML
//! file with environment overrides for the values that usually differ per
//! machine (server URL, access token, Dragonfly URL).

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A required value is missing or an environment value is malformed.
    #[error("config error: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Default game server.
pub const DEFAULT_SERVER_URL: &str = "https://stt.disruptorbeam.com/";

/// Default asset server.
pub const DEFAULT_ASSET_URL: &str = "https://stt-assets.disruptorbeam.com/";

/// API version sent as `client_api` with every request.
pub const CLIENT_API_VERSION: u32 = 11;

/// Client version reported to the config endpoint.
pub const CLIENT_VERSION: &str = "5.1.0";

/// Platform folder reported to the config endpoint.
pub const CLIENT_PLATFORM: &str = "webgl";

/// Maximum ids per `item/description` request.
pub const DEFAULT_EQUIPMENT_BATCH_SIZE: usize = 20;

/// Round limit of the equipment closure loop.
pub const DEFAULT_MAX_RESOLUTION_ROUNDS: usize = 512;

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Game server base URL.
    pub server_url: String,
    /// Asset server base URL used by the image resolver.
    pub asset_url: String,
    /// OAuth access token; requests fail with `NotAuthorized` without one.
    pub access_token: Option<String>,
    /// Dragonfly URL; the in-memory cache is used when absent.
    pub dragonfly_url: Option<String>,
    /// Maximum ids per equipment description request.
    pub equipment_batch_size: usize,
    /// Maximum closure rounds before the resolver gives up.
    pub max_resolution_rounds: usize,
    /// Optional cap on concurrent image resolutions per stage.
    pub fanout_concurrency: Option<usize>,
    /// Whether to load missions and score challenges.
    pub load_missions: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_owned(),
            asset_url: DEFAULT_ASSET_URL.to_owned(),
            access_token: None,
            dragonfly_url: None,
            equipment_batch_size: DEFAULT_EQUIPMENT_BATCH_SIZE,
            max_resolution_rounds: DEFAULT_MAX_RESOLUTION_ROUNDS,
            fanout_concurrency: None,
            load_missions: true,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `CREWSYNC_ACCESS_TOKEN` -- OAuth access token
    ///
    /// Optional variables:
    /// - `CREWSYNC_SERVER_URL` -- game server URL (default [`DEFAULT_SERVER_URL`])
    /// - `CREWSYNC_ASSET_URL` -- asset server URL (default [`DEFAULT_ASSET_URL`])
    /// - `CREWSYNC_DRAGONFLY_URL` -- Dragonfly cache URL (default in-memory cache)
    /// - `CREWSYNC_EQUIPMENT_BATCH_SIZE` -- ids per description request (default 20)
    /// - `CREWSYNC_MAX_RESOLUTION_ROUNDS` -- closure round limit (default 512)
    /// - `CREWSYNC_FANOUT_CONCURRENCY` -- cap on concurrent image resolutions (default unbounded)
    /// - `CREWSYNC_LOAD_MISSIONS` -- load missions and score challenges (default `true`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self {
            access_token: Some(env_var("CREWSYNC_ACCESS_TOKEN")?),
            ..Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override the file (see [`from_env`](Self::from_env)).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Override fields from `CREWSYNC_*` environment variables when set.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("CREWSYNC_SERVER_URL") {
            self.server_url = url;
        }
        if let Ok(url) = std::env::var("CREWSYNC_ASSET_URL") {
            self.asset_url = url;
        }
        if let Ok(token) = std::env::var("CREWSYNC_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Ok(url) = std::env::var("CREWSYNC_DRAGONFLY_URL") {
            self.dragonfly_url = Some(url);
        }
        if let Some(size) = parse_env("CREWSYNC_EQUIPMENT_BATCH_SIZE")? {
            self.equipment_batch_size = size;
        }
        if let Some(rounds) = parse_env("CREWSYNC_MAX_RESOLUTION_ROUNDS")? {
            self.max_resolution_rounds = rounds;
        }
        if let Some(limit) = parse_env("CREWSYNC_FANOUT_CONCURRENCY")? {
            self.fanout_concurrency = Some(limit);
        }
        if let Some(load) = parse_env("CREWSYNC_LOAD_MISSIONS")? {
            self.load_missions = load;
        }
        self.validate()
    }

    /// Reject values the pipeline cannot run with.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.equipment_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "equipment_batch_size must be at least 1".to_owned(),
            ));
        }
        if self.fanout_concurrency == Some(0) {
            return Err(ConfigError::Invalid(
                "fanout_concurrency must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Read a required environment variable.
fn env_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .map_err(|e| ConfigError::Invalid(format!("missing required env var {name}: {e}")))
}

/// Parse an optional environment variable.
fn parse_env<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: core::fmt::Display,
{
    std::env::var(name).ok().map_or(Ok(None), |raw| {
        raw.parse()
            .map(Some)
            .map_err(|e| ConfigError::Invalid(format!("invalid {name}: {e}")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_client_constants() {
        let config = ClientConfig::default();
        assert_eq!(config.equipment_batch_size, 20);
        assert_eq!(config.max_resolution_rounds, 512);
        assert!(config.fanout_concurrency.is_none());
        assert!(config.load_missions);
        assert!(config.access_token.is_none());
    }

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let parsed: Result<ClientConfig, _> = serde_yml::from_str(
            "server_url: https://example.test/\nfanout_concurrency: 8\nload_missions: false\n",
        );
        assert!(parsed.is_ok());
        let config = parsed.unwrap_or_default();
        assert_eq!(config.server_url, "https://example.test/");
        assert_eq!(config.fanout_concurrency, Some(8));
        assert!(!config.load_missions);
        assert_eq!(config.equipment_batch_size, DEFAULT_EQUIPMENT_BATCH_SIZE);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let config = ClientConfig {
            equipment_batch_size: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_yaml_is_a_yaml_error() {
        let result: Result<ClientConfig, ConfigError> =
            serde_yml::from_str::<ClientConfig>("server_url: [unclosed").map_err(ConfigError::from);
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
