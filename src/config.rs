//! Configuration management for LiDAR Sync
//!
//! Configuration is optional: every setting has a default and the built-in
//! profiles need no file at all. When present, the file is looked up in
//! this order:
//!
//! 1. the `--config` command line option
//! 2. the `LIDAR_SYNC_CONFIG` environment variable
//! 3. `./lidar-sync.toml`
//! 4. `<user config dir>/lidar-sync/config.toml`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{builtin_profiles, ClientConfig, CoordinatorConfig, ProfileSpec};
use crate::constants::{config as config_constants, env, http, workers};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfig,
    /// Job scheduling settings
    pub pipeline: CoordinatorConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Additional or overriding manifest profiles
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, ProfileSpec>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given (`RUST_LOG` still applies)
    pub level: String,
    /// Enable ANSI colors in log output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            colored_output: true,
        }
    }
}

/// Where a listed profile comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    Builtin,
    Configured,
    /// Configured under a built-in name, replacing it
    Override,
}

impl AppConfig {
    /// Load configuration from the first available source
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` when an explicitly requested file is
    /// missing, and parse or validation errors for a broken file.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let explicit = config_file_override.is_some();
        let config_path = match config_file_override {
            Some(path) => Some(path),
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) if path.exists() => Self::load_from_file(&path).await?,
            Some(path) if explicit => return Err(ConfigError::NotFound { path }),
            _ => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// First existing file among the environment override, the local file and the user file
    pub fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(env::CONFIG_PATH) {
            if !path.is_empty() {
                debug!("Using config file from {}: {}", env::CONFIG_PATH, path);
                return Some(PathBuf::from(path));
            }
        }

        let search_paths = [
            Some(PathBuf::from(config_constants::LOCAL_FILE_NAME)),
            Self::default_config_path(),
        ];

        for path in search_paths.into_iter().flatten() {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        None
    }

    /// Per-user configuration file location
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(config_constants::APP_DIR_NAME)
                .join(config_constants::FILE_NAME)
        })
    }

    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Validate every section, collecting all problems
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        for result in [self.client.validate(), self.pipeline.validate()] {
            if let Err(ConfigError::ValidationFailed { errors: found }) = result {
                errors.extend(found);
            }
        }
        for (name, spec) in &self.profiles {
            if let Err(ConfigError::ValidationFailed { errors: found }) = spec.validate(name) {
                errors.extend(found);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed { errors })
        }
    }

    /// Profile description by name; configured profiles replace built-ins
    pub fn profile_spec(&self, name: &str) -> ConfigResult<ProfileSpec> {
        self.profiles
            .get(name)
            .cloned()
            .or_else(|| builtin_profiles().remove(name))
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_string(),
            })
    }

    /// Every known profile with its origin, sorted by name
    pub fn profile_list(&self) -> Vec<(String, ProfileSpec, ProfileSource)> {
        let mut all: BTreeMap<String, (ProfileSpec, ProfileSource)> = builtin_profiles()
            .into_iter()
            .map(|(name, spec)| (name, (spec, ProfileSource::Builtin)))
            .collect();

        for (name, spec) in &self.profiles {
            let source = if all.contains_key(name) {
                ProfileSource::Override
            } else {
                ProfileSource::Configured
            };
            all.insert(name.clone(), (spec.clone(), source));
        }

        all.into_iter()
            .map(|(name, (spec, source))| (name, spec, source))
            .collect()
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the commented default file to `path`
    ///
    /// An existing file is only replaced when `force` is set.
    pub async fn write_default(path: &Path, force: bool) -> ConfigResult<()> {
        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: "path".to_string(),
                value: path.display().to_string(),
                reason: "File already exists; use --force to overwrite".to_string(),
            });
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, Self::generate_default_config_content()).await?;
        info!("Wrote default configuration to {}", path.display());
        Ok(())
    }

    pub fn generate_default_config_content() -> String {
        format!(
            r#"# LiDAR Sync Configuration
# Every setting is optional; remove a line to fall back to its default.

[client]
# Maximum silence while waiting for a response or the next chunk of data
read_timeout = "{read_timeout}s"
connect_timeout = "{connect_timeout}s"
# Total time allowed for one archive transfer (unset = unlimited)
# request_timeout = "30m"
tcp_keepalive = "30s"
tcp_nodelay = true
pool_idle_timeout = "{pool_idle}s"
pool_max_per_host = {pool_max}
rate_limit_rps = {rps}

[pipeline]
# Archives processed concurrently (1 = strictly in list order)
worker_count = {workers}
# What to do when an archive fails: "abort" or "continue"
failure_policy = "abort"
progress_update_interval = "120ms"

[logging]
# Used when neither --verbose nor --quiet is given
level = "warn"  # error, warn, info, debug, trace
colored_output = true

# Additional manifest profiles. A profile with a built-in name replaces it.
#
# [profiles.my-tiles]
# description = "Tiles from my-manifest.csv"
# manifest = "my-manifest.csv"
#
# [[profiles.my-tiles.categories]]
# name = "LiDAR"
# field_index = 1
# url_list = "MyLidar_urls.csv"
# destination = "MyLidar"
# rules = [
#     {{ extension = ".las" }},
#     {{ extension = ".prj", subdirectory = "prj", optional = true }},
# ]
"#,
            read_timeout = http::DEFAULT_READ_TIMEOUT.as_secs(),
            connect_timeout = http::CONNECT_TIMEOUT.as_secs(),
            pool_idle = http::POOL_IDLE_TIMEOUT.as_secs(),
            pool_max = http::POOL_MAX_PER_HOST,
            rps = http::DEFAULT_RATE_LIMIT_RPS,
            workers = workers::DEFAULT_WORKER_COUNT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FailurePolicy;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();

        assert_eq!(config.pipeline.worker_count, workers::DEFAULT_WORKER_COUNT);
        assert_eq!(config.client.rate_limit_rps, http::DEFAULT_RATE_LIMIT_RPS);
        assert_eq!(config.logging.level, "warn");
        assert!(config.profiles.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generated_file_matches_defaults() {
        let content = AppConfig::generate_default_config_content();
        let parsed: AppConfig = toml::from_str(&content).unwrap();

        assert_eq!(parsed, AppConfig::default());
        assert!(content.contains("[pipeline]"));
    }

    #[tokio::test]
    async fn test_explicit_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = AppConfig::load(Some(temp_dir.path().join("nonexistent.toml"))).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_config_loading_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("lidar-sync.toml");
        tokio::fs::write(
            &config_path,
            r#"
[client]
read_timeout = "5s"

[pipeline]
worker_count = 4
failure_policy = "continue"

[profiles.tiny]
manifest = "tiny.csv"

[[profiles.tiny.categories]]
name = "LiDAR"
field_index = 1
url_list = "tiny_urls.csv"
destination = "tiny"
rules = [{ extension = "las" }, { extension = ".prj", subdirectory = "prj", optional = true }]
"#,
        )
        .await
        .unwrap();

        let config = AppConfig::load(Some(config_path)).await.unwrap();

        assert_eq!(config.client.read_timeout, std::time::Duration::from_secs(5));
        assert_eq!(config.pipeline.worker_count, 4);
        assert_eq!(config.pipeline.failure_policy, FailurePolicy::Continue);

        let profile = config
            .profile_spec("tiny")
            .unwrap()
            .resolve("tiny", temp_dir.path())
            .unwrap();
        assert_eq!(profile.categories[0].rules[0].extension, ".las");
        assert!(!profile.categories[0].rules[1].is_required());
    }

    #[tokio::test]
    async fn test_invalid_values_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        tokio::fs::write(&config_path, "[pipeline]\nworker_count = 0\n")
            .await
            .unwrap();

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn test_configured_profile_overrides_builtin() {
        let mut config = AppConfig::default();
        let mut spec = builtin_profiles()["van-2018"].clone();
        spec.description = "local mirror".to_string();
        config.profiles.insert("van-2018".to_string(), spec);

        assert_eq!(config.profile_spec("van-2018").unwrap().description, "local mirror");
        assert!(matches!(
            config.profile_spec("nope"),
            Err(ConfigError::UnknownProfile { .. })
        ));

        let list = config.profile_list();
        let (_, _, source) = list.iter().find(|(name, _, _)| name == "van-2018").unwrap();
        assert_eq!(*source, ProfileSource::Override);
        assert_eq!(list.len(), 3);
    }

    #[tokio::test]
    async fn test_write_default_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("conf/config.toml");

        AppConfig::write_default(&path, false).await.unwrap();
        assert!(AppConfig::write_default(&path, false).await.is_err());
        assert!(AppConfig::write_default(&path, true).await.is_ok());
    }
}
