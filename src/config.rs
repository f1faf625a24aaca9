use pathfinder_core::ReplaceStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_LOG_LEVEL: &str = "pathfinder=warn";

const APP_DIR: &str = "pathfinder";

/// Where a setting came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConfigSource::Default => "default",
            ConfigSource::File => "file",
            ConfigSource::Environment => "environment",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    fn defaulted(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::Default,
        }
    }

    fn set(&mut self, value: T, source: ConfigSource) {
        self.value = value;
        self.source = source;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// How child collections are replaced on edit
    pub replace_strategy: ReplaceStrategy,
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub database_path: ConfigValue<PathBuf>,
    /// Owner recorded on adventures written by this installation
    pub user_id: ConfigValue<String>,
    /// Log filter used when RUST_LOG is not set
    pub log_level: ConfigValue<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub sync: SyncConfig,
}

/// On-disk layout of `config.yaml`. Every key is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    user_id: Option<String>,
    log_level: Option<String>,
    sync: Option<SyncConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_yaml::Error),
}

impl Config {
    /// Resolves settings in order: environment, then config file, then defaults.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self {
            database_path: ConfigValue::defaulted(Self::default_data_dir().join("pathfinder.db")),
            user_id: ConfigValue::defaulted("default".to_string()),
            log_level: ConfigValue::defaulted(DEFAULT_LOG_LEVEL.to_string()),
            config_file: None,
            sync: SyncConfig::default(),
        };

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            config.apply_file(&path)?;
        }
        config.apply_env();
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let file: ConfigFile = serde_yaml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;

        if let Some(db_path) = file.database_path {
            // relative to the config file's directory
            let resolved = match path.parent() {
                Some(dir) if db_path.is_relative() => dir.join(db_path),
                _ => db_path,
            };
            self.database_path.set(resolved, ConfigSource::File);
        }
        if let Some(user) = file.user_id {
            self.user_id.set(user, ConfigSource::File);
        }
        if let Some(level) = file.log_level {
            self.log_level.set(level, ConfigSource::File);
        }
        if let Some(sync) = file.sync {
            self.sync = sync;
        }
        self.config_file = Some(path.to_path_buf());
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(db_path) = std::env::var("PATHFINDER_DATABASE_PATH") {
            self.database_path
                .set(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(user) = std::env::var("PATHFINDER_USER_ID") {
            self.user_id.set(user, ConfigSource::Environment);
        }
        if let Ok(level) = std::env::var("PATHFINDER_LOG") {
            self.log_level.set(level, ConfigSource::Environment);
        }
    }

    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("missing.yaml"))).unwrap();

        assert!(config.database_path.value.ends_with("pathfinder.db"));
        assert_eq!(config.database_path.source, ConfigSource::Default);
        assert_eq!(config.user_id.value, "default");
        assert_eq!(config.log_level.value, DEFAULT_LOG_LEVEL);
        assert_eq!(config.sync.replace_strategy, ReplaceStrategy::Atomic);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_file_values_and_sources() {
        let (_dir, path) = write_config(
            "database_path: /srv/trips/db.sqlite\n\
             user_id: traveler\n\
             log_level: pathfinder=debug\n\
             sync:\n  replace_strategy: delete-then-insert\n",
        );

        let config = Config::load(Some(path.clone())).unwrap();
        assert_eq!(
            config.database_path.value,
            PathBuf::from("/srv/trips/db.sqlite")
        );
        assert_eq!(config.database_path.source, ConfigSource::File);
        assert_eq!(config.user_id.value, "traveler");
        assert_eq!(config.user_id.source, ConfigSource::File);
        assert_eq!(config.log_level.value, "pathfinder=debug");
        assert_eq!(config.log_level.source, ConfigSource::File);
        assert_eq!(
            config.sync.replace_strategy,
            ReplaceStrategy::DeleteThenInsert
        );
        assert_eq!(config.config_file, Some(path));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let (_dir, path) = write_config("user_id: traveler\n");

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.user_id.source, ConfigSource::File);
        assert_eq!(config.log_level.source, ConfigSource::Default);
        assert_eq!(config.database_path.source, ConfigSource::Default);
    }

    #[test]
    fn test_relative_database_path_resolves_against_config_dir() {
        let (dir, path) = write_config("database_path: data/trips.db\n");

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.database_path.value, dir.path().join("data/trips.db"));
    }

    #[test]
    #[ignore] // mutates process env; run alone with --ignored
    fn test_env_overrides_file() {
        let (_dir, path) = write_config("user_id: fromfile\n");
        std::env::set_var("PATHFINDER_USER_ID", "fromenv");

        let config = Config::load(Some(path)).unwrap();
        std::env::remove_var("PATHFINDER_USER_ID");

        assert_eq!(config.user_id.value, "fromenv");
        assert_eq!(config.user_id.source, ConfigSource::Environment);
    }

    #[test]
    fn test_malformed_yaml_reports_path() {
        let (_dir, path) = write_config("sync: [unclosed\n");

        let err = Config::load(Some(path.clone())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(..)));
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let (_dir, path) = write_config("sync:\n  replace_strategy: eventually\n");
        assert!(matches!(
            Config::load(Some(path)),
            Err(ConfigError::Parse(..))
        ));
    }
}
