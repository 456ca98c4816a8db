//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::FastDlConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Config file names tried inside each search directory.
const CONFIG_FILE_NAMES: [&str; 1] = ["fastdl.toml"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<FastDlConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: FastDlConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Candidate config locations for a game directory, in priority order.
pub fn search_paths(game_dir: &Path) -> Vec<PathBuf> {
    let dirs = [game_dir.to_path_buf(), game_dir.join("addons").join("fastdl")];

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .collect()
}

/// Load the first config found next to the game files, or the defaults.
///
/// Returns the path the config came from, if any.
pub fn load_for_game_dir(game_dir: &Path) -> Result<(FastDlConfig, Option<PathBuf>), ConfigError> {
    for path in search_paths(game_dir) {
        if path.is_file() {
            let config = load_config(&path)?;
            return Ok((config, Some(path)));
        }
    }

    Ok((FastDlConfig::default(), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, source) = load_for_game_dir(dir.path()).unwrap();

        assert!(source.is_none());
        assert!(!config.serve_precached);
        assert_eq!(config.cache.size.bytes(), 100 * 1024 * 1024);
    }

    #[test]
    fn test_addons_location_is_searched() {
        let dir = tempfile::tempdir().unwrap();
        let addons = dir.path().join("addons").join("fastdl");
        fs::create_dir_all(&addons).unwrap();
        fs::write(
            addons.join("fastdl.toml"),
            r#"
auto_index_enabled = true
serve_precached = true
block_list_ip = ["10.0.0.0/8"]

[listener]
host = "192.0.2.10"
port = 27080

[cache]
size = "8MB"

[[rate_limits]]
period_secs = 10
limit = 50
"#,
        )
        .unwrap();

        let (config, source) = load_for_game_dir(dir.path()).unwrap();

        assert_eq!(source.as_deref(), Some(addons.join("fastdl.toml").as_path()));
        assert!(config.auto_index_enabled);
        assert!(config.serve_precached);
        assert_eq!(config.listener.port, 27080);
        assert_eq!(config.cache.size.bytes(), 8 * 1024 * 1024);
        assert_eq!(config.rate_limits.len(), 1);
        assert_eq!(config.block_list_ip, vec!["10.0.0.0/8".to_string()]);
        // Sections left out keep their defaults.
        assert!(!config.access.allowed_extensions.is_empty());
    }

    #[test]
    fn test_game_dir_config_wins() {
        let dir = tempfile::tempdir().unwrap();
        let addons = dir.path().join("addons").join("fastdl");
        fs::create_dir_all(&addons).unwrap();
        fs::write(addons.join("fastdl.toml"), "auto_index_enabled = false\n").unwrap();
        fs::write(dir.path().join("fastdl.toml"), "auto_index_enabled = true\n").unwrap();

        let (config, _) = load_for_game_dir(dir.path()).unwrap();
        assert!(config.auto_index_enabled);
    }

    #[test]
    fn test_invalid_pattern_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fastdl.toml");
        fs::write(&path, "[access]\nforbidden_regexp = [\"(\"]\n").unwrap();

        match load_config(&path) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
