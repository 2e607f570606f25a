pub mod ask;
pub mod config_cmd;
pub mod gateway;
pub mod memory;
pub mod status;

use std::path::{Path, PathBuf};
use vesta_config::{AppConfig, ConfigError};

/// Where the config lives: the `--config` flag, or `~/.vesta/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load, apply environment overrides and validate.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::load_from(&config_path(explicit))?;
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_is_under_config_dir() {
        let path = config_path(None);
        assert!(path.ends_with("config.toml"));
        assert!(path.starts_with(AppConfig::config_dir()));
    }

    #[test]
    fn missing_explicit_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(dir.path().join("absent.toml").as_path())).unwrap();
        assert_eq!(config.assistant.name, "Vesta");
    }
}
