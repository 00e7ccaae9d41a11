//! Settings file loader and serialization.

use crate::config::Settings;
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the global settings path: ~/.config/rtkernel/settings.json
pub fn get_global_settings_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine home directory".to_string())
    })?;

    Ok(home.join(".config/rtkernel").join("settings.json"))
}

/// Load settings from a JSON file and validate them.
pub fn load_config_from_file(path: &Path) -> Result<Settings, ConfigError> {
    validate_config_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(format!(
                "Configuration file not found at: {}",
                path.display()
            ))
        } else {
            ConfigError::IoError(e)
        }
    })?;

    let settings: Settings = serde_json::from_str(&content)?;
    settings.validate()?;

    Ok(settings)
}

/// Load settings from `path`, falling back to defaults when the file does not exist.
///
/// A file that exists but fails to parse or validate is still an error.
pub fn load_or_default(path: &Path) -> Result<Settings, ConfigError> {
    match load_config_from_file(path) {
        Ok(settings) => {
            log::debug!("[Config] Loaded settings from {}", path.display());
            Ok(settings)
        }
        Err(ConfigError::FileNotFound(_)) => {
            log::debug!("[Config] No settings at {}, using defaults", path.display());
            Ok(Settings::default())
        }
        Err(e) => Err(e),
    }
}

/// Save settings to a JSON file.
pub fn save_config_to_file(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    validate_config_path(path)?;
    settings.validate()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json_content = serde_json::to_string_pretty(settings)?;
    fs::write(path, json_content)?;

    Ok(())
}

/// Validate config path (.json extension required).
pub fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Configuration path cannot be empty".to_string(),
        ));
    }

    match path.extension() {
        Some(ext) if ext == "json" => {}
        Some(ext) => {
            return Err(ConfigError::ValidationFailed(format!(
                "Configuration file must have .json extension, got .{}",
                ext.to_string_lossy()
            )))
        }
        None => {
            return Err(ConfigError::ValidationFailed(
                "Configuration file must have .json extension".to_string(),
            ))
        }
    }

    if path.to_str().is_none() {
        return Err(ConfigError::ValidationFailed(
            "Configuration path contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config_path() {
        assert!(validate_config_path(Path::new("settings.json")).is_ok());
        assert!(validate_config_path(Path::new("")).is_err());
        assert!(validate_config_path(Path::new("settings.toml")).is_err());
        assert!(validate_config_path(Path::new("settings")).is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.debian_codename = "bookworm".to_string();
        save_config_to_file(&settings, &path).unwrap();

        let loaded = load_config_from_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_or_default(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "arch": "arm64" }"#).unwrap();

        let settings = load_config_from_file(&path).unwrap();
        assert_eq!(settings.arch, "arm64");
        assert_eq!(settings.debian_codename, Settings::default().debian_codename);
    }

    #[test]
    fn test_invalid_json_and_invalid_values_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_or_default(&path),
            Err(ConfigError::InvalidJson(_))
        ));

        fs::write(&path, r#"{ "rt_mirror": "ftp://example.org/rt" }"#).unwrap();
        assert!(matches!(
            load_or_default(&path),
            Err(ConfigError::ValidationFailed(_))
        ));
    }
}
