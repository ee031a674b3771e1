//! Configuration loading for Cosmos applications
//!
//! Provides utilities for loading configuration files from the shared
//! Cosmos config directory (~/.config/cosmos/).
//!
//! The directory can be relocated with the `COSMOS_CONFIG_DIR` environment
//! variable, which is how tests and alternate profiles keep their files apart.
//!
//! Call [`init`] at application startup to bootstrap the config directory.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config directory
pub const CONFIG_DIR_ENV: &str = "COSMOS_CONFIG_DIR";

/// Initialize the Cosmos config directory.
///
/// Creates the directory if it doesn't exist and returns its path.
/// Call this once at application startup.
pub fn init() -> Result<PathBuf> {
    ensure_config_dir()
}

/// Get the Cosmos config directory (~/.config/cosmos/ unless overridden)
pub fn config_dir() -> Option<PathBuf> {
    resolve_config_dir(std::env::var_os(CONFIG_DIR_ENV), dirs::config_dir())
}

/// Pick the config directory from an explicit override or the platform base
fn resolve_config_dir(overridden: Option<OsString>, base: Option<PathBuf>) -> Option<PathBuf> {
    match overridden {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => base.map(|p| p.join("cosmos")),
    }
}

/// Get the path to a config file within the Cosmos config directory
pub fn config_path(filename: &str) -> Option<PathBuf> {
    config_dir().map(|p| p.join(filename))
}

/// Load and parse a JSON config file from the Cosmos config directory
pub fn load_json<T: DeserializeOwned>(filename: &str) -> Result<T> {
    let path = config_path(filename).context("Could not determine config directory")?;
    load_json_file(&path)
}

/// Load a JSON config file, falling back to `T::default()` when it is absent.
///
/// A file that exists but fails to parse is still an error.
pub fn load_json_or_default<T: DeserializeOwned + Default>(filename: &str) -> Result<T> {
    match config_path(filename) {
        Some(path) if path.exists() => load_json_file(&path),
        _ => Ok(T::default()),
    }
}

/// Load and parse a JSON file from an arbitrary path
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Check if a config file exists in the Cosmos config directory
pub fn config_exists(filename: &str) -> bool {
    config_path(filename).is_some_and(|p| p.exists())
}

/// Ensure the Cosmos config directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir().context("Could not determine config directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    Ok(dir)
}

/// Save a value as pretty JSON to an arbitrary path
pub fn save_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_resolve_config_dir_default() {
        let dir = resolve_config_dir(None, Some(PathBuf::from("/home/u/.config")));
        assert_eq!(dir, Some(PathBuf::from("/home/u/.config/cosmos")));
    }

    #[test]
    fn test_resolve_config_dir_override() {
        let dir = resolve_config_dir(
            Some(OsString::from("/tmp/profile")),
            Some(PathBuf::from("/home/u/.config")),
        );
        assert_eq!(dir, Some(PathBuf::from("/tmp/profile")));
    }

    #[test]
    fn test_resolve_config_dir_empty_override_ignored() {
        let dir = resolve_config_dir(Some(OsString::new()), Some(PathBuf::from("/base")));
        assert_eq!(dir, Some(PathBuf::from("/base/cosmos")));
        assert_eq!(resolve_config_dir(None, None), None);
    }

    #[test]
    fn test_save_and_load_json_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("sample.json");
        let value = Sample {
            name: "vega".to_string(),
            count: 3,
        };

        save_json_file(&path, &value).unwrap();
        let loaded: Sample = load_json_file(&path).unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn test_load_json_file_reports_parse_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_json_file::<Sample>(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
