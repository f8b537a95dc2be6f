//! Configuration loading and data folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Default filename of the SQLite database inside the data folder
pub const DATABASE_FILENAME: &str = "ytcl.db";

/// Default filename of the bundled fallback dataset inside the data folder
pub const FALLBACK_DATASET_FILENAME: &str = "channel_data.json";

/// Data folder resolution, priority order:
/// 1. Command-line argument (highest priority)
/// 2. `YTCL_DATA` environment variable
/// 3. TOML config file (`data_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("YTCL_DATA") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(data_folder) = config.get("data_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(data_folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_data_folder()
}

/// Path of the database inside the data folder
pub fn database_path(data_folder: &std::path::Path) -> PathBuf {
    data_folder.join(DATABASE_FILENAME)
}

/// Path of the fallback dataset inside the data folder
pub fn fallback_dataset_path(data_folder: &std::path::Path) -> PathBuf {
    data_folder.join(FALLBACK_DATASET_FILENAME)
}

/// Create the data folder if it does not exist yet
pub fn ensure_data_folder(data_folder: &std::path::Path) -> Result<()> {
    std::fs::create_dir_all(data_folder)?;
    Ok(())
}

/// Locate the configuration file for the platform
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/ytcl/config.toml first, then /etc/ytcl/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("ytcl").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/ytcl/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("ytcl").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// Get OS-dependent default data folder path
fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/ytcl (or /var/lib/ytcl for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("ytcl"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/ytcl"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("ytcl"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/ytcl"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("ytcl"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\ytcl"))
    } else {
        PathBuf::from("./ytcl_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_wins() {
        let folder = resolve_data_folder(Some("/tmp/ytcl-test"));
        assert_eq!(folder, PathBuf::from("/tmp/ytcl-test"));
    }

    #[test]
    fn test_default_folder_is_absolute_or_local() {
        let folder = resolve_data_folder(None);
        assert!(!folder.as_os_str().is_empty());
    }

    #[test]
    fn test_derived_paths() {
        let folder = PathBuf::from("/data");
        assert_eq!(database_path(&folder), PathBuf::from("/data/ytcl.db"));
        assert_eq!(
            fallback_dataset_path(&folder),
            PathBuf::from("/data/channel_data.json")
        );
    }
}
