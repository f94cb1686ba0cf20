//! Configuration file loading for the CLI.
//!
//! Finds and loads TOML configuration from an explicit path, the local
//! project directory, or the platform config directory, falling back to
//! defaults.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use cavern::{AnalyzerConfig, CavernError};

/// Configuration-related errors for the CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("missing configuration file: {0}")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for CavernError {
    fn from(err: ConfigError) -> Self {
        CavernError::Config(err.to_string())
    }
}

/// Find and load configuration.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (`cavern/config.toml`)
/// 3. Platform-specific config directory
/// 4. Defaults if none found
pub fn load_config(
    explicit_path: Option<impl AsRef<Path>>,
) -> Result<AnalyzerConfig, CavernError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("cavern/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "cavern", "cavern") {
        let system_config = proj_dirs.config_dir().join("config.toml");
        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(&system_config);
        }
        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AnalyzerConfig::default())
}

fn load_config_file(path: impl AsRef<Path>) -> Result<AnalyzerConfig, CavernError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let contents = fs::read_to_string(path)?;
    let config =
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_missing_path_is_an_error() {
        let result = load_config(Some("/nonexistent/cavern.toml"));
        assert!(matches!(result, Err(CavernError::Config(_))));
    }

    #[test]
    fn explicit_path_loads_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_tile_mutations = 42").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.max_tile_mutations, 42);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_tile_mutations = [not toml").unwrap();
        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(CavernError::Config(_))));
    }
}
