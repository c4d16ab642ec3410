//! Config file loading

use super::settings::Settings;
use crate::error::LoadError;
use std::fs;
use std::path::{Path, PathBuf};

const CANDIDATES: &[&str] =
    &["cella-stats.toml", ".cella-stats.toml", "cella-stats.yaml", "cella-stats.yml"];

/// Load settings from `config_path`, or from a config file discovered in `dir`.
///
/// Without any file the built-in defaults are returned. An explicitly given
/// file must parse; a discovered one that fails is skipped with a warning.
pub fn load_config(dir: &Path, config_path: Option<&Path>) -> Result<Settings, LoadError> {
    let explicit = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(dir),
    };

    let Some(config_file) = discovered else {
        return Ok(Settings::default());
    };

    match parse_config_file(&config_file) {
        Ok(settings) => {
            tracing::debug!("Loaded config from {}", config_file.display());
            Ok(settings)
        }
        Err(e) if explicit => Err(e),
        Err(e) => {
            tracing::warn!("Ignoring auto-discovered config: {}", e);
            Ok(Settings::default())
        }
    }
}

fn parse_config_file(config_file: &Path) -> Result<Settings, LoadError> {
    let fail = |message: String| LoadError::ConfigFile { path: config_file.to_path_buf(), message };

    let content = fs::read_to_string(config_file).map_err(|e| fail(e.to_string()))?;
    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    match ext.as_str() {
        "toml" => parse_toml_config(&content).map_err(fail),
        "yaml" | "yml" => parse_yaml_config(&content).map_err(fail),
        other => Err(fail(format!("unsupported config extension '.{}'", other))),
    }
}

/// Parse TOML config, also accepting everything nested under a `[cella-stats]` table.
fn parse_toml_config(content: &str) -> Result<Settings, String> {
    let raw: toml::Value = toml::from_str(content).map_err(|e| e.to_string())?;
    let config_val = match raw.get("cella-stats") {
        Some(nested) => nested.clone(),
        None => raw,
    };
    config_val.try_into().map_err(|e: toml::de::Error| e.to_string())
}

/// Parse YAML config, also accepting everything nested under a `cella-stats` key.
fn parse_yaml_config(content: &str) -> Result<Settings, String> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    let config_val = match raw.get("cella-stats") {
        Some(nested) => nested.clone(),
        None => raw,
    };
    serde_yaml::from_value(config_val).map_err(|e| e.to_string())
}

fn discover_config(dir: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|candidate| dir.join(candidate)).find(|path| path.is_file())
}
