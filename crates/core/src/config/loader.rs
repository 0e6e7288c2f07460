//! Configuration file loader for the `.storyboard-kit/` directory structure.
//!
//! This module provides functionality to load and parse:
//! - `config.toml`: Orchestrator settings
//! - `briefs/*.yaml`: Named creative briefs
//! - Standalone brief and resume-artifact files passed on the command line

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::{AppConfig, Settings};
use serde::de::DeserializeOwned;
use sk_protocol::{ResumeArtifacts, RunConfig};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Name of the project configuration directory.
pub const CONFIG_DIR: &str = ".storyboard-kit";

/// Loads all configuration from the `.storyboard-kit/` directory.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.storyboard-kit/` folder
///
/// # Returns
///
/// An `AppConfig` containing all loaded configuration. Missing directories
/// or files yield defaults rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if files exist but cannot be read, have invalid
/// syntax, or hold invalid values.
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let sk_dir = root.join(CONFIG_DIR);

    if !sk_dir.exists() {
        return Ok(AppConfig::default());
    }

    let settings = load_settings(&sk_dir)?;
    let briefs = load_briefs(&sk_dir)?;

    Ok(AppConfig { settings, briefs })
}

/// Loads orchestrator settings from `config.toml`.
fn load_settings(sk_dir: &Path) -> ConfigResult<Settings> {
    let config_path = sk_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(Settings::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let settings: Settings =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    if settings.label_max_chars == 0 {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: "label_max_chars must be at least 1".to_string(),
        });
    }

    Ok(settings)
}

/// Loads every brief from `briefs/*.yaml` (and `.yml`), keyed by file stem.
fn load_briefs(sk_dir: &Path) -> ConfigResult<BTreeMap<String, RunConfig>> {
    let briefs_dir = sk_dir.join("briefs");

    if !briefs_dir.exists() {
        return Ok(BTreeMap::new());
    }

    let mut briefs = BTreeMap::new();

    for entry in WalkDir::new(&briefs_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: briefs_dir.clone(),
            source,
        })?;

        let path = entry.path();

        let ext = path.extension().and_then(|s| s.to_str());
        if ext != Some("yaml") && ext != Some("yml") {
            continue;
        }

        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        briefs.insert(name.to_string(), load_brief(path)?);
    }

    Ok(briefs)
}

/// Loads a single brief from a `.yaml`, `.yml` or `.toml` file.
pub fn load_brief(path: &Path) -> ConfigResult<RunConfig> {
    read_structured(path)
}

/// Loads resume artifacts from a `.json`, `.yaml` or `.yml` file.
pub fn load_artifacts(path: &Path) -> ConfigResult<ResumeArtifacts> {
    read_structured(path)
}

fn read_structured<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source,
            })
        }
        Some("toml") => toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        }),
        Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::JsonParse {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}
