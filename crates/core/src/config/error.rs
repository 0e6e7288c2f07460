//! Errors raised while loading `.storyboard-kit/config.toml`, the briefs
//! under `.storyboard-kit/briefs/`, and resume artifact files.

use std::path::PathBuf;
use thiserror::Error;

/// Why a settings, brief or artifacts file could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Failed to read config file at {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `config.toml` or a `.toml` brief is malformed.
    #[error("Failed to parse TOML file at {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Failed to parse a YAML brief.
    #[error("Failed to parse YAML file at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// Failed to parse a JSON artifacts file.
    #[error("Failed to parse JSON file at {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The briefs directory could not be listed.
    #[error("Failed to traverse directory {path}: {source}")]
    DirectoryWalk {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// File extension is not one we know how to read.
    #[error("Unsupported file format for {path}; expected .yaml, .yml, .toml or .json")]
    UnsupportedFormat { path: PathBuf },

    /// A value parsed but is out of range, e.g. a zero label limit.
    #[error("Invalid configuration in {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}

/// Type alias for Result with ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
