//! Error types
//!
//! - `ConfigError` is fatal at startup
//! - `SourceReadError` aborts the current sync pass only

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The provided path {0} is not a file")]
    NotAFile(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The file {path} does not contain valid data: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("The location \"{zone}\" is not a valid object")]
    ZoneNotAnObject { zone: String },

    #[error("The location name must not be empty")]
    EmptyZoneName,

    #[error("The location \"{zone}\" does not contain a valid {field}: {reason}")]
    InvalidZoneField { zone: String, field: &'static str, reason: &'static str },

    #[error("Could not determine the home directory; pass --cache-dir")]
    NoHomeDir,
}

#[derive(Debug, Error)]
pub enum SourceReadError {
    #[error("Failed to read {source_name} from {path}: {source}")]
    Io {
        source_name: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {source_name} from {path}: {source}")]
    Parse {
        source_name: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{source_name} at {path} is not a list of devices")]
    NotAList { source_name: &'static str, path: PathBuf },
}

impl SourceReadError {
    /// Name of the record source that failed
    pub fn source_name(&self) -> &'static str {
        match self {
            SourceReadError::Io { source_name, .. }
            | SourceReadError::Parse { source_name, .. }
            | SourceReadError::NotAList { source_name, .. } => source_name,
        }
    }
}
