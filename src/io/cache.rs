//! FindMy cache record sources
//!
//! The macOS FindMy app keeps two JSON caches:
//! - `Items.data` - AirTags and third-party items
//! - `Devices.data` - Apple devices (phones, laptops, watches)
//!
//! Each file is a JSON array of device objects. A broken file fails the whole
//! source; a single entry that is not a device object is skipped.

use crate::domain::record::RawDeviceRecord;
use crate::infra::error::{ConfigError, SourceReadError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Cache location relative to the user's home directory
const CACHE_SUBDIR: &str = "Library/Caches/com.apple.findmy.fmipcore";

/// A sequence of raw device records read in one go
pub trait RecordSource: Send + Sync {
    /// Short name used in logs and errors ("items", "devices")
    fn name(&self) -> &'static str;

    fn load(&self) -> Result<Vec<RawDeviceRecord>, SourceReadError>;
}

/// Which of the two cache files a source reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Items,
    Devices,
}

impl CacheKind {
    pub fn name(&self) -> &'static str {
        match self {
            CacheKind::Items => "items",
            CacheKind::Devices => "devices",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            CacheKind::Items => "Items.data",
            CacheKind::Devices => "Devices.data",
        }
    }
}

/// Record source backed by one FindMy cache file
#[derive(Debug, Clone)]
pub struct CacheFile {
    kind: CacheKind,
    path: PathBuf,
}

impl CacheFile {
    pub fn new(kind: CacheKind, cache_dir: &Path) -> Self {
        Self { kind, path: cache_dir.join(kind.file_name()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for CacheFile {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn load(&self) -> Result<Vec<RawDeviceRecord>, SourceReadError> {
        let source_name = self.name();
        let content = fs::read_to_string(&self.path).map_err(|source| SourceReadError::Io {
            source_name,
            path: self.path.clone(),
            source,
        })?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|source| SourceReadError::Parse {
                source_name,
                path: self.path.clone(),
                source,
            })?;
        let serde_json::Value::Array(entries) = value else {
            return Err(SourceReadError::NotAList { source_name, path: self.path.clone() });
        };

        let records = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match RawDeviceRecord::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(source = %source_name, index, error = %e, "record_skipped");
                    None
                }
            })
            .collect();
        Ok(records)
    }
}

/// Default FindMy cache directory for the current user
pub fn default_cache_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().map(|home| home.join(CACHE_SUBDIR)).ok_or(ConfigError::NoHomeDir)
}

/// Both cache sources in processing order: items, then devices
pub fn cache_sources(cache_dir: &Path) -> Vec<Box<dyn RecordSource>> {
    vec![
        Box::new(CacheFile::new(CacheKind::Items, cache_dir)),
        Box::new(CacheFile::new(CacheKind::Devices, cache_dir)),
    ]
}
