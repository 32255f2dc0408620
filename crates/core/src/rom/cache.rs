//! Persisted snapshot of a source's last successful scan.
//!
//! ```json
//! {
//!     "version": "0.1.0",
//!     "lastModified": "2024-03-01 18:22:05",
//!     "roms": [{"path": "/roms/sf2.zip", "info": {...}, "media": {...}}]
//! }
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::Game;
use crate::document::FromDocument;

/// Field holding the software version that produced the cache.
pub const VERSION_FIELD: &str = "version";
/// Field holding the source modification fingerprint.
pub const LAST_MODIFIED_FIELD: &str = "lastModified";
/// Field holding the serialized games.
pub const ROMS_FIELD: &str = "roms";

/// Decoded cache contents.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheDocument {
    /// Software version that wrote the cache.
    pub version: String,
    /// Source fingerprint at the time of the scan.
    pub last_modified: String,
    /// Games published by the source.
    pub roms: Vec<Game>,
}

/// Structural problems that make a cache document unusable as a whole.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedCache {
    /// A top level field is absent or has the wrong type.
    #[error("\"{0}\" field is missing or not a string")]
    MissingField(&'static str),
    /// The roms field is not an array.
    #[error("\"{ROMS_FIELD}\" field is not an array")]
    RomsNotArray,
}

/// Failure to persist a cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// `monitor` was never called on the source.
    #[error("rom source was never monitored")]
    NotMonitored,
    /// The source fingerprint could not be computed.
    #[error("could not retrieve source last modification time")]
    UnknownLastModified,
    /// The document could not be serialized.
    #[error("failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The cache file could not be written.
    #[error("failed to write cache file {path}: {source}")]
    Write {
        /// Cache file location.
        path: PathBuf,
        /// Underlying IO failure.
        source: io::Error,
    },
}

impl CacheDocument {
    /// Read the version tag of a raw document without decoding the roms.
    pub fn version_of(document: &Value) -> Result<&str, MalformedCache> {
        string_field(document, VERSION_FIELD)
    }

    /// Read the fingerprint of a raw document without decoding the roms.
    pub fn last_modified_of(document: &Value) -> Result<&str, MalformedCache> {
        string_field(document, LAST_MODIFIED_FIELD)
    }

    /// Decode a raw document.
    ///
    /// Individual games that cannot be decoded are skipped with a warning; the
    /// remaining games are kept.
    pub fn decode(document: &Value) -> Result<Self, MalformedCache> {
        let version = Self::version_of(document)?.to_string();
        let last_modified = Self::last_modified_of(document)?.to_string();
        let entries = document
            .get(ROMS_FIELD)
            .ok_or(MalformedCache::MissingField(ROMS_FIELD))?
            .as_array()
            .ok_or(MalformedCache::RomsNotArray)?;

        let mut roms = Vec::with_capacity(entries.len());
        for entry in entries {
            match Game::from_document(entry) {
                Ok(game) => {
                    trace!(r#"Rom found in cache: "{game}""#);
                    roms.push(game);
                }
                Err(err) => warn!(
                    r#"Cache entry "{entry}" does not look like a well formed rom, will not be added: {err}"#
                ),
            }
        }

        Ok(Self {
            version,
            last_modified,
            roms,
        })
    }

    /// Encode into a raw document.
    pub fn encode(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            VERSION_FIELD: self.version,
            LAST_MODIFIED_FIELD: self.last_modified,
            ROMS_FIELD: serde_json::to_value(&self.roms)?,
        }))
    }

    /// Human readable rendering written to disk.
    pub fn to_pretty_string(&self) -> Result<String, serde_json::Error> {
        let mut rendered = serde_json::to_string_pretty(&self.encode()?)?;
        rendered.push('\n');
        Ok(rendered)
    }
}

fn string_field<'a>(document: &'a Value, field: &'static str) -> Result<&'a str, MalformedCache> {
    document
        .get(field)
        .and_then(Value::as_str)
        .ok_or(MalformedCache::MissingField(field))
}

/// Storage backend for cache documents.
pub trait CacheStore: Send + Sync {
    /// Read and parse the document at `path`; `None` when absent or unparsable.
    fn read(&self, path: &Path) -> Option<Value>;

    /// Overwrite `path` with `contents`.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
}

/// Cache files stored directly on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCacheStore;

impl CacheStore for FileCacheStore {
    fn read(&self, path: &Path) -> Option<Value> {
        let read_log = format!(r#"Cache read operation from "{}"."#, path.display());
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!("{read_log} Failed because file could not be read: {err}");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(document) => {
                debug!("{read_log} Operation successful");
                Some(document)
            }
            Err(err) => {
                debug!("{read_log} Failed because json could not be parsed: {err}");
                None
            }
        }
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    }
}
