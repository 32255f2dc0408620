//! ROM discovery, enrichment and caching.

/// Versioned on-disk snapshot of a scan.
pub mod cache;
/// Filesystem backend for sources.
pub mod folder;
/// ROM entities.
pub mod game;
/// Scan-or-load state machine publishing games to a model.
pub mod source;

use std::path::PathBuf;

pub use cache::{CacheDocument, CacheError, CacheStore, FileCacheStore, MalformedCache};
pub use folder::Folder;
pub use game::{Game, RomInfo, RomMedia};
pub use source::{cache_file_name, FileKind, Source};

use crate::database::Table;

/// Metadata database keyed by ROM file stem.
pub type RomDatabase = Table<String, RomInfo>;

/// Enumerable origin of ROM and media files.
pub trait SourceBackend: Send + Sync {
    /// Stable identity, used to name the cache file.
    fn identifier(&self) -> &str;

    /// Every file currently available, in a deterministic order.
    fn scan(&self) -> Vec<PathBuf>;

    /// Modification fingerprint; `None` when it cannot be computed.
    fn last_modified(&self) -> Option<String>;
}

/// Metadata lookup by ROM file stem.
pub trait RomLookup: Send + Sync {
    /// Metadata for `stem`, `None` when unknown or when the lookup is unusable.
    fn rom_info(&self, stem: &str) -> Option<RomInfo>;
}

impl RomLookup for RomDatabase {
    fn rom_info(&self, stem: &str) -> Option<RomInfo> {
        self.find(stem).ok().flatten()
    }
}
