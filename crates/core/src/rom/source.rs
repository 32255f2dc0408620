use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use once_cell::sync::OnceCell;
use tracing::{debug, info, trace, warn};
use xxhash_rust::xxh3::xxh3_64;

use super::{
    cache::{CacheDocument, CacheError, CacheStore, FileCacheStore},
    Game, RomLookup, RomMedia, SourceBackend,
};
use crate::model::Model;

const ROM_EXTENSIONS: &[&str] = &["zip"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Classification of a scanned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Archive holding a game.
    Rom,
    /// Screenshot candidate.
    Image,
    /// Anything else, ignored.
    Other,
}

impl FileKind {
    /// Classify `path` by its extension, ignoring case.
    pub fn of(path: &Path) -> Self {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return Self::Other;
        };
        let matches = |known: &&str| known.eq_ignore_ascii_case(extension);
        if ROM_EXTENSIONS.iter().any(matches) {
            Self::Rom
        } else if IMAGE_EXTENSIONS.iter().any(matches) {
            Self::Image
        } else {
            Self::Other
        }
    }
}

/// Cache file name for a source identity.
pub fn cache_file_name(identifier: &str) -> String {
    format!("{}.json", xxh3_64(identifier.as_bytes()))
}

/// A ROM origin publishing its launchable games into a [`Model`].
///
/// The first call to [`Source::monitor`] either restores the last scan from
/// the cache file or scans the backend; every later call is a no-op.
pub struct Source<B> {
    backend: B,
    lookup: Arc<dyn RomLookup>,
    cache_file: PathBuf,
    version: String,
    store: Box<dyn CacheStore>,
    model: Model<Game>,
    /// Set once monitoring completed; holds the fingerprint used.
    monitored: OnceCell<Option<String>>,
}

impl<B: SourceBackend> Source<B> {
    /// Create a source whose cache lives in `cache_dir`.
    pub fn new(backend: B, lookup: Arc<dyn RomLookup>, cache_dir: impl AsRef<Path>) -> Self {
        let cache_file = cache_dir
            .as_ref()
            .join(cache_file_name(backend.identifier()));
        Self {
            backend,
            lookup,
            cache_file,
            version: crate::VERSION.to_string(),
            store: Box::new(FileCacheStore),
            model: Model::new(),
            monitored: OnceCell::new(),
        }
    }

    /// Override the software version written to and expected from the cache.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Replace the cache storage.
    pub fn with_cache_store(mut self, store: impl CacheStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Backend this source reads from.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Location of this source's cache file.
    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    /// Published games; register observers here before monitoring.
    pub fn model(&self) -> &Model<Game> {
        &self.model
    }

    /// Snapshot of the published games.
    pub fn games(&self) -> Vec<Game> {
        self.model.elements()
    }

    /// Whether monitoring has completed.
    pub fn is_monitored(&self) -> bool {
        self.monitored.get().is_some()
    }

    /// Load from cache or scan, then publish launchable games.
    ///
    /// Runs at most once per source; concurrent callers block until the first
    /// run completes.
    pub fn monitor(&self) {
        self.monitored.get_or_init(|| self.run_monitor());
    }

    /// Persist the published games along with the fingerprint used by
    /// [`Source::monitor`].
    pub fn write_cache(&self) -> Result<(), CacheError> {
        let write_log = format!(
            r#"Cache write operation to "{}"."#,
            self.cache_file.display()
        );
        let result = self.try_write_cache();
        match &result {
            Ok(()) => info!("{write_log} Successfully completed"),
            Err(err) => warn!("{write_log} Failed: {err}"),
        }
        result
    }

    fn try_write_cache(&self) -> Result<(), CacheError> {
        let last_modified = self
            .monitored
            .get()
            .ok_or(CacheError::NotMonitored)?
            .clone()
            .ok_or(CacheError::UnknownLastModified)?;

        let document = CacheDocument {
            version: self.version.clone(),
            last_modified,
            roms: self.model.elements(),
        };
        let contents = document.to_pretty_string()?;
        self.store
            .write(&self.cache_file, &contents)
            .map_err(|source| CacheError::Write {
                path: self.cache_file.clone(),
                source,
            })
    }

    fn run_monitor(&self) -> Option<String> {
        let monitor_log = format!(
            r#"Rom monitor operation on "{}"."#,
            self.backend.identifier()
        );

        let last_modified = self.backend.last_modified();
        if last_modified.is_none() {
            warn!(
                "{monitor_log} Failed to retrieve source last modified time, this source will not have a cache"
            );
        }

        let roms = match self.cached(last_modified.as_deref()) {
            Some(roms) => roms,
            None => self.parse(),
        };

        for rom in roms {
            if rom.info().is_launchable() {
                trace!(r#"{monitor_log} Found rom "{rom}""#);
                self.model.add_element(rom);
            } else {
                trace!(r#"{monitor_log} Rom "{rom}" is not launchable, will not be added"#);
            }
        }

        info!(
            "{monitor_log} Successfully retrieved {} roms",
            self.model.len()
        );
        last_modified
    }

    /// Games from the cache file, when it exists and still describes the
    /// backend.
    fn cached(&self, current: Option<&str>) -> Option<Vec<Game>> {
        let cache_log = format!(
            r#"Cache retrieval operation from "{}"."#,
            self.cache_file.display()
        );
        let document = self.store.read(&self.cache_file)?;

        let version = match CacheDocument::version_of(&document) {
            Ok(version) => version,
            Err(err) => {
                warn!("{cache_log} Failed because cache is not well formed: {err}");
                return None;
            }
        };
        if version != self.version {
            debug!(
                r#"{cache_log} Failed because cache and software versions differ, cache: "{version}", software: "{}""#,
                self.version
            );
            return None;
        }

        let recorded = match CacheDocument::last_modified_of(&document) {
            Ok(recorded) => recorded,
            Err(err) => {
                warn!("{cache_log} Failed because cache is not well formed: {err}");
                return None;
            }
        };
        let Some(current) = current else {
            warn!("{cache_log} Failed because source last modification time is unknown");
            return None;
        };
        if recorded != current {
            debug!(
                r#"{cache_log} Failed because source was modified, cache is dated "{recorded}", source "{current}""#
            );
            return None;
        }

        match CacheDocument::decode(&document) {
            Ok(decoded) => {
                debug!("{cache_log} Success. Cache had {} entries", decoded.roms.len());
                Some(decoded.roms)
            }
            Err(err) => {
                warn!("{cache_log} Failed because cache is not well formed: {err}");
                None
            }
        }
    }

    /// Scan the backend and build games for every known ROM.
    fn parse(&self) -> Vec<Game> {
        let parse_log = format!(
            r#"Rom parse operation on "{}"."#,
            self.backend.identifier()
        );
        let files = self.backend.scan();
        let (roms, images): (Vec<&PathBuf>, Vec<&PathBuf>) = files
            .iter()
            .filter(|file| FileKind::of(file) != FileKind::Other)
            .partition(|file| FileKind::of(file) == FileKind::Rom);

        let mut games = Vec::with_capacity(roms.len());
        for rom in roms {
            let Some(stem) = rom.file_stem() else {
                continue;
            };
            let info = match stem.to_str().and_then(|stem| self.lookup.rom_info(stem)) {
                Some(info) => info,
                None => {
                    trace!(
                        r#"{parse_log} File "{}" does not look like a rom, will not be added"#,
                        rom.display()
                    );
                    continue;
                }
            };

            // Last image sharing the stem wins.
            let screenshot = images
                .iter()
                .rev()
                .find(|image| image.file_stem() == Some(stem))
                .map(|image| image.to_path_buf());

            games.push(Game::new(rom.as_path(), info, RomMedia { screenshot }));
        }

        debug!("{parse_log} Found {} roms in {} files", games.len(), files.len());
        games
    }
}

impl<B: SourceBackend + 'static> Source<B> {
    /// Run [`Source::monitor`] on the blocking pool.
    ///
    /// Awaiting the handle is the join point for callers that need the
    /// published games.
    pub fn spawn_monitor(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let source = Arc::clone(self);
        tokio::task::spawn_blocking(move || source.monitor())
    }
}
