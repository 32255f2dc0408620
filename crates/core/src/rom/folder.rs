use std::{
    env,
    path::{Path, PathBuf},
    time::SystemTime,
};

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

use super::SourceBackend;

/// Format used for source modification fingerprints.
pub const LAST_MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A directory tree of ROM and media files.
#[derive(Debug, Clone)]
pub struct Folder {
    path: PathBuf,
    identifier: String,
}

impl Folder {
    /// Watch the tree rooted at `path`, resolved against the current
    /// directory when relative.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::resolved(env::current_dir().ok().as_deref(), path.into())
    }

    /// Relative paths are resolved against `base`; the identifier is the
    /// resulting absolute root.
    fn resolved(base: Option<&Path>, path: PathBuf) -> Self {
        let path = match base {
            Some(base) => absolute_in(base, &path),
            None => path,
        };
        Self {
            identifier: path.display().to_string(),
            path,
        }
    }

    /// Root of the tree.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn walk(&self) -> impl Iterator<Item = DirEntry> {
        let walk_log = format!(r#"Folder walk operation on "{}"."#, self.identifier);
        WalkDir::new(&self.path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("{walk_log} Skipping entry: {err}");
                    None
                }
            })
    }
}

impl SourceBackend for Folder {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn scan(&self) -> Vec<PathBuf> {
        let scan_log = format!(r#"Rom scan operation on folder "{}"."#, self.identifier);
        let files: Vec<PathBuf> = self
            .walk()
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                trace!(r#"{scan_log} Found file: "{}""#, entry.path().display());
                entry.into_path()
            })
            .collect();

        debug!("{scan_log} Successful. Found {} files", files.len());
        files
    }

    /// Newest modification time among the root and all of its subdirectories.
    ///
    /// Adding or removing a file touches its parent directory, so files
    /// themselves are not inspected.
    fn last_modified(&self) -> Option<String> {
        self.walk()
            .filter(|entry| entry.file_type().is_dir())
            .filter_map(|entry| entry.metadata().ok()?.modified().ok())
            .max()
            .map(format_timestamp)
    }
}

fn absolute_in(base: &Path, path: &Path) -> PathBuf {
    base.join(path).components().collect()
}

/// Render a modification time as a UTC fingerprint.
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format(LAST_MODIFIED_FORMAT)
        .to_string()
}
