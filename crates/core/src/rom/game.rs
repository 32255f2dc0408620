use std::{
    fmt,
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{from_serde, lenient, lenient_or_default, DocumentError, FromDocument};

/// Metadata describing a ROM, as found in the metadata database.
///
/// Every field is optional; absent fields are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RomInfo {
    /// Human-readable game title.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub title: Option<String>,
    /// Release year, kept verbatim (databases contain values such as `199?`).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub year: Option<String>,
    /// Manufacturer credit.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub manufacturer: Option<String>,
    /// Set when the file is a support BIOS rather than a game.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub is_bios: Option<bool>,
    /// Explicit runnability flag carried by some database generations.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub is_runnable: Option<bool>,
}

impl RomInfo {
    /// Whether a ROM with this metadata may be handed to the emulator.
    ///
    /// `isBios == true` always wins; without either flag every entry is
    /// launchable.
    pub fn is_launchable(&self) -> bool {
        self.is_bios != Some(true) && self.is_runnable != Some(false)
    }
}

impl FromDocument for RomInfo {
    fn from_document(document: &Value) -> Result<Self, DocumentError> {
        if !document.is_object() {
            return Err(DocumentError::Invalid(format!(
                "rom info must be an object, found {document}"
            )));
        }
        from_serde(document)
    }
}

/// Media files associated with a ROM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomMedia {
    /// Image sharing the ROM's file stem.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub screenshot: Option<PathBuf>,
}

/// A launchable ROM file together with its metadata.
///
/// Two games are the same game when their paths are equal; metadata and
/// media do not take part in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    path: PathBuf,
    #[serde(default, deserialize_with = "lenient_or_default")]
    info: RomInfo,
    #[serde(default, deserialize_with = "lenient_or_default")]
    media: RomMedia,
}

impl Game {
    /// Build a game from its file path and metadata.
    pub fn new(path: impl Into<PathBuf>, info: RomInfo, media: RomMedia) -> Self {
        Self {
            path: path.into(),
            info,
            media,
        }
    }

    /// Location of the ROM file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Database metadata.
    pub fn info(&self) -> &RomInfo {
        &self.info
    }

    /// Associated media.
    pub fn media(&self) -> &RomMedia {
        &self.media
    }

    /// Attach media discovered after construction.
    pub fn set_media(&mut self, media: RomMedia) {
        self.media = media;
    }

    /// File stem, which is also the key into the metadata database.
    pub fn stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|stem| stem.to_str())
    }

    /// Title when known, file stem otherwise.
    pub fn display_name(&self) -> String {
        self.info
            .title
            .clone()
            .or_else(|| self.stem().map(str::to_string))
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl PartialEq for Game {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Game {}

impl Hash for Game {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromDocument for Game {
    fn from_document(document: &Value) -> Result<Self, DocumentError> {
        if document.get("path").is_none() {
            return Err(DocumentError::MissingField("path"));
        }
        from_serde(document)
    }
}
