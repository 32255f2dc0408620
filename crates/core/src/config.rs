//! Application configuration.
//!
//! Settings are layered, lowest priority first: built-in defaults, the
//! optional `{base}/config.toml`, then `ENEA_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Name of the directory holding all frontend state, under the home directory.
pub const BASE_DIR_NAME: &str = ".enea";
/// Configuration file name inside the base directory.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix of environment overrides, e.g. `ENEA_ROM_DIR`.
pub const ENV_PREFIX: &str = "ENEA";

const DEFAULT_EMULATOR: &str = "advmame";
const DEFAULT_EMULATOR_ARGS: &str = "-misc_quiet -nomisc_safequit";
const DEFAULT_MAX_PLAYERS: i64 = 4;

/// Configuration failures; both are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither a home directory nor a temporary directory is available.
    #[error("no usable home or temporary directory")]
    NoBaseDirectory,
    /// A configuration layer could not be read or does not deserialize.
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root of all frontend state.
    pub base_dir: PathBuf,
    /// Folder scanned for ROMs.
    pub rom_dir: PathBuf,
    /// Folder holding source caches.
    pub cache_dir: PathBuf,
    /// Emulator executable.
    pub emulator: String,
    /// Arguments passed to the emulator before the input bindings.
    pub emulator_args: String,
    /// External input mapping database replacing the embedded one.
    #[serde(default)]
    pub input_database: Option<PathBuf>,
    /// Upper bound on simultaneous players.
    pub max_players: usize,
}

impl AppConfig {
    /// Load the configuration rooted at the default base directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(base_dir()?)
    }

    /// Load the configuration rooted at `base`.
    pub fn load_from(base: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(base.into(), None)
    }

    /// Load with `env` standing in for the process environment when given.
    fn load_with_env(
        base: PathBuf,
        env: Option<::config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let path_default = |dir: &str| base.join(dir).to_string_lossy().into_owned();

        let settings = ::config::Config::builder()
            .set_default("base_dir", base.to_string_lossy().into_owned())?
            .set_default("rom_dir", path_default("roms"))?
            .set_default("cache_dir", path_default("cache"))?
            .set_default("emulator", DEFAULT_EMULATOR)?
            .set_default("emulator_args", DEFAULT_EMULATOR_ARGS)?
            .set_default("max_players", DEFAULT_MAX_PLAYERS)?
            .add_source(::config::File::from(base.join(CONFIG_FILE)).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Folder receiving log files.
    pub fn log_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Create the ROM, cache and log folders if they are missing.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        for dir in [&self.rom_dir, &self.cache_dir, &self.log_dir()] {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Default base directory: `{home}/.enea`, where home is `HOME`, the
/// platform home directory or, failing both, the temporary directory.
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir);
    resolve_base_dir(home, Some(std::env::temp_dir()))
}

fn resolve_base_dir(home: Option<PathBuf>, temp: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    [home, temp]
        .into_iter()
        .flatten()
        .find(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(BASE_DIR_NAME))
        .ok_or(ConfigError::NoBaseDirectory)
}

/// Write a commented configuration file under `base` unless one exists.
///
/// Returns the file location.
pub fn ensure_default_config(base: &Path) -> anyhow::Result<PathBuf> {
    let path = base.join(CONFIG_FILE);
    if path.exists() {
        return Ok(path);
    }

    fs::create_dir_all(base)
        .with_context(|| format!("failed to create directory {}", base.display()))?;
    let contents = format!(
        "# enea configuration. Every setting can also be overridden with an\n\
         # {ENV_PREFIX}_<NAME> environment variable.\n\
         \n\
         # rom_dir = \"{roms}\"\n\
         # cache_dir = \"{cache}\"\n\
         # input_database = \"/path/to/inputdb.json\"\n\
         emulator = \"{DEFAULT_EMULATOR}\"\n\
         emulator_args = \"{DEFAULT_EMULATOR_ARGS}\"\n\
         max_players = {DEFAULT_MAX_PLAYERS}\n",
        roms = base.join("roms").display(),
        cache = base.join("cache").display(),
    );
    fs::write(&path, contents)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!("Wrote default configuration to {}", path.display());
    Ok(path)
}
