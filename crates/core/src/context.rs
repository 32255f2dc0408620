//! Process-wide state built once at startup.

use std::sync::Arc;

use crate::{
    config::AppConfig,
    database::{Embedded, External, Table},
    emulator::Emulator,
    input::{InputDatabase, Manager, MappingLookup},
    rom::{Folder, RomDatabase, RomLookup, Source},
};

const ROM_DATABASE: Embedded = Embedded::new("romdb", include_str!("../resources/romdb.json"));
const INPUT_DATABASE: Embedded =
    Embedded::new("inputdb", include_str!("../resources/inputdb.json"));

/// Owns the configuration and the metadata databases.
///
/// Databases load lazily on first query and are shared with every source and
/// input manager created from the context.
pub struct Context {
    config: AppConfig,
    rom_database: Arc<RomDatabase>,
    input_database: Arc<InputDatabase>,
}

impl Context {
    /// Build the context with the embedded databases, or the external input
    /// database when the configuration names one.
    pub fn new(config: AppConfig) -> Self {
        let input_database = match &config.input_database {
            Some(path) => Table::new(External::new(path)),
            None => Table::new(INPUT_DATABASE),
        };
        Self {
            config,
            rom_database: Arc::new(Table::new(ROM_DATABASE)),
            input_database: Arc::new(input_database),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// ROM metadata keyed by file stem.
    pub fn rom_database(&self) -> &Arc<RomDatabase> {
        &self.rom_database
    }

    /// Device specific input mappings.
    pub fn input_database(&self) -> &Arc<InputDatabase> {
        &self.input_database
    }

    /// Source watching the configured ROM folder.
    pub fn rom_source(&self) -> Source<Folder> {
        let lookup: Arc<dyn RomLookup> = self.rom_database.clone();
        Source::new(Folder::new(&self.config.rom_dir), lookup, &self.config.cache_dir)
    }

    /// Input manager seeded with the keyboard.
    pub fn input_manager(&self) -> Manager {
        let lookup: Arc<dyn MappingLookup> = self.input_database.clone();
        Manager::new(lookup).with_max_players(self.config.max_players)
    }

    /// Emulator launcher.
    pub fn emulator(&self) -> Emulator {
        Emulator::from_config(&self.config)
    }
}
