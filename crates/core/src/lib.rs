#![warn(clippy::all, missing_docs)]

//! Core domain logic for the enea arcade frontend.
//!
//! This crate hosts the ROM discovery and caching layer, the embedded
//! metadata databases, the input mapping model and the emulator launch
//! boundary used by the command line frontend and any future UI.

pub mod config;
pub mod context;
pub mod database;
pub mod document;
pub mod emulator;
pub mod input;
pub mod model;
pub mod rom;

pub use config::AppConfig;
pub use context::Context;
pub use database::{DatabaseError, Table};
pub use emulator::{Emulator, LaunchError};
pub use model::{ElementId, Model};
pub use rom::{CacheError, Folder, Game, RomInfo, RomMedia, Source};

/// Software version recorded in every cache file.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
