//! Input devices and their translation to frontend and emulator commands.

/// Emulator and frontend command sets.
pub mod command;
/// Device in a slot with its mapping and fallback resolution.
pub mod device;
/// Events delivered by the windowing layer.
pub mod event;
/// Hardware identification of devices.
pub mod identification;
/// Connected devices, menu actions and the emulator control string.
pub mod manager;
/// Command to button association, with the built-in defaults.
pub mod mapping;

mod button;

use thiserror::Error;

pub use button::{AxisPosition, ButtonType, EmulatorButton, FrontendButton};
pub use command::{EmulatorCommand, FrontendCommand};
pub use device::Device;
pub use event::{InputEvent, JoystickAxis, Key};
pub use identification::{DeviceType, Identification};
pub use manager::{FrontendAction, Manager, MappingLookup, MAX_PLAYERS};
pub use mapping::{Mapping, DEFAULT_JOYSTICK, DEFAULT_KEYBOARD};

use crate::database::Table;

/// Device specific mappings keyed by hardware identification.
pub type InputDatabase = Table<Identification, Mapping>;

/// Failures of the input subsystem.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    /// No mapping tier binds the command.
    #[error("no emulator button associated to command {0}")]
    NoInputAvailable(EmulatorCommand),
    /// The command does not belong to any player.
    #[error("command {0} is not bound to any player")]
    UnsupportedCommand(EmulatorCommand),
    /// The name does not denote an emulator command.
    #[error("unknown emulator command \"{0}\"")]
    UnknownCommand(String),
}
