use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    AxisPosition, ButtonType, DeviceType, EmulatorButton, EmulatorCommand, FrontendButton,
    FrontendCommand, JoystickAxis, Key,
};
use crate::document::{from_serde, DocumentError, FromDocument};

/// Default bindings for keyboards, also the last resort for any device.
pub static DEFAULT_KEYBOARD: Lazy<Mapping> = Lazy::new(|| {
    use EmulatorCommand::*;

    let player_one = [
        (P1Up, "w"),
        (P1Down, "s"),
        (P1Left, "a"),
        (P1Right, "d"),
        (P1Button1, "i"),
        (P1Button2, "o"),
        (P1Button3, "p"),
        (P1Button4, "j"),
        (P1Button5, "k"),
        (P1Button6, "l"),
        (Coin1, "3"),
        (Start1, "1"),
    ];
    let player_two = [
        (P2Up, "up"),
        (P2Down, "down"),
        (P2Left, "left"),
        (P2Right, "right"),
        (P2Button1, "7_pad"),
        (P2Button2, "8_pad"),
        (P2Button3, "9_pad"),
        (P2Button4, "4_pad"),
        (P2Button5, "5_pad"),
        (P2Button6, "6_pad"),
        (Coin2, "4"),
        (Start2, "2"),
    ];
    // Players three and four share the two keyboard layouts.
    let player_three = [
        (P3Up, "w"),
        (P3Down, "s"),
        (P3Left, "a"),
        (P3Right, "d"),
        (P3Button1, "i"),
        (P3Button2, "o"),
        (P3Button3, "p"),
        (P3Button4, "j"),
        (P3Button5, "k"),
        (P3Button6, "l"),
        (Coin3, "3"),
        (Start3, "1"),
    ];
    let player_four = [
        (P4Up, "up"),
        (P4Down, "down"),
        (P4Left, "left"),
        (P4Right, "right"),
        (P4Button1, "7_pad"),
        (P4Button2, "8_pad"),
        (P4Button3, "9_pad"),
        (P4Button4, "4_pad"),
        (P4Button5, "5_pad"),
        (P4Button6, "6_pad"),
        (Coin4, "4"),
        (Start4, "2"),
    ];

    let emulator = player_one
        .into_iter()
        .chain(player_two)
        .chain(player_three)
        .chain(player_four)
        .chain([(UiPause, "9"), (UiCancel, "esc")])
        .map(|(command, key)| (command, EmulatorButton::new(ButtonType::Keyboard, key)))
        .collect();

    let frontend = [
        (FrontendCommand::Up, Key::Up),
        (FrontendCommand::Down, Key::Down),
        (FrontendCommand::Esc, Key::Escape),
        (FrontendCommand::Enter, Key::Num1),
    ]
    .into_iter()
    .map(|(command, key)| (command, FrontendButton::KeyboardButton(key)))
    .collect();

    Mapping::new(emulator, frontend)
});

/// Default bindings for joysticks without a dedicated mapping.
pub static DEFAULT_JOYSTICK: Lazy<Mapping> = Lazy::new(|| {
    const PLAYERS: [[EmulatorCommand; 12]; 4] = {
        use EmulatorCommand::*;
        [
            [
                P1Up, P1Down, P1Left, P1Right, P1Button1, P1Button2, P1Button3, P1Button4,
                P1Button5, P1Button6, Coin1, Start1,
            ],
            [
                P2Up, P2Down, P2Left, P2Right, P2Button1, P2Button2, P2Button3, P2Button4,
                P2Button5, P2Button6, Coin2, Start2,
            ],
            [
                P3Up, P3Down, P3Left, P3Right, P3Button1, P3Button2, P3Button3, P3Button4,
                P3Button5, P3Button6, Coin3, Start3,
            ],
            [
                P4Up, P4Down, P4Left, P4Right, P4Button1, P4Button2, P4Button3, P4Button4,
                P4Button5, P4Button6, Coin4, Start4,
            ],
        ]
    };
    // Same physical layout for every player, in the order of `PLAYERS` rows.
    let layout = [
        EmulatorButton::new(ButtonType::JoystickDigital, "1,1,up"),
        EmulatorButton::new(ButtonType::JoystickDigital, "1,1,down"),
        EmulatorButton::new(ButtonType::JoystickDigital, "1,0,left"),
        EmulatorButton::new(ButtonType::JoystickDigital, "1,0,right"),
        EmulatorButton::new(ButtonType::JoystickButton, "a"),
        EmulatorButton::new(ButtonType::JoystickButton, "b"),
        EmulatorButton::new(ButtonType::JoystickButton, "x"),
        EmulatorButton::new(ButtonType::JoystickButton, "y"),
        EmulatorButton::new(ButtonType::JoystickButton, "tl"),
        EmulatorButton::new(ButtonType::JoystickButton, "tr"),
        EmulatorButton::new(ButtonType::JoystickButton, "select"),
        EmulatorButton::new(ButtonType::JoystickButton, "start"),
    ];

    let emulator = PLAYERS
        .iter()
        .flat_map(|commands| commands.iter().copied().zip(layout.iter().cloned()))
        .chain([
            (
                EmulatorCommand::UiPause,
                EmulatorButton::new(ButtonType::JoystickButton, "thumbl"),
            ),
            (
                EmulatorCommand::UiCancel,
                EmulatorButton::new(ButtonType::JoystickButton, "mode"),
            ),
        ])
        .collect();

    let frontend = BTreeMap::from([
        (
            FrontendCommand::Up,
            FrontendButton::Axis(AxisPosition {
                axis: JoystickAxis::PovY,
                range: -100.0,
            }),
        ),
        (
            FrontendCommand::Down,
            FrontendButton::Axis(AxisPosition {
                axis: JoystickAxis::PovY,
                range: 100.0,
            }),
        ),
        (FrontendCommand::Esc, FrontendButton::JoystickButton(10)),
        (FrontendCommand::Enter, FrontendButton::JoystickButton(9)),
    ]);

    Mapping::new(emulator, frontend)
});

/// Association between abstract commands and the buttons of one device.
///
/// Both maps are independent and may be partial; a missing entry means the
/// device has no binding of its own for that command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    emulator: BTreeMap<EmulatorCommand, EmulatorButton>,
    frontend: BTreeMap<FrontendCommand, FrontendButton>,
}

impl Mapping {
    /// Build a mapping from both tables.
    pub fn new(
        emulator: BTreeMap<EmulatorCommand, EmulatorButton>,
        frontend: BTreeMap<FrontendCommand, FrontendButton>,
    ) -> Self {
        Self { emulator, frontend }
    }

    /// Built-in mapping for a device family.
    pub fn default_for(device_type: DeviceType) -> &'static Mapping {
        match device_type {
            DeviceType::Keyboard => &DEFAULT_KEYBOARD,
            DeviceType::Joystick => &DEFAULT_JOYSTICK,
        }
    }

    /// Button bound to an emulator command.
    pub fn emulator_button(&self, command: EmulatorCommand) -> Option<&EmulatorButton> {
        self.emulator.get(&command)
    }

    /// Button bound to a frontend command.
    pub fn frontend_button(&self, command: FrontendCommand) -> Option<&FrontendButton> {
        self.frontend.get(&command)
    }

    /// Bind an emulator command, replacing any previous binding.
    pub fn set_emulator_button(&mut self, command: EmulatorCommand, button: EmulatorButton) {
        self.emulator.insert(command, button);
    }

    /// Bind a frontend command, replacing any previous binding.
    pub fn set_frontend_button(&mut self, command: FrontendCommand, button: FrontendButton) {
        self.frontend.insert(command, button);
    }
}

impl FromDocument for Mapping {
    fn from_document(document: &Value) -> Result<Self, DocumentError> {
        from_serde(document)
    }
}
