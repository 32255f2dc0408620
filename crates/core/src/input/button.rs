use std::fmt;

use serde::{Deserialize, Serialize};

use super::{InputEvent, JoystickAxis, Key};

/// Kind of input as named on the emulator command line.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonType {
    JoystickDigital,
    JoystickButton,
    Keyboard,
}

impl ButtonType {
    /// Emulator tag for this kind of input.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JoystickDigital => "joystick_digital",
            Self::JoystickButton => "joystick_button",
            Self::Keyboard => "keyboard",
        }
    }
}

impl fmt::Display for ButtonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A button as the emulator understands it: a kind and a free form
/// definition such as `"1,0,left"` or `"esc"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmulatorButton {
    /// Kind of input.
    #[serde(rename = "type")]
    pub kind: ButtonType,
    /// Which input of that kind.
    pub definition: String,
}

impl EmulatorButton {
    /// Build a button.
    pub fn new(kind: ButtonType, definition: impl Into<String>) -> Self {
        Self {
            kind,
            definition: definition.into(),
        }
    }
}

/// Axis position that counts as a press.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisPosition {
    /// Watched axis.
    pub axis: JoystickAxis,
    /// Exact position reported when the axis is fully pushed.
    pub range: f32,
}

/// A button as the frontend menus understand it.
///
/// Serialized as a single-field object: `{"axis": {...}}`,
/// `{"joystickButton": 9}` or `{"keyboardButton": "Up"}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrontendButton {
    /// Joystick axis pushed to a position.
    Axis(AxisPosition),
    /// Joystick button index.
    JoystickButton(u32),
    /// Keyboard key.
    KeyboardButton(Key),
}

impl FrontendButton {
    /// Whether `event` presses this button. Joystick slots are not checked.
    pub fn is_pressed(&self, event: &InputEvent) -> bool {
        match (self, event) {
            (Self::KeyboardButton(key), InputEvent::KeyPressed(pressed)) => key == pressed,
            (Self::JoystickButton(button), InputEvent::JoystickButtonPressed { button: pressed, .. }) => {
                button == pressed
            }
            (
                Self::Axis(AxisPosition { axis, range }),
                InputEvent::JoystickMoved {
                    axis: moved, position, ..
                },
            ) => axis == moved && range == position,
            _ => false,
        }
    }
}
