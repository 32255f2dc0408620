use serde::{Deserialize, Serialize};

use super::Identification;

/// Keyboard keys the frontend can bind.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    Escape,
    Enter,
    Space,
    Backspace,
    Tab,
    Left,
    Right,
    Up,
    Down,
}

/// Joystick axes, including the point of view hat.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoystickAxis {
    X,
    Y,
    Z,
    R,
    U,
    V,
    PovX,
    PovY,
}

/// Event delivered by the windowing layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The window was asked to close.
    Closed,
    /// A key went down.
    KeyPressed(Key),
    /// A joystick button went down.
    JoystickButtonPressed {
        /// Joystick slot.
        joystick_id: u32,
        /// Button index.
        button: u32,
    },
    /// A joystick axis changed position.
    JoystickMoved {
        /// Joystick slot.
        joystick_id: u32,
        /// Moved axis.
        axis: JoystickAxis,
        /// New position in `-100.0..=100.0`.
        position: f32,
    },
    /// A joystick was plugged into a slot.
    JoystickConnected {
        /// Joystick slot.
        joystick_id: u32,
        /// Hardware description reported by the driver.
        identification: Identification,
    },
    /// The joystick in a slot went away.
    JoystickDisconnected {
        /// Joystick slot.
        joystick_id: u32,
    },
}

impl InputEvent {
    /// Joystick slot the event originates from, if any.
    pub fn joystick_id(&self) -> Option<u32> {
        match self {
            Self::JoystickButtonPressed { joystick_id, .. }
            | Self::JoystickMoved { joystick_id, .. }
            | Self::JoystickConnected { joystick_id, .. }
            | Self::JoystickDisconnected { joystick_id } => Some(*joystick_id),
            Self::Closed | Self::KeyPressed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_joystick_events_carry_a_slot() {
        assert_eq!(InputEvent::KeyPressed(Key::Up).joystick_id(), None);
        assert_eq!(InputEvent::Closed.joystick_id(), None);
        assert_eq!(
            InputEvent::JoystickMoved {
                joystick_id: 2,
                axis: JoystickAxis::PovY,
                position: 100.0
            }
            .joystick_id(),
            Some(2)
        );
        assert_eq!(
            InputEvent::JoystickDisconnected { joystick_id: 3 }.joystick_id(),
            Some(3)
        );
    }
}
