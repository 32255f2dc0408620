use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::InputError;

macro_rules! emulator_commands {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Input slot understood by the emulator.
        #[allow(missing_docs)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum EmulatorCommand {
            $($variant,)+
        }

        impl EmulatorCommand {
            /// Every command, in declaration order.
            pub const ALL: &'static [EmulatorCommand] = &[$(EmulatorCommand::$variant,)+];

            /// Name used on the emulator command line and in mapping files.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(EmulatorCommand::$variant => $name,)+
                }
            }
        }

        impl FromStr for EmulatorCommand {
            type Err = InputError;

            fn from_str(name: &str) -> Result<Self, Self::Err> {
                match name {
                    $($name => Ok(EmulatorCommand::$variant),)+
                    _ => Err(InputError::UnknownCommand(name.to_string())),
                }
            }
        }
    };
}

emulator_commands! {
    P1Up => "p1_up",
    P1Down => "p1_down",
    P1Left => "p1_left",
    P1Right => "p1_right",
    P1Button1 => "p1_button1",
    P1Button2 => "p1_button2",
    P1Button3 => "p1_button3",
    P1Button4 => "p1_button4",
    P1Button5 => "p1_button5",
    P1Button6 => "p1_button6",
    P2Up => "p2_up",
    P2Down => "p2_down",
    P2Left => "p2_left",
    P2Right => "p2_right",
    P2Button1 => "p2_button1",
    P2Button2 => "p2_button2",
    P2Button3 => "p2_button3",
    P2Button4 => "p2_button4",
    P2Button5 => "p2_button5",
    P2Button6 => "p2_button6",
    P3Up => "p3_up",
    P3Down => "p3_down",
    P3Left => "p3_left",
    P3Right => "p3_right",
    P3Button1 => "p3_button1",
    P3Button2 => "p3_button2",
    P3Button3 => "p3_button3",
    P3Button4 => "p3_button4",
    P3Button5 => "p3_button5",
    P3Button6 => "p3_button6",
    P4Up => "p4_up",
    P4Down => "p4_down",
    P4Left => "p4_left",
    P4Right => "p4_right",
    P4Button1 => "p4_button1",
    P4Button2 => "p4_button2",
    P4Button3 => "p4_button3",
    P4Button4 => "p4_button4",
    P4Button5 => "p4_button5",
    P4Button6 => "p4_button6",
    Coin1 => "coin1",
    Coin2 => "coin2",
    Coin3 => "coin3",
    Coin4 => "coin4",
    Start1 => "start1",
    Start2 => "start2",
    Start3 => "start3",
    Start4 => "start4",
    UiPause => "ui_pause",
    UiCancel => "ui_cancel",
}

impl EmulatorCommand {
    /// Player owning this command; user interface commands belong to player one.
    pub fn player_number(self) -> Option<u8> {
        let name = self.as_str();
        if name.starts_with("ui_") {
            return Some(1);
        }
        (1..=4u8).find(|player| {
            name.starts_with(&format!("p{player}_"))
                || name == format!("coin{player}")
                || name == format!("start{player}")
        })
    }
}

impl fmt::Display for EmulatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EmulatorCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EmulatorCommand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

/// Navigation command understood by the frontend menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FrontendCommand {
    /// Previous entry.
    Up,
    /// Next entry.
    Down,
    /// Confirm the current entry.
    Enter,
    /// Leave the frontend.
    Esc,
}

impl FrontendCommand {
    /// Every command, in declaration order.
    pub const ALL: [FrontendCommand; 4] = [Self::Up, Self::Down, Self::Enter, Self::Esc];
}
