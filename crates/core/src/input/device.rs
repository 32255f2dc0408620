use std::cmp::Ordering;

use tracing::warn;

use super::{
    EmulatorButton, EmulatorCommand, FrontendButton, FrontendCommand, Identification,
    InputError, InputEvent, Mapping, DEFAULT_KEYBOARD,
};

/// One physical or virtual input device plugged into a slot.
///
/// Devices are equal when type and slot match, and order keyboards first,
/// then by slot. This ordering decides which device drives which player.
#[derive(Debug, Clone)]
pub struct Device {
    id: u32,
    identification: Identification,
    mapping: Mapping,
}

impl Device {
    /// A device using the built-in mapping of its type.
    pub fn new(identification: Identification, id: u32) -> Self {
        let mapping = Mapping::default_for(identification.device_type).clone();
        Self::with_mapping(identification, id, mapping)
    }

    /// A device with its own mapping.
    pub fn with_mapping(identification: Identification, id: u32, mapping: Mapping) -> Self {
        Self {
            id,
            identification,
            mapping,
        }
    }

    /// Slot index.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Hardware description.
    pub fn identification(&self) -> &Identification {
        &self.identification
    }

    /// Current mapping.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Emulator argument driving `command` from this device, e.g.
    /// `keyboard[0,esc]` or `joystick_digital[1,1,1,up]`.
    ///
    /// Looks the command up in the device mapping, then in the default
    /// mapping of the device type, then in the keyboard defaults.
    pub fn emulator_input_string(&self, command: EmulatorCommand) -> Result<String, InputError> {
        let button = self
            .emulator_button(command)
            .ok_or(InputError::NoInputAvailable(command))?;
        Ok(format!("{}[{},{}]", button.kind, self.id, button.definition))
    }

    fn emulator_button(&self, command: EmulatorCommand) -> Option<&EmulatorButton> {
        self.resolve(
            command,
            Mapping::default_for(self.identification.device_type),
            &DEFAULT_KEYBOARD,
        )
    }

    fn resolve<'a>(
        &'a self,
        command: EmulatorCommand,
        type_default: &'a Mapping,
        global_default: &'a Mapping,
    ) -> Option<&'a EmulatorButton> {
        [&self.mapping, type_default, global_default]
            .into_iter()
            .find_map(|mapping| mapping.emulator_button(command))
    }

    fn frontend_button(&self, command: FrontendCommand) -> Option<&FrontendButton> {
        self.mapping.frontend_button(command)
    }

    /// Whether `event`, coming from this device, triggers `command`.
    ///
    /// Keyboard events are attributed to every device; joystick events only
    /// to the device in the same slot.
    pub fn check_event(&self, command: FrontendCommand, event: &InputEvent) -> bool {
        let Some(button) = self.frontend_button(command) else {
            warn!(
                "No button associated to frontend command {command:?} for {}",
                self.identification
            );
            return false;
        };

        match event {
            InputEvent::KeyPressed(_) => button.is_pressed(event),
            _ => event.joystick_id() == Some(self.id) && button.is_pressed(event),
        }
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.identification.device_type == other.identification.device_type && self.id == other.id
    }
}

impl Eq for Device {}

impl PartialOrd for Device {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Device {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identification
            .device_type
            .rank()
            .cmp(&other.identification.device_type.rank())
            .then(self.id.cmp(&other.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ButtonType, JoystickAxis, Key, DEFAULT_JOYSTICK};
    use std::collections::BTreeMap;

    fn pad() -> Identification {
        Identification::joystick("Xbox 360 Controller", 1118, 654)
    }

    fn mapping_with(command: EmulatorCommand, button: EmulatorButton) -> Mapping {
        let mut mapping = Mapping::default();
        mapping.set_emulator_button(command, button);
        mapping
    }

    #[test]
    fn input_strings_use_the_device_slot() {
        let keyboard = Device::new(Identification::standard_keyboard(), 0);
        assert_eq!(
            keyboard.emulator_input_string(EmulatorCommand::UiCancel).unwrap(),
            "keyboard[0,esc]"
        );

        let joystick = Device::new(pad(), 2);
        assert_eq!(
            joystick.emulator_input_string(EmulatorCommand::P1Up).unwrap(),
            "joystick_digital[2,1,1,up]"
        );
        assert_eq!(
            joystick.emulator_input_string(EmulatorCommand::Start1).unwrap(),
            "joystick_button[2,start]"
        );
    }

    #[test]
    fn own_mapping_wins() {
        let device = Device::with_mapping(
            pad(),
            1,
            mapping_with(
                EmulatorCommand::P1Button1,
                EmulatorButton::new(ButtonType::JoystickButton, "trigger"),
            ),
        );
        assert_eq!(
            device.emulator_input_string(EmulatorCommand::P1Button1).unwrap(),
            "joystick_button[1,trigger]"
        );
    }

    #[test]
    fn fallback_chain() {
        let device = Device::with_mapping(pad(), 1, Mapping::default());
        let type_default = mapping_with(
            EmulatorCommand::Coin1,
            EmulatorButton::new(ButtonType::JoystickButton, "select"),
        );
        let global_default = mapping_with(
            EmulatorCommand::UiPause,
            EmulatorButton::new(ButtonType::Keyboard, "9"),
        );

        assert_eq!(
            device.resolve(EmulatorCommand::Coin1, &type_default, &global_default),
            Some(&EmulatorButton::new(ButtonType::JoystickButton, "select"))
        );
        assert_eq!(
            device.resolve(EmulatorCommand::UiPause, &type_default, &global_default),
            Some(&EmulatorButton::new(ButtonType::Keyboard, "9"))
        );
        assert_eq!(
            device.resolve(EmulatorCommand::P2Up, &type_default, &global_default),
            None
        );

        // With the built-in tables, an empty mapping resolves through the type default.
        assert_eq!(
            device.emulator_button(EmulatorCommand::P1Left),
            DEFAULT_JOYSTICK.emulator_button(EmulatorCommand::P1Left)
        );
    }

    #[test]
    fn failed_resolution_is_an_error() {
        let device = Device::with_mapping(pad(), 1, Mapping::default());
        let empty = Mapping::default();
        assert!(device
            .resolve(EmulatorCommand::Start3, &empty, &empty)
            .is_none());
        assert_eq!(
            InputError::NoInputAvailable(EmulatorCommand::Start3).to_string(),
            "no emulator button associated to command start3"
        );
    }

    #[test]
    fn keyboards_sort_before_joysticks() {
        let mut devices = vec![
            Device::new(pad(), 1),
            Device::new(Identification::standard_keyboard(), 0),
            Device::new(pad(), 0),
        ];
        devices.sort();

        let order: Vec<_> = devices
            .iter()
            .map(|device| (device.identification().device_type, device.id()))
            .collect();
        assert_eq!(
            order,
            vec![
                (crate::input::DeviceType::Keyboard, 0),
                (crate::input::DeviceType::Joystick, 0),
                (crate::input::DeviceType::Joystick, 1),
            ]
        );
    }

    #[test]
    fn equality_is_type_and_slot() {
        let first = Device::new(pad(), 0);
        let other_model = Device::new(Identification::joystick("Arcade Stick", 3853, 193), 0);
        let other_slot = Device::new(pad(), 1);

        assert_eq!(first, other_model);
        assert_ne!(first, other_slot);
        assert_ne!(first, Device::new(Identification::standard_keyboard(), 0));
    }

    #[test]
    fn joystick_events_are_filtered_by_slot() {
        let joystick = Device::new(pad(), 1);
        let press = |joystick_id| InputEvent::JoystickButtonPressed {
            joystick_id,
            button: 9,
        };

        assert!(joystick.check_event(FrontendCommand::Enter, &press(1)));
        assert!(!joystick.check_event(FrontendCommand::Enter, &press(0)));
        assert!(joystick.check_event(
            FrontendCommand::Down,
            &InputEvent::JoystickMoved {
                joystick_id: 1,
                axis: JoystickAxis::PovY,
                position: 100.0,
            }
        ));
        assert!(!joystick.check_event(FrontendCommand::Up, &InputEvent::KeyPressed(Key::Up)));
        assert!(!joystick.check_event(
            FrontendCommand::Enter,
            &InputEvent::JoystickConnected {
                joystick_id: 1,
                identification: pad(),
            }
        ));
    }

    #[test]
    fn keyboard_events_reach_the_keyboard() {
        let keyboard = Device::new(Identification::standard_keyboard(), 0);
        assert!(keyboard.check_event(FrontendCommand::Up, &InputEvent::KeyPressed(Key::Up)));
        assert!(keyboard.check_event(FrontendCommand::Esc, &InputEvent::KeyPressed(Key::Escape)));
        assert!(!keyboard.check_event(FrontendCommand::Down, &InputEvent::KeyPressed(Key::Up)));
        assert!(!keyboard.check_event(FrontendCommand::Esc, &InputEvent::Closed));
    }

    #[test]
    fn missing_frontend_binding_never_matches() {
        let device = Device::with_mapping(
            Identification::standard_keyboard(),
            0,
            Mapping::new(BTreeMap::new(), BTreeMap::new()),
        );
        assert!(!device.check_event(FrontendCommand::Up, &InputEvent::KeyPressed(Key::Up)));
    }
}
