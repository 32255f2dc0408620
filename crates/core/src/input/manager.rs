use std::sync::Arc;

use tracing::{info, trace};

use super::{
    Device, EmulatorCommand, FrontendCommand, Identification, InputDatabase, InputError,
    InputEvent, Mapping,
};

/// Maximum number of players the emulator accepts.
pub const MAX_PLAYERS: usize = 4;

/// Device specific mappings keyed by hardware identification.
pub trait MappingLookup: Send + Sync {
    /// Dedicated mapping for `identification`, if one is known.
    fn mapping(&self, identification: &Identification) -> Option<Mapping>;
}

impl MappingLookup for InputDatabase {
    fn mapping(&self, identification: &Identification) -> Option<Mapping> {
        self.find(identification).ok().flatten()
    }
}

/// Menu action produced by input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontendAction {
    /// Leave the frontend.
    Close,
    /// Move the selection up.
    Up,
    /// Move the selection down.
    Down,
    /// Launch the selection.
    Select,
}

type Callback = Box<dyn FnMut() + Send>;

/// Tracks connected devices, turns raw events into menu actions and builds
/// the emulator control string.
pub struct Manager {
    lookup: Arc<dyn MappingLookup>,
    devices: Vec<Device>,
    callbacks: Vec<(FrontendAction, Callback)>,
    max_players: usize,
}

impl Manager {
    /// Start with the standard keyboard in slot 0.
    pub fn new(lookup: Arc<dyn MappingLookup>) -> Self {
        let mut manager = Self {
            lookup,
            devices: Vec::new(),
            callbacks: Vec::new(),
            max_players: MAX_PLAYERS,
        };
        manager.add_device(Device::new(Identification::standard_keyboard(), 0));
        manager
    }

    /// Limit the number of players, clamped to `1..=MAX_PLAYERS`.
    pub fn with_max_players(mut self, max_players: usize) -> Self {
        self.max_players = max_players.clamp(1, MAX_PLAYERS);
        self
    }

    /// Connected devices, in player order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Register `callback` for `action`.
    pub fn on(&mut self, action: FrontendAction, callback: impl FnMut() + Send + 'static) {
        self.callbacks.push((action, Box::new(callback)));
    }

    /// Register a joystick plugged into `joystick_id`, replacing whatever
    /// occupied that slot.
    pub fn connect(&mut self, joystick_id: u32, identification: Identification) {
        info!("Querying input database for: {identification}");
        let device = match self.lookup.mapping(&identification) {
            Some(mapping) => {
                info!("Found predetermined mapping for: {identification}");
                Device::with_mapping(identification, joystick_id, mapping)
            }
            None => Device::new(identification, joystick_id),
        };
        self.remove_device(&device);
        self.add_device(device);
    }

    /// Forget the joystick in `joystick_id`.
    pub fn disconnect(&mut self, joystick_id: u32) {
        let device = Device::new(Identification::joystick("", 0, 0), joystick_id);
        self.remove_device(&device);
    }

    /// Process one event: update the device list and fire callbacks.
    ///
    /// Returns the actions the event triggered.
    pub fn handle(&mut self, event: &InputEvent) -> Vec<FrontendAction> {
        let mut actions = Vec::new();
        if matches!(event, InputEvent::Closed) {
            actions.push(FrontendAction::Close);
        }
        for (command, action) in [
            (FrontendCommand::Esc, FrontendAction::Close),
            (FrontendCommand::Up, FrontendAction::Up),
            (FrontendCommand::Down, FrontendAction::Down),
            (FrontendCommand::Enter, FrontendAction::Select),
        ] {
            if self
                .devices
                .iter()
                .any(|device| device.check_event(command, event))
            {
                actions.push(action);
            }
        }

        for action in &actions {
            for (registered, callback) in &mut self.callbacks {
                if *registered == *action {
                    callback();
                }
            }
        }

        match event {
            InputEvent::JoystickConnected {
                joystick_id,
                identification,
            } => self.connect(*joystick_id, identification.clone()),
            InputEvent::JoystickDisconnected { joystick_id } => self.disconnect(*joystick_id),
            _ => {}
        }

        actions
    }

    /// Process a batch of events in order.
    pub fn manage(&mut self, events: impl IntoIterator<Item = InputEvent>) -> Vec<FrontendAction> {
        events
            .into_iter()
            .flat_map(|event| self.handle(&event))
            .collect()
    }

    /// Number of players the connected devices can serve.
    pub fn player_count(&self) -> usize {
        self.devices.len().min(self.max_players)
    }

    /// Device driving `player`, counted from one.
    pub fn device_for_player(&self, player: u8) -> Option<&Device> {
        usize::from(player)
            .checked_sub(1)
            .and_then(|index| self.devices.get(index))
    }

    /// Emulator arguments binding every command of every active player,
    /// such as `-input_map[p1_up] keyboard[0,w] -input_map[p1_down] ...`.
    pub fn control_string(&self) -> Result<String, InputError> {
        let players = self.player_count();
        let mut parts = Vec::new();
        for command in EmulatorCommand::ALL.iter().copied() {
            let player = command
                .player_number()
                .ok_or(InputError::UnsupportedCommand(command))?;
            if usize::from(player) > players {
                continue;
            }
            if let Some(device) = self.device_for_player(player) {
                parts.push(format!(
                    "-input_map[{command}] {}",
                    device.emulator_input_string(command)?
                ));
            }
        }
        Ok(parts.join(" "))
    }

    fn add_device(&mut self, device: Device) {
        trace!(
            "New input device discovered: {} {} ({})",
            device.identification().device_type,
            device.id(),
            device.identification().name
        );
        self.devices.push(device);
        self.devices.sort();
    }

    fn remove_device(&mut self, device: &Device) {
        self.devices.retain(|existing| {
            let removed = existing == device;
            if removed {
                trace!(
                    "Input device disconnected: {} {} ({})",
                    existing.identification().device_type,
                    existing.id(),
                    existing.identification().name
                );
            }
            !removed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ButtonType, DeviceType, EmulatorButton, JoystickAxis, Key};
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };

    struct Lookup(HashMap<Identification, Mapping>);

    impl MappingLookup for Lookup {
        fn mapping(&self, identification: &Identification) -> Option<Mapping> {
            self.0.get(identification).cloned()
        }
    }

    fn arcade_stick() -> Identification {
        Identification::joystick("Arcade Stick", 3853, 193)
    }

    fn manager() -> Manager {
        let mut custom = Mapping::default();
        custom.set_emulator_button(
            EmulatorCommand::P1Button1,
            EmulatorButton::new(ButtonType::JoystickButton, "trigger"),
        );
        Manager::new(Arc::new(Lookup(HashMap::from([(arcade_stick(), custom)]))))
    }

    fn kinds(manager: &Manager) -> Vec<(DeviceType, u32)> {
        manager
            .devices()
            .iter()
            .map(|device| (device.identification().device_type, device.id()))
            .collect()
    }

    #[test]
    fn starts_with_the_keyboard() {
        let manager = manager();
        assert_eq!(kinds(&manager), vec![(DeviceType::Keyboard, 0)]);
        assert_eq!(manager.player_count(), 1);
    }

    #[test]
    fn connect_and_disconnect_keep_player_order() {
        let mut manager = manager();
        manager.handle(&InputEvent::JoystickConnected {
            joystick_id: 1,
            identification: Identification::joystick("Xbox 360 Controller", 1118, 654),
        });
        manager.handle(&InputEvent::JoystickConnected {
            joystick_id: 0,
            identification: arcade_stick(),
        });
        assert_eq!(
            kinds(&manager),
            vec![
                (DeviceType::Keyboard, 0),
                (DeviceType::Joystick, 0),
                (DeviceType::Joystick, 1)
            ]
        );

        // Known hardware gets its dedicated mapping.
        let stick = manager.device_for_player(2).unwrap();
        assert_eq!(
            stick.emulator_input_string(EmulatorCommand::P1Button1).unwrap(),
            "joystick_button[0,trigger]"
        );

        manager.handle(&InputEvent::JoystickDisconnected { joystick_id: 0 });
        assert_eq!(
            kinds(&manager),
            vec![(DeviceType::Keyboard, 0), (DeviceType::Joystick, 1)]
        );
    }

    #[test]
    fn reconnecting_a_slot_does_not_duplicate_it() {
        let mut manager = manager();
        manager.connect(0, arcade_stick());
        manager.connect(0, Identification::joystick("Xbox 360 Controller", 1118, 654));
        assert_eq!(manager.devices().len(), 2);
        assert_eq!(
            manager.devices()[1].identification().name,
            "Xbox 360 Controller"
        );
    }

    #[test]
    fn events_fire_callbacks() {
        let mut manager = manager();
        manager.connect(0, Identification::joystick("Xbox 360 Controller", 1118, 654));

        let closes = Arc::new(AtomicUsize::new(0));
        let selects = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closes);
        manager.on(FrontendAction::Close, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&selects);
        manager.on(FrontendAction::Select, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let actions = manager.manage([
            InputEvent::Closed,
            InputEvent::KeyPressed(Key::Escape),
            InputEvent::KeyPressed(Key::Num1),
            InputEvent::JoystickButtonPressed {
                joystick_id: 0,
                button: 9,
            },
            InputEvent::JoystickMoved {
                joystick_id: 0,
                axis: JoystickAxis::PovY,
                position: -100.0,
            },
            InputEvent::KeyPressed(Key::Down),
            InputEvent::KeyPressed(Key::Z),
        ]);

        assert_eq!(
            actions,
            vec![
                FrontendAction::Close,
                FrontendAction::Close,
                FrontendAction::Select,
                FrontendAction::Select,
                FrontendAction::Up,
                FrontendAction::Down,
            ]
        );
        assert_eq!(closes.load(Ordering::SeqCst), 2);
        assert_eq!(selects.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn control_string_for_a_single_keyboard() {
        let control = manager().control_string().unwrap();
        assert!(control.starts_with("-input_map[p1_up] keyboard[0,w] -input_map[p1_down] keyboard[0,s]"));
        assert!(control.contains("-input_map[coin1] keyboard[0,3]"));
        assert!(control.ends_with("-input_map[ui_pause] keyboard[0,9] -input_map[ui_cancel] keyboard[0,esc]"));
        assert!(!control.contains("p2_"));
        assert!(!control.ends_with(' '));
    }

    #[test]
    fn control_string_assigns_players_in_device_order() {
        let mut manager = manager();
        manager.connect(1, Identification::joystick("Xbox 360 Controller", 1118, 654));
        manager.connect(0, arcade_stick());

        let control = manager.control_string().unwrap();
        assert!(control.contains("-input_map[p1_up] keyboard[0,w]"));
        assert!(control.contains("-input_map[p2_up] joystick_digital[0,1,1,up]"));
        assert!(control.contains("-input_map[start3] joystick_button[1,start]"));
        assert!(!control.contains("p4_"));
        assert_eq!(control.matches("-input_map[").count(), 12 * 3 + 2);
    }

    #[test]
    fn players_are_capped() {
        let mut manager = manager().with_max_players(2);
        for slot in 0..5 {
            manager.connect(slot, Identification::joystick("Pad", 1, slot));
        }
        assert_eq!(manager.devices().len(), 6);
        assert_eq!(manager.player_count(), 2);
        assert!(!manager.control_string().unwrap().contains("p3_"));

        let manager = manager.with_max_players(10);
        assert_eq!(manager.player_count(), MAX_PLAYERS);
    }
}
