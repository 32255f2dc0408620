use std::{
    fmt,
    hash::{Hash, Hasher},
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::document::{from_serde, DocumentError, FromDocument};

/// Family of an input device. Serialized as `0` for joysticks and `1` for
/// keyboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// Game controller.
    Joystick,
    /// Keyboard.
    Keyboard,
}

impl DeviceType {
    fn code(self) -> u8 {
        match self {
            Self::Joystick => 0,
            Self::Keyboard => 1,
        }
    }

    /// Position in player assignment; keyboards come first.
    pub(crate) fn rank(self) -> u8 {
        match self {
            Self::Keyboard => 0,
            Self::Joystick => 1,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Joystick => f.write_str("Joystick"),
            Self::Keyboard => f.write_str("Keyboard"),
        }
    }
}

impl Serialize for DeviceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for DeviceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(Self::Joystick),
            1 => Ok(Self::Keyboard),
            other => Err(de::Error::invalid_value(
                de::Unexpected::Unsigned(other.into()),
                &"0 (joystick) or 1 (keyboard)",
            )),
        }
    }
}

/// Hardware description of an input device.
///
/// Two identifications are equal when vendor and product match; the type
/// and the reported name are descriptive only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    /// Device family.
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    /// Name reported by the driver.
    pub name: String,
    /// USB vendor id.
    pub vendor_id: u32,
    /// USB product id.
    pub product_id: u32,
}

impl Identification {
    /// The built-in keyboard every system has.
    pub fn standard_keyboard() -> Self {
        Self {
            device_type: DeviceType::Keyboard,
            name: "Standard Keyboard".to_string(),
            vendor_id: 0,
            product_id: 0,
        }
    }

    /// A joystick as reported by the driver.
    pub fn joystick(name: impl Into<String>, vendor_id: u32, product_id: u32) -> Self {
        Self {
            device_type: DeviceType::Joystick,
            name: name.into(),
            vendor_id,
            product_id,
        }
    }
}

impl PartialEq for Identification {
    fn eq(&self, other: &Self) -> bool {
        self.vendor_id == other.vendor_id && self.product_id == other.product_id
    }
}

impl Eq for Identification {}

impl Hash for Identification {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vendor_id.hash(state);
        self.product_id.hash(state);
    }
}

impl fmt::Display for Identification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}. Vendor ID: {}, Product ID: {}",
            self.device_type, self.name, self.vendor_id, self.product_id
        )
    }
}

impl FromDocument for Identification {
    fn from_document(document: &Value) -> Result<Self, DocumentError> {
        from_serde(document)
    }
}
