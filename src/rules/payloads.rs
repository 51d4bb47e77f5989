//! Wire payloads for the zigbee2mqtt topics the rules consume and produce

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Decodes a payload that must be a JSON object
///
/// Derived struct impls would also accept a JSON array and fill the fields
/// positionally, so the top-level shape is checked first.
pub fn decode_object<T: DeserializeOwned>(payload: &[u8]) -> Result<T, serde_json::Error> {
    match serde_json::from_slice::<Value>(payload)? {
        object @ Value::Object(_) => serde_json::from_value(object),
        _ => Err(serde_json::Error::custom("expected a JSON object")),
    }
}

/// Motion sensor reading
///
/// `occupancy` is tri-state: a message without the key (or with `null`) is a
/// valid reading that carries no presence information.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyEvent {
    #[serde(default)]
    pub occupancy: Option<bool>,
}

/// Button press; any action besides `on`/`off` is ignored by the rules
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonEvent {
    #[serde(default)]
    pub action: Option<String>,
}

/// One entry of the coordinator's device registry snapshot
///
/// Everything is optional so one partial entry cannot spoil the snapshot.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub ieee_address: Option<String>,
    #[serde(default)]
    pub definition: Option<DeviceDefinition>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeviceDefinition {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LampState {
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "OFF")]
    Off,
}

impl fmt::Display for LampState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LampState::On => write!(f, "ON"),
            LampState::Off => write!(f, "OFF"),
        }
    }
}

impl From<bool> for LampState {
    fn from(on: bool) -> Self {
        if on {
            LampState::On
        } else {
            LampState::Off
        }
    }
}

/// Outbound lamp command, always exactly `{"state": ...}`
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LampCommand {
    pub state: LampState,
}

impl LampCommand {
    pub fn new(state: LampState) -> Self {
        Self { state }
    }

    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
