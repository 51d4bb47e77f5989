//! Device registry snapshot printing

use super::handler::{MessageHandler, RuleContext, RuleOutcome};
use super::payloads::DeviceDescriptor;
use crate::error::BridgeError;
use std::fmt::Write;
use tracing::{error, info};

const HEADER: &str = "--- Zigbee Device Information ---";
const FOOTER: &str = "------------------------------------";

/// Logs a readable listing of the coordinator's device registry
///
/// Purely observational. Decode failures are reported here rather than at the
/// dispatch boundary, so this handler never returns an error.
pub struct DeviceInfoRule;

impl MessageHandler for DeviceInfoRule {
    fn name(&self) -> &'static str {
        "device_info"
    }

    fn handle(&self, payload: &[u8], _ctx: &RuleContext<'_>) -> Result<RuleOutcome, BridgeError> {
        let devices: Vec<DeviceDescriptor> = match serde_json::from_slice(payload) {
            Ok(devices) => devices,
            Err(e) => {
                error!("Could not decode device information JSON: {}", e);
                return Ok(RuleOutcome::Skipped);
            }
        };

        info!(devices = devices.len(), "\n{}", render_device_snapshot(&devices));
        Ok(RuleOutcome::Observed)
    }
}

/// Renders every device with a non-empty friendly name
pub fn render_device_snapshot(devices: &[DeviceDescriptor]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", HEADER);
    for device in devices {
        let name = match device.friendly_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => continue,
        };
        let _ = writeln!(out, "  - Friendly Name: {}", name);
        if let Some(address) = &device.ieee_address {
            let _ = writeln!(out, "    IEEE Address: {}", address);
        }
        if let Some(definition) = &device.definition {
            if let Some(model) = &definition.model {
                let _ = writeln!(out, "    Model: {}", model);
            }
            if let Some(vendor) = &definition.vendor {
                let _ = writeln!(out, "    Vendor: {}", vendor);
            }
        }
    }
    let _ = write!(out, "{}", FOOTER);
    out
}
