//! Motion-triggered lighting

use super::handler::{MessageHandler, RuleContext, RuleOutcome};
use super::payloads::{decode_object, LampState, OccupancyEvent};
use crate::error::BridgeError;
use tracing::{debug, info};

/// Switches the lamp to follow occupancy unless the manual override is set
///
/// Override wins unconditionally. A reading without `occupancy` sends nothing.
pub struct MotionSensorRule;

impl MessageHandler for MotionSensorRule {
    fn name(&self) -> &'static str {
        "motion_sensor"
    }

    fn handle(&self, payload: &[u8], ctx: &RuleContext<'_>) -> Result<RuleOutcome, BridgeError> {
        let event: OccupancyEvent = decode_object(payload)?;

        if ctx.override_state.is_active() {
            info!(occupancy = ?event.occupancy, "Motion ignored, manual override active");
            return Ok(RuleOutcome::Ignored);
        }

        match event.occupancy {
            Some(occupied) => {
                let state = LampState::from(occupied);
                let outcome = ctx.send_lamp(state)?;
                info!("Sent {} command to {}", state, ctx.lamp_topic);
                Ok(outcome)
            }
            None => {
                debug!("Motion reading without occupancy, nothing to do");
                Ok(RuleOutcome::Skipped)
            }
        }
    }
}

/// Logs readings from the test sensor and never acts on them
pub struct MotionLogRule;

impl MessageHandler for MotionLogRule {
    fn name(&self) -> &'static str {
        "motion_sensor_test"
    }

    fn handle(&self, payload: &[u8], _ctx: &RuleContext<'_>) -> Result<RuleOutcome, BridgeError> {
        let event: OccupancyEvent = decode_object(payload)?;
        info!(occupancy = ?event.occupancy, "Test motion sensor reading");
        Ok(RuleOutcome::Observed)
    }
}
