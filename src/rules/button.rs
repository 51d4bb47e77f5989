//! Manual override button

use super::handler::{MessageHandler, RuleContext, RuleOutcome};
use super::payloads::{decode_object, ButtonEvent, LampState};
use crate::error::BridgeError;
use tracing::{debug, info};

/// `on` switches the lamp on and suppresses motion, `off` switches it off and
/// hands control back to the motion rule.
///
/// The command is published before the flag is written. A motion event handled
/// in between would still see the previous flag value.
pub struct ShinyButtonRule;

impl MessageHandler for ShinyButtonRule {
    fn name(&self) -> &'static str {
        "shiny_button"
    }

    fn handle(&self, payload: &[u8], ctx: &RuleContext<'_>) -> Result<RuleOutcome, BridgeError> {
        let event: ButtonEvent = decode_object(payload)?;

        let (state, override_active) = match event.action.as_deref() {
            Some("on") => (LampState::On, true),
            Some("off") => (LampState::Off, false),
            other => {
                debug!(action = ?other, "Unhandled button action");
                return Ok(RuleOutcome::Skipped);
            }
        };

        let outcome = ctx.send_lamp(state)?;
        ctx.override_state.set(override_active);
        info!(
            override_active,
            "Sent {} command to {} via shiny button", state, ctx.lamp_topic
        );
        Ok(outcome)
    }
}
