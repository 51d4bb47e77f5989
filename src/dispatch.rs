//! Dispatch boundary
//!
//! Every inbound message is written to the activity log first, then routed.
//! Handler errors stop here: they are logged once and the session moves on to
//! the next message.

use crate::mqtt::message::BusMessage;
use crate::mqtt::publisher::Publisher;
use crate::rules::{OverrideState, RuleContext, RuleOutcome, TopicRouter};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Target of the per-message activity records
pub const ACTIVITY_TARGET: &str = "activity";

pub struct Dispatcher {
    router: TopicRouter,
    publisher: Arc<dyn Publisher>,
    override_state: OverrideState,
    lamp_topic: String,
}

impl Dispatcher {
    pub fn new(
        router: TopicRouter,
        publisher: Arc<dyn Publisher>,
        override_state: OverrideState,
        lamp_topic: impl Into<String>,
    ) -> Self {
        Self {
            router,
            publisher,
            override_state,
            lamp_topic: lamp_topic.into(),
        }
    }

    #[cfg(test)]
    pub fn override_state(&self) -> &OverrideState {
        &self.override_state
    }

    /// Logs, routes and runs the matching rule
    ///
    /// Returns the rule's outcome, or `None` when no rule matched or the rule
    /// failed. Never panics on bad input.
    pub fn dispatch(&self, msg: &BusMessage) -> Option<RuleOutcome> {
        info!(
            target: ACTIVITY_TARGET,
            timestamp = %msg.timestamp.format("%Y-%m-%d %H:%M:%S"),
            topic = %msg.topic,
            payload = %msg.payload_text(),
            "message received"
        );

        let Some(handler) = self.router.route(&msg.topic) else {
            debug!("No rule for {}", msg.topic);
            return None;
        };

        let ctx = RuleContext {
            publisher: self.publisher.as_ref(),
            override_state: &self.override_state,
            lamp_topic: &self.lamp_topic,
        };

        match handler.handle(&msg.payload, &ctx) {
            Ok(outcome) => {
                debug!(rule = handler.name(), "{} -> {}", msg.topic, outcome);
                Some(outcome)
            }
            Err(e) => {
                error!(rule = handler.name(), topic = %msg.topic, "Rule failed: {}", e);
                None
            }
        }
    }
}
