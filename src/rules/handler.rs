//! Handler trait and the context every rule runs with

use super::override_state::OverrideState;
use super::payloads::{LampCommand, LampState};
use crate::error::BridgeError;
use crate::mqtt::publisher::Publisher;
use std::fmt;

/// What a handler did with a message, for the dispatcher's decision log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// A lamp command went out
    Published(LampState),
    /// Manual override suppressed the rule
    Ignored,
    /// Payload carried nothing to act on
    Skipped,
    /// Log-only handler, never acts
    Observed,
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOutcome::Published(state) => write!(f, "published {}", state),
            RuleOutcome::Ignored => write!(f, "ignored (override active)"),
            RuleOutcome::Skipped => write!(f, "skipped"),
            RuleOutcome::Observed => write!(f, "observed"),
        }
    }
}

/// Borrowed collaborators for one handler invocation
pub struct RuleContext<'a> {
    pub publisher: &'a dyn Publisher,
    pub override_state: &'a OverrideState,
    pub lamp_topic: &'a str,
}

impl RuleContext<'_> {
    /// Encodes and publishes a lamp command to the lamp topic
    pub fn send_lamp(&self, state: LampState) -> Result<RuleOutcome, BridgeError> {
        let payload = LampCommand::new(state).to_payload()?;
        self.publisher.publish(self.lamp_topic, payload)?;
        Ok(RuleOutcome::Published(state))
    }
}

/// A rule bound to one topic in the router table
///
/// Handlers run to completion on the dispatching task. They decode the raw
/// payload themselves and return any failure instead of logging it, except
/// where a handler documents its own error path.
pub trait MessageHandler: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn handle(&self, payload: &[u8], ctx: &RuleContext<'_>) -> Result<RuleOutcome, BridgeError>;
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    pub const LAMP_TOPIC: &str = "zigbee2mqtt/lamp_livingroom/set";

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Published {
        pub topic: String,
        pub payload: String,
        /// Override flag as seen at the moment of the publish call
        pub override_at_publish: Option<bool>,
    }

    /// Publisher double recording every call
    #[derive(Default)]
    pub struct RecordingPublisher {
        calls: Mutex<Vec<Published>>,
        observed: Option<OverrideState>,
    }

    impl RecordingPublisher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Also snapshot `state` on every publish
        pub fn observing(state: &OverrideState) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                observed: Some(state.clone()),
            }
        }

        pub fn calls(&self) -> Vec<Published> {
            self.calls.lock().unwrap().clone()
        }

        pub fn payloads(&self) -> Vec<String> {
            self.calls().into_iter().map(|c| c.payload).collect()
        }
    }

    impl Publisher for RecordingPublisher {
        fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BridgeError> {
            self.calls.lock().unwrap().push(Published {
                topic: topic.to_string(),
                payload: String::from_utf8(payload).unwrap(),
                override_at_publish: self.observed.as_ref().map(|s| s.is_active()),
            });
            Ok(())
        }
    }

    /// Publisher double whose transport always rejects
    pub struct FailingPublisher;

    impl Publisher for FailingPublisher {
        fn publish(&self, _topic: &str, _payload: Vec<u8>) -> Result<(), BridgeError> {
            Err(BridgeError::Publish("request queue full".to_string()))
        }
    }

    pub fn context<'a>(
        publisher: &'a dyn Publisher,
        override_state: &'a OverrideState,
    ) -> RuleContext<'a> {
        RuleContext {
            publisher,
            override_state,
            lamp_topic: LAMP_TOPIC,
        }
    }
}
