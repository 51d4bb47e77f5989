//! Exact-match topic table

use super::button::ShinyButtonRule;
use super::devices::DeviceInfoRule;
use super::handler::MessageHandler;
use super::motion::{MotionLogRule, MotionSensorRule};
use crate::config::TopicConfig;
use std::collections::HashMap;
use tracing::debug;

/// Maps a topic to at most one handler
///
/// Lookup is case-sensitive string equality. Wildcards in the table are plain
/// characters, not patterns.
#[derive(Default)]
pub struct TopicRouter {
    routes: HashMap<String, Box<dyn MessageHandler>>,
}

impl TopicRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the fixed rule table from the configured topics
    pub fn from_topics(topics: &TopicConfig) -> Self {
        let mut router = Self::new();
        router.register(&topics.motion_living_room, Box::new(MotionSensorRule));
        router.register(&topics.shiny_button, Box::new(ShinyButtonRule));
        router.register(&topics.device_info, Box::new(DeviceInfoRule));
        router.register(&topics.motion_test, Box::new(MotionLogRule));
        router
    }

    /// Binds `handler` to `topic`, replacing any previous binding
    pub fn register(&mut self, topic: &str, handler: Box<dyn MessageHandler>) {
        debug!("Routing {} -> {}", topic, handler.name());
        self.routes.insert(topic.to_string(), handler);
    }

    pub fn route(&self, topic: &str) -> Option<&dyn MessageHandler> {
        self.routes.get(topic).map(|h| h.as_ref())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_topics_reach_their_rules() {
        let topics = TopicConfig::default();
        let router = TopicRouter::from_topics(&topics);

        assert_eq!(router.len(), 4);
        assert_eq!(router.route(&topics.motion_living_room).unwrap().name(), "motion_sensor");
        assert_eq!(router.route(&topics.shiny_button).unwrap().name(), "shiny_button");
        assert_eq!(router.route(&topics.device_info).unwrap().name(), "device_info");
        assert_eq!(router.route(&topics.motion_test).unwrap().name(), "motion_sensor_test");
    }

    #[test]
    fn matching_is_exact() {
        let router = TopicRouter::from_topics(&TopicConfig::default());

        assert!(router.route("zigbee2mqtt/#").is_none());
        assert!(router.route("zigbee2mqtt/SHINY_4_BUTTON").is_none());
        assert!(router.route("zigbee2mqtt/shiny_4_button/set").is_none());
        assert!(router.route("zigbee2mqtt/lamp_livingroom/set").is_none());
    }
}
