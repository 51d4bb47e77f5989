//! Reactive rules for the living room
//!
//! ```text
//! TopicRouter ──► MotionSensorRule ──┐
//!             ├─► ShinyButtonRule ───┼─► Publisher (lamp topic)
//!             ├─► DeviceInfoRule     │
//!             └─► MotionLogRule      │
//!                                    │
//!          OverrideState ◄── written by button, read by motion
//! ```
//!
//! The rule set is fixed; topics come from [`crate::config::TopicConfig`].

pub mod button;
pub mod devices;
pub mod handler;
pub mod motion;
pub mod override_state;
pub mod payloads;
pub mod router;

pub use handler::{MessageHandler, RuleContext, RuleOutcome};
pub use override_state::OverrideState;
pub use router::TopicRouter;
