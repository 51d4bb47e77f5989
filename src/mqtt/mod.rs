//! # MQTT Session
//!
//! Owns the broker connection and feeds inbound messages, one at a time, into
//! the [`crate::dispatch::Dispatcher`].
//!
//! ```text
//! mqtt/
//! ├── message.rs    - Inbound message with arrival timestamp
//! ├── publisher.rs  - Publish seam the rules talk to
//! └── session.rs    - Connection lifecycle and poll loop
//! ```
//!
//! Reconnects are left to rumqttc: polling the event loop again after an error
//! re-establishes the connection, and every ConnAck triggers a fresh set of
//! subscriptions.

pub mod message;
pub mod publisher;
pub mod session;
