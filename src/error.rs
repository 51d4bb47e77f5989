//! Error taxonomy for the bridge
//!
//! Everything a handler can fail with ends up in [`BridgeError`]. The dispatcher
//! logs and discards these per message; only startup errors (configuration and
//! the first broker connection) travel further up into `main`.

use thiserror::Error;

/// Errors raised by configuration, rule handlers and the MQTT session
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Payload was not valid JSON, or not the shape the handler expects
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The transport refused an outbound publish
    #[error("Publish failed: {0}")]
    Publish(String),

    /// Broker connection could not be established
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Configuration is present but unusable
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl From<rumqttc::ClientError> for BridgeError {
    fn from(e: rumqttc::ClientError) -> Self {
        BridgeError::Publish(e.to_string())
    }
}
