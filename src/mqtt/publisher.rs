//! Outbound side of the session

use crate::error::BridgeError;
use rumqttc::{AsyncClient, QoS};

/// Fire-and-forget publish seam used by the rules
///
/// Implementations must not wait for a broker acknowledgement; an `Err` means
/// the transport refused to queue the message.
pub trait Publisher: Send + Sync {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BridgeError>;
}

impl Publisher for AsyncClient {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BridgeError> {
        self.try_publish(topic, QoS::AtMostOnce, false, payload)?;
        Ok(())
    }
}
