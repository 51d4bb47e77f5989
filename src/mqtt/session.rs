//! Connection session with statum state machine
//!
//! ```text
//! Configured ──connect()──► Connected ──run()──► (cancelled)
//!     │
//!     └── first connection fails ──► BridgeError::Connection
//! ```
//!
//! Only the initial connection is allowed to fail the process. Once connected,
//! transport errors are logged and the event loop is polled again.

use super::message::BusMessage;
use crate::config::BrokerConfig;
use crate::dispatch::Dispatcher;
use crate::error::BridgeError;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use statum::{machine, state};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Pause after a transport error before polling again
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Counters kept for the lifetime of the session
#[derive(Clone, Debug, Default)]
pub struct SessionStatus {
    pub connection_state: ConnectionState,
    pub messages_received: usize,
    pub messages_sent: usize,
    pub error_count: usize,
    pub last_activity: Option<chrono::DateTime<chrono::Local>>,
}

impl SessionStatus {
    fn touch(&mut self) {
        self.last_activity = Some(chrono::Local::now());
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum SessionState {
    Configured, // Options built, nothing on the wire yet
    Connected,  // First ConnAck received
}

#[machine]
pub struct MqttSession<S: SessionState> {
    client: AsyncClient,
    eventloop: EventLoop,
    subscriptions: Vec<String>,
    status: SessionStatus,
}

impl<S: SessionState> MqttSession<S> {
    /// Handle for publishing; clones share the same request queue
    pub fn client(&self) -> AsyncClient {
        self.client.clone()
    }

    #[cfg(test)]
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }
}

/// Queues a subscription for every configured topic
///
/// Called on each ConnAck since the broker may have dropped our session.
fn subscribe_all(client: &AsyncClient, subscriptions: &[String], status: &mut SessionStatus) {
    for topic in subscriptions {
        match client.try_subscribe(topic.as_str(), QoS::AtMostOnce) {
            Ok(()) => info!("Subscribed to {}", topic),
            Err(e) => {
                status.error_count += 1;
                error!("Subscribing to {} failed: {}", topic, e);
            }
        }
    }
}

impl MqttSession<Configured> {
    pub fn create(broker: &BrokerConfig, subscriptions: Vec<String>) -> Self {
        let mut options = MqttOptions::new(broker.client_id.clone(), broker.host.clone(), broker.port);
        options.set_keep_alive(Duration::from_secs(broker.keep_alive_secs));
        if let (Some(user), Some(pw)) = (&broker.username, &broker.password) {
            options.set_credentials(user.clone(), pw.clone());
        }

        let (client, eventloop) = AsyncClient::new(options, broker.channel_capacity);
        info!(
            "MQTT session configured for {}:{} as {}",
            broker.host, broker.port, broker.client_id
        );

        Self::new(client, eventloop, subscriptions, SessionStatus::default())
    }

    /// Polls until the broker acknowledges the connection
    ///
    /// Any transport error before the first ConnAck is fatal.
    pub async fn connect(mut self) -> Result<MqttSession<Connected>, BridgeError> {
        self.status.connection_state = ConnectionState::Connecting;
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!("Connected to MQTT broker ({:?})", ack.code);
                    self.status.connection_state = ConnectionState::Connected;
                    self.status.touch();
                    subscribe_all(&self.client, &self.subscriptions, &mut self.status);
                    return Ok(self.transition());
                }
                Ok(event) => debug!("Pre-connect event: {:?}", event),
                Err(e) => {
                    error!("Failed to connect to MQTT broker: {}", e);
                    return Err(BridgeError::Connection(e.to_string()));
                }
            }
        }
    }
}

impl MqttSession<Connected> {
    /// Delivers inbound publishes to `dispatcher` until `cancel` fires
    pub async fn run(mut self, dispatcher: &Dispatcher, cancel: CancellationToken) -> SessionStatus {
        info!("MQTT session running");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutdown requested, disconnecting");
                    if let Err(e) = self.client.try_disconnect() {
                        warn!("Disconnect request failed: {}", e);
                    }
                    self.status.connection_state = ConnectionState::Disconnected;
                    break;
                }
                event = self.eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        self.status.messages_received += 1;
                        self.status.touch();
                        let msg = BusMessage::received(publish.topic.clone(), publish.payload.to_vec());
                        dispatcher.dispatch(&msg);
                    }
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("Reconnected to MQTT broker");
                        self.status.connection_state = ConnectionState::Connected;
                        subscribe_all(&self.client, &self.subscriptions, &mut self.status);
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        warn!("Broker closed the connection");
                        self.status.connection_state = ConnectionState::Reconnecting;
                    }
                    Ok(Event::Outgoing(Outgoing::Publish(_))) => {
                        self.status.messages_sent += 1;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        self.status.error_count += 1;
                        self.status.connection_state = ConnectionState::Reconnecting;
                        warn!("MQTT connection error: {}, retrying in {:?}", e, RECONNECT_DELAY);
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        }
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_broker_fails_the_first_connect() {
        // nothing listens on the discard port of localhost
        let broker = BrokerConfig {
            host: "127.0.0.1".to_string(),
            port: 9,
            ..BrokerConfig::default()
        };
        let session = MqttSession::<Configured>::create(&broker, vec!["zigbee2mqtt/#".to_string()]);
        assert_eq!(session.status().connection_state, ConnectionState::Disconnected);

        let result = session.connect().await;
        assert!(matches!(result, Err(BridgeError::Connection(_))));
    }
}
