//! # Bridge Configuration
//!
//! All broker settings and bus topics come from a single TOML file so the rule
//! logic never hardcodes a topic string. A missing file is replaced by a default
//! one on first start, which mirrors a typical zigbee2mqtt deployment.
//!
//! ## Lookup order
//!
//! 1. `$ZIGBRIDGE_CONFIG` if set
//! 2. `<config dir>/zigbridge/config.toml` (via `dirs::config_dir`)
//! 3. `./zigbridge.toml` when no config dir can be determined
//!
//! `ZIGBRIDGE_BROKER_HOST` and `ZIGBRIDGE_BROKER_PORT` override the broker
//! section after the file has been read.

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_ENV: &str = "ZIGBRIDGE_CONFIG";
const HOST_ENV: &str = "ZIGBRIDGE_BROKER_HOST";
const PORT_ENV: &str = "ZIGBRIDGE_BROKER_PORT";
const CONFIG_DIR: &str = "zigbridge";
const CONFIG_FILE: &str = "config.toml";
const FALLBACK_CONFIG_FILE: &str = "zigbridge.toml";

/// Top-level configuration file layout
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    pub broker: BrokerConfig,
    pub topics: TopicConfig,
    pub logging: LoggingConfig,
}

/// Connection settings for the MQTT broker
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Request queue size between the client handle and the event loop
    pub channel_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "zigbridge".to_string(),
            keep_alive_secs: 60,
            username: None,
            password: None,
            channel_capacity: 100,
        }
    }
}

/// Bus topics the rules listen on and publish to
///
/// Routing compares these by exact string equality. `subscriptions` is what the
/// session asks the broker for and may contain wildcards; it never influences
/// which handler a message reaches.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TopicConfig {
    /// Registry snapshot published by the coordinator
    pub device_info: String,
    pub motion_living_room: String,
    /// Sensor whose readings are only logged
    pub motion_test: String,
    pub shiny_button: String,
    /// Outbound only
    pub lamp: String,
    pub subscriptions: Vec<String>,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            device_info: "zigbee2mqtt/bridge/devices".to_string(),
            motion_living_room: "zigbee2mqtt/0x8c65a3fffe868d86".to_string(),
            motion_test: "zigbee2mqtt/motion_sensor_test".to_string(),
            shiny_button: "zigbee2mqtt/shiny_4_button".to_string(),
            lamp: "zigbee2mqtt/lamp_livingroom/set".to_string(),
            subscriptions: vec![
                "zigbee2mqtt/bridge/devices".to_string(),
                "zigbee2mqtt/#".to_string(),
            ],
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// File receiving one record per inbound message
    pub activity_log: PathBuf,
    /// Console level used when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            activity_log: PathBuf::from("zigbee_activity.log"),
            level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Resolves the config file location from the environment and platform dirs
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        match dirs::config_dir() {
            Some(mut dir) => {
                dir.push(CONFIG_DIR);
                dir.push(CONFIG_FILE);
                dir
            }
            None => PathBuf::from(FALLBACK_CONFIG_FILE),
        }
    }

    /// Writes a default config file if `path` does not exist yet
    pub async fn ensure_default(path: &Path) -> Result<(), BridgeError> {
        if tokio::fs::try_exists(path).await? {
            debug!("Config file {} already present", path.display());
            return Ok(());
        }
        info!("No config found, writing defaults to {}", path.display());
        BridgeConfig::default().save(path).await
    }

    /// Reads, applies env overrides, and validates
    pub async fn load(path: &Path) -> Result<Self, BridgeError> {
        let content = tokio::fs::read_to_string(path).await?;
        let mut config: BridgeConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), BridgeError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var(HOST_ENV) {
            debug!("Broker host overridden by {}", HOST_ENV);
            self.broker.host = host;
        }
        if let Ok(port) = std::env::var(PORT_ENV) {
            match port.parse() {
                Ok(port) => self.broker.port = port,
                Err(e) => warn!("Ignoring {}={}: {}", PORT_ENV, port, e),
            }
        }
    }

    /// Rejects configs whose routes would be empty or shadow each other
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.broker.host.is_empty() {
            return Err(BridgeError::Config("broker.host is empty".to_string()));
        }
        if self.broker.port == 0 {
            return Err(BridgeError::Config("broker.port must be non-zero".to_string()));
        }
        if self.topics.lamp.is_empty() {
            return Err(BridgeError::Config("topics.lamp is empty".to_string()));
        }

        let routed = [
            ("device_info", &self.topics.device_info),
            ("motion_living_room", &self.topics.motion_living_room),
            ("motion_test", &self.topics.motion_test),
            ("shiny_button", &self.topics.shiny_button),
        ];
        let mut seen = HashSet::new();
        for (name, topic) in routed {
            if topic.is_empty() {
                return Err(BridgeError::Config(format!("topics.{} is empty", name)));
            }
            if !seen.insert(topic.as_str()) {
                return Err(BridgeError::Config(format!(
                    "topics.{} duplicates another routed topic: {}",
                    name, topic
                )));
            }
        }
        if self.topics.subscriptions.is_empty() {
            warn!("No subscriptions configured, the bridge will receive nothing");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_zigbee2mqtt_layout() {
        let config = BridgeConfig::default();
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.topics.lamp, "zigbee2mqtt/lamp_livingroom/set");
        assert!(config.topics.subscriptions.contains(&"zigbee2mqtt/#".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [broker]
            host = "192.168.50.161"

            [topics]
            shiny_button = "zigbee2mqtt/hall_button"
            "#,
        )
        .unwrap();
        assert_eq!(config.broker.host, "192.168.50.161");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.topics.shiny_button, "zigbee2mqtt/hall_button");
        assert_eq!(config.topics.device_info, "zigbee2mqtt/bridge/devices");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn duplicate_routed_topic_is_rejected() {
        let mut config = BridgeConfig::default();
        config.topics.motion_test = config.topics.motion_living_room.clone();
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));
    }

    #[test]
    fn empty_lamp_topic_is_rejected() {
        let mut config = BridgeConfig::default();
        config.topics.lamp.clear();
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));
    }

    #[tokio::test]
    async fn ensure_default_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        BridgeConfig::ensure_default(&path).await.unwrap();
        let loaded = BridgeConfig::load(&path).await.unwrap();
        assert_eq!(loaded.topics, TopicConfig::default());
    }

    #[tokio::test]
    async fn ensure_default_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut custom = BridgeConfig::default();
        custom.topics.lamp = "zigbee2mqtt/lamp_kitchen/set".to_string();
        custom.save(&path).await.unwrap();

        BridgeConfig::ensure_default(&path).await.unwrap();
        let loaded = BridgeConfig::load(&path).await.unwrap();
        assert_eq!(loaded.topics.lamp, "zigbee2mqtt/lamp_kitchen/set");
    }

    #[tokio::test]
    async fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[broker\nhost = ").await.unwrap();

        assert!(matches!(
            BridgeConfig::load(&path).await,
            Err(BridgeError::TomlDe(_))
        ));
    }
}
