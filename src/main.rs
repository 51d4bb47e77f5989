pub mod config;
pub mod dispatch;
pub mod error;
pub mod mqtt;
pub mod rules;

#[cfg(test)]
mod test_support;

use crate::config::{BridgeConfig, LoggingConfig};
use crate::dispatch::{Dispatcher, ACTIVITY_TARGET};
use crate::error::BridgeError;
use crate::mqtt::session::{Configured, MqttSession};
use crate::rules::{OverrideState, TopicRouter};
use color_eyre::{eyre::eyre, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{error, info, Dispatch, Level, Subscriber};
use tracing_subscriber::filter::{EnvFilter, Targets};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = BridgeConfig::default_path();
    let bootstrap = bootstrap_subscriber(console_filter("info")?, std::io::stdout);
    let config = load_config(&config_path, bootstrap).await?;

    setup_logging(&config.logging)?;
    info!("Using config {}", config_path.display());

    let session =
        MqttSession::<Configured>::create(&config.broker, config.topics.subscriptions.clone());

    let router = TopicRouter::from_topics(&config.topics);
    info!("Router ready with {} rules", router.len());
    let dispatcher = Dispatcher::new(
        router,
        Arc::new(session.client()),
        OverrideState::new(),
        config.topics.lamp.clone(),
    );

    let session = session.connect().await.map_err(|e| {
        error!("Giving up: {}", e);
        eyre!("Error connecting to MQTT broker: {}", e)
    })?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C"),
            Err(e) => error!("Unable to listen for Ctrl-C: {}", e),
        }
        shutdown.cancel();
    });

    let status = session.run(&dispatcher, cancel).await;
    info!(
        state = ?status.connection_state,
        last_activity = ?status.last_activity,
        received = status.messages_received,
        sent = status.messages_sent,
        errors = status.error_count,
        "Session ended"
    );

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    Ok(())
}

/// `RUST_LOG` if set, else `default_level`; activity records never go to the console
fn console_filter(default_level: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level))
        .add_directive(format!("{}=off", ACTIVITY_TARGET).parse()?))
}

/// Console-only subscriber used while the config file is read
fn bootstrap_subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(writer)
        .finish()
}

/// Creates the default file if needed and loads it, logging through `bootstrap`
async fn load_config(
    path: &Path,
    bootstrap: impl Into<Dispatch>,
) -> Result<BridgeConfig, BridgeError> {
    async {
        BridgeConfig::ensure_default(path).await?;
        BridgeConfig::load(path).await
    }
    .with_subscriber(bootstrap)
    .await
}

/// Console output for humans, plus the activity file with one line per message
fn setup_logging(logging: &LoggingConfig) -> Result<()> {
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(console_filter(&logging.level)?);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logging.activity_log)
        .map_err(|e| {
            eyre!(
                "Failed to open activity log {}: {}",
                logging.activity_log.display(),
                e
            )
        })?;
    let activity = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .with_filter(Targets::new().with_target(ACTIVITY_TARGET, Level::INFO));

    tracing_subscriber::registry()
        .with(console)
        .with(activity)
        .try_init()
        .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;
    Ok(())
}
