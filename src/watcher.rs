//! Announcement watcher subsystem over MQTT.
//!
//! One subscription per descriptor of interest, delayed behind a startup
//! gate; every inbound publish is handled on its own task with no shared
//! mutable state.  The registry is re-scanned for each announcement, so a
//! handler always sees the currently installed packages.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use thiserror::Error;
use tokio::time::{sleep, timeout};

use crate::config::Config;
use crate::matching;
use crate::notify::{self, Notifier};
use crate::registry::RegistryScanner;
use crate::topic;
use crate::types::VersionAnnouncement;

/// Outcome of the initial broker handshake.  Both variants are fatal to
/// the caller; there is no retry at startup.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("broker did not acknowledge the connection within {0:?}")]
    TimedOut(Duration),
    #[error("broker connection failed: {0}")]
    Failed(#[from] rumqttc::ConnectionError),
}

/// Connect to the broker and block until the session is acknowledged, the
/// configured timeout elapses, or the connection fails.
pub async fn connect(cfg: &Config) -> Result<(AsyncClient, EventLoop), ConnectError> {
    let mut options = MqttOptions::new(
        cfg.client_id.clone(),
        cfg.broker_host.clone(),
        cfg.broker_port,
    );
    options.set_keep_alive(Duration::from_secs(30));
    if let Some(username) = &cfg.username {
        options.set_credentials(username.clone(), cfg.password.clone().unwrap_or_default());
    }

    let (client, mut eventloop) = AsyncClient::new(options, 64);
    let deadline = Duration::from_secs(cfg.connect_timeout_secs);
    let handshake = timeout(deadline, async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
                Ok(_) => continue,
                Err(e) => return Err(ConnectError::Failed(e)),
            }
        }
    });
    match handshake.await {
        Ok(Ok(())) => {
            info!(
                "connected to broker {}:{}",
                cfg.broker_host, cfg.broker_port
            );
            Ok((client, eventloop))
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(ConnectError::TimedOut(deadline)),
    }
}

/// Everything a message handler needs; shared read-only across handler
/// tasks.
pub struct Watcher {
    /// Update information embedded in the running daemon itself.
    pub own_descriptor: String,
    pub namespace: String,
    pub scanner: RegistryScanner,
    pub notifier: Arc<dyn Notifier>,
    pub notify_timeout_ms: u32,
}

/// Register interest in every field published for `descriptor`.
///
/// The delay keeps retained announcements from firing a burst of
/// notifications right at startup, and gives the host system time to
/// finish any pending integration work.  A descriptor that escapes to the
/// empty string produces no subscription at all.
pub async fn activate(client: AsyncClient, namespace: String, descriptor: String, delay: Duration) {
    sleep(delay).await;
    let Some(filter) = topic::subscription_filter(&namespace, &descriptor) else {
        return;
    };
    info!("subscribing for {}", descriptor);
    if let Err(e) = client.subscribe(filter.as_str(), QoS::AtMostOnce).await {
        error!("cannot subscribe to {}: {}", filter, e);
    }
}

/// Drive the broker event loop: arm the subscription gates, then dispatch
/// every inbound announcement to its own handler task.
pub async fn run_watcher(
    client: AsyncClient,
    mut eventloop: EventLoop,
    watcher: Arc<Watcher>,
    startup_delay: Duration,
) -> anyhow::Result<()> {
    // One gate for the daemon itself, one per registered package.  The
    // gates all sleep through the same startup delay while this loop keeps
    // the connection alive underneath them.
    let mut descriptors = vec![watcher.own_descriptor.clone()];
    for package in watcher.scanner.scan() {
        descriptors.push(package.descriptor.as_raw().to_string());
    }
    descriptors.sort();
    descriptors.dedup();
    for descriptor in descriptors {
        tokio::spawn(activate(
            client.clone(),
            watcher.namespace.clone(),
            descriptor,
            startup_delay,
        ));
    }

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let watcher = Arc::clone(&watcher);
                tokio::task::spawn_blocking(move || {
                    handle_message(&watcher, &publish.topic, &publish.payload);
                });
            }
            Ok(_) => {}
            Err(e) => {
                // The client re-establishes the session on the next poll;
                // throttle so an unreachable broker does not spin this loop.
                error!("broker connection error: {}", e);
                sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

/// The matching pipeline for one inbound message.
///
/// Everything that can go wrong here is scoped to this single message:
/// irrelevant topics and empty versions are dropped silently, a malformed
/// payload is dropped with a diagnostic.  Nothing propagates back to the
/// transport.
pub fn handle_message(watcher: &Watcher, topic_name: &str, payload: &[u8]) {
    let Some(announcement) = topic::parse(&watcher.namespace, topic_name) else {
        debug!("ignoring message on {}", topic_name);
        return;
    };
    if announcement.field != topic::VERSION_FIELD {
        return;
    }

    let version = match serde_json::from_slice::<VersionAnnouncement>(payload) {
        Ok(decoded) => decoded.version,
        Err(e) => {
            error!("cannot decode version payload on {}: {}", topic_name, e);
            return;
        }
    };
    if version.is_empty() {
        return;
    }

    let announced = topic::unescape(&announcement.descriptor_segment);
    info!("{} reports version {}", announced, version);

    let matches = matching::matching_packages(&watcher.scanner, &announcement.descriptor_segment);
    let selected = matching::most_recent(matches);
    let action = notify::decide(&announced, &version, &watcher.own_descriptor, selected);
    notify::dispatch(&action, watcher.notifier.as_ref(), watcher.notify_timeout_ms);
}
