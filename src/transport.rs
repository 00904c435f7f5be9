//! Message transport
//!
//! Everything that leaves the pipeline goes through a [`CommandSink`]. The
//! MQTT implementations wrap rumqttc's synchronous client; the writer and
//! memory sinks back dry runs and tests.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rumqttc::{
    Client, ConnectReturnCode, Connection, Event, MqttOptions, Outgoing, Packet, QoS,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MqttConfig;
use crate::error::GestureError;

/// Request queue depth for the MQTT client
const REQUEST_CAPACITY: usize = 10;

/// Pause before the event loop retries after a connection error
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Destination for encoded payloads
pub trait CommandSink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), GestureError>;
}

fn mqtt_options(config: &MqttConfig, role: &str) -> MqttOptions {
    let mut options = MqttOptions::new(config.client_id(role), config.broker.clone(), config.port);
    options.set_keep_alive(Duration::from_secs(config.keepalive_secs));
    if let Some((username, password)) = config.credentials() {
        options.set_credentials(username, password);
    }
    options
}

/// Drive the connection until the broker acknowledges the session
fn await_connack(connection: &mut Connection, config: &MqttConfig) -> Result<(), GestureError> {
    for event in connection.iter() {
        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    info!(broker = %config.broker, port = config.port, "MQTT connected");
                    return Ok(());
                }
                return Err(GestureError::Mqtt(format!(
                    "broker refused connection: {:?}",
                    ack.code
                )));
            }
            Ok(_) => {}
            Err(e) => {
                return Err(GestureError::Mqtt(format!(
                    "cannot connect to {}:{}: {}",
                    config.broker, config.port, e
                )));
            }
        }
    }
    Err(GestureError::Mqtt("connection closed before CONNACK".to_string()))
}

/// Publisher that keeps its network loop on a background thread
pub struct MqttPublisher {
    client: Client,
    worker: JoinHandle<()>,
    closing: Arc<AtomicBool>,
}

impl MqttPublisher {
    /// Connect and wait for the broker to accept the session.
    ///
    /// Failing to connect here is fatal; once running, rumqttc reconnects on
    /// its own and publish errors surface per call.
    pub fn connect(config: &MqttConfig) -> Result<Self, GestureError> {
        let (client, mut connection) = Client::new(mqtt_options(config, "gesture"), REQUEST_CAPACITY);
        await_connack(&mut connection, config)?;

        let closing = Arc::new(AtomicBool::new(false));
        let worker_closing = Arc::clone(&closing);
        let worker = thread::Builder::new()
            .name("mqtt-publisher".to_string())
            .spawn(move || drive(connection, &worker_closing))?;

        Ok(Self {
            client,
            worker,
            closing,
        })
    }

    /// Send DISCONNECT and wait for the network thread to finish
    pub fn disconnect(self) -> Result<(), GestureError> {
        let Self {
            client,
            worker,
            closing,
        } = self;

        closing.store(true, Ordering::SeqCst);
        let sent = client
            .disconnect()
            .map_err(|e| GestureError::Mqtt(e.to_string()));
        // With every client handle gone the event loop stops taking requests
        drop(client);

        if worker.join().is_err() {
            warn!("MQTT network thread panicked");
        }
        sent?;
        info!("MQTT client disconnected");
        Ok(())
    }
}

impl CommandSink for MqttPublisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), GestureError> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .map_err(|e| GestureError::Mqtt(e.to_string()))
    }
}

/// Run the event loop until DISCONNECT goes out, or until the connection
/// fails after shutdown was requested
fn drive(mut connection: Connection, closing: &AtomicBool) {
    for event in connection.iter() {
        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                debug!(code = ?ack.code, "MQTT reconnected");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
            Ok(_) => {}
            Err(e) if closing.load(Ordering::SeqCst) => {
                debug!(error = %e, "MQTT connection closed during shutdown");
                break;
            }
            Err(e) => {
                warn!(error = %e, "MQTT connection error; retrying");
                thread::sleep(RECONNECT_DELAY);
            }
        }
    }
    debug!("MQTT network thread finished");
}

/// What the subscriber saw on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriberEvent {
    Connected,
    Disconnected(String),
    Message { topic: String, payload: Vec<u8> },
}

/// Blocking subscriber for a single topic.
///
/// The subscription is renewed on every CONNACK so it survives reconnects.
pub struct MqttSubscriber {
    client: Client,
    connection: Connection,
    topic: String,
}

impl MqttSubscriber {
    pub fn connect(config: &MqttConfig) -> Result<Self, GestureError> {
        let (client, mut connection) = Client::new(mqtt_options(config, "hub"), REQUEST_CAPACITY);
        await_connack(&mut connection, config)?;
        client
            .subscribe(config.topic.clone(), QoS::AtMostOnce)
            .map_err(|e| GestureError::Mqtt(e.to_string()))?;
        info!(topic = %config.topic, "subscribed");

        Ok(Self {
            client,
            connection,
            topic: config.topic.clone(),
        })
    }

    /// Block until something interesting happens. `None` once the client is closed.
    pub fn next_event(&mut self) -> Option<SubscriberEvent> {
        loop {
            match self.connection.iter().next()? {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    if let Err(e) = self.client.subscribe(self.topic.clone(), QoS::AtMostOnce) {
                        warn!(error = %e, "resubscribe failed");
                    }
                    return Some(SubscriberEvent::Connected);
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    return Some(SubscriberEvent::Message {
                        topic: publish.topic,
                        payload: publish.payload.to_vec(),
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    thread::sleep(RECONNECT_DELAY);
                    return Some(SubscriberEvent::Disconnected(e.to_string()));
                }
            }
        }
    }
}

/// Writes each payload as one NDJSON line; used for dry runs
pub struct WriterSink<W: Write> {
    writer: W,
    with_topic: bool,
}

#[derive(Serialize)]
struct TopicLine<'a> {
    topic: &'a str,
    payload: serde_json::Value,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            with_topic: false,
        }
    }

    /// Wrap every payload as `{"topic", "payload"}`
    pub fn with_topic(mut self, with_topic: bool) -> Self {
        self.with_topic = with_topic;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CommandSink for WriterSink<W> {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), GestureError> {
        if self.with_topic {
            let line = TopicLine {
                topic,
                payload: serde_json::from_str(payload)?,
            };
            serde_json::to_writer(&mut self.writer, &line)?;
            writeln!(self.writer)?;
        } else {
            writeln!(self.writer, "{payload}")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Records every publication in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub published: Vec<(String, String)>,
    /// Fail this many upcoming publishes
    pub fail_next: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> Vec<&str> {
        self.published.iter().map(|(_, p)| p.as_str()).collect()
    }
}

impl CommandSink for MemorySink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), GestureError> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(GestureError::Mqtt("simulated publish failure".to_string()));
        }
        self.published.push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}
