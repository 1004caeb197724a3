//! MQTT 3.1.1 publishing over any [`Connect`](crate::network::Connect) implementation.
//!
//! [`MqttPublish`] is the telemetry operation of the MQTT demos: each run
//! opens a connection to the broker, sends CONNECT, publishes one message,
//! sends DISCONNECT and closes. No session state is kept between runs apart
//! from the packet identifier counter.
//!
//! ```rust,no_run
//! use netready::network::application::mqtt::{Client, Options, QoS};
//! # use netready::network::{Close, Connection, Read, Write};
//! # struct Socket;
//! # impl Connection for Socket {}
//! # impl Read for Socket {
//! #     type Error = ();
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl Write for Socket {
//! #     type Error = ();
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Close for Socket {
//! #     type Error = ();
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//!
//! let mut client = Client::new(Socket);
//! let options = Options {
//!     client_id: "netready",
//!     keep_alive_seconds: 60,
//!     clean_session: true,
//!     username: None,
//!     password: None,
//! };
//! client.connect(&options)?;
//! client.publish("/mytopic", b"Hello, MQTT!", QoS::AtLeastOnce)?;
//! client.disconnect()?;
//! # Ok::<(), netready::network::error::Error>(())
//! ```

/// CONNECT / PUBLISH / DISCONNECT client and packet assembly.
pub mod client;

pub use client::{Client, Options, PACKET_CAPACITY, QoS};

use core::fmt::Write as _;

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use super::{Operation, encode_json};
use crate::network::error::Error;
use crate::network::{Close, Connect, Connection};

/// Largest message body a publish carries.
pub const PAYLOAD_CAPACITY: usize = 256;

/// Broker and message settings of the publish operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttSettings {
    /// Broker host name or address literal.
    pub host: String<64>,
    /// Broker TCP port.
    pub port: u16,
    /// Client identifier.
    pub client_id: String<23>,
    /// User name; empty sends none. ThingsBoard takes the device token here.
    pub username: String<64>,
    /// Password; empty sends none.
    pub password: String<64>,
    /// Topic messages are published to.
    pub topic: String<128>,
    /// Delivery guarantee, 0 or 1.
    pub qos: u8,
    /// Keep-alive interval announced to the broker.
    pub keep_alive_seconds: u16,
}

impl Default for MqttSettings {
    fn default() -> Self {
        let mut host = String::new();
        let mut client_id = String::new();
        let mut topic = String::new();
        // All literals are well under capacity.
        let _ = host.push_str("demo.thingsboard.io");
        let _ = client_id.push_str("netready");
        let _ = topic.push_str("v1/devices/me/telemetry");
        Self {
            host,
            port: 1883,
            client_id,
            username: String::new(),
            password: String::new(),
            topic,
            qos: 1,
            keep_alive_seconds: 60,
        }
    }
}

impl MqttSettings {
    /// `host:port` of the broker.
    pub fn remote(&self) -> Result<String<70>, Error> {
        let mut remote = String::new();
        write!(remote, "{}:{}", self.host, self.port).map_err(|_| Error::InvalidAddress)?;
        Ok(remote)
    }

    /// Connect options drawn from these settings.
    pub fn options(&self) -> Options<'_> {
        Options {
            client_id: &self.client_id,
            keep_alive_seconds: self.keep_alive_seconds,
            clean_session: true,
            username: (!self.username.is_empty()).then_some(self.username.as_str()),
            password: (!self.password.is_empty()).then_some(self.password.as_str()),
        }
    }
}

/// Publishes one message per run, as an [`Operation`].
pub struct MqttPublish<N: Connect> {
    network: N,
    settings: MqttSettings,
    qos: QoS,
    payload: Vec<u8, PAYLOAD_CAPACITY>,
    next_packet_id: u16,
    published: u32,
}

impl<N: Connect> MqttPublish<N> {
    /// Publishes `payload` through `network` as described by `settings`.
    ///
    /// Fails with [`Error::ProtocolError`] if the QoS level is not 0 or 1 or
    /// the payload does not fit [`PAYLOAD_CAPACITY`].
    pub fn new(network: N, settings: MqttSettings, payload: &[u8]) -> Result<Self, Error> {
        let qos = QoS::try_from(settings.qos)?;
        let mut op = Self {
            network,
            settings,
            qos,
            payload: Vec::new(),
            next_packet_id: 1,
            published: 0,
        };
        op.set_payload(payload)?;
        Ok(op)
    }

    /// Replaces the message sent by later runs.
    pub fn set_payload(&mut self, payload: &[u8]) -> Result<(), Error> {
        self.payload = Vec::from_slice(payload).map_err(|_| Error::ProtocolError)?;
        Ok(())
    }

    /// Replaces the message with `value` encoded as JSON.
    pub fn set_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.payload = encode_json(value)?;
        Ok(())
    }

    /// The message later runs send.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The settings in use.
    pub fn settings(&self) -> &MqttSettings {
        &self.settings
    }

    /// The wrapped connector.
    pub fn network(&self) -> &N {
        &self.network
    }

    /// Messages published so far.
    pub fn published(&self) -> u32 {
        self.published
    }
}

impl<N: Connect> Operation for MqttPublish<N> {
    type Error = Error;

    fn name(&self) -> &str {
        "mqtt-publish"
    }

    fn perform(&mut self) -> Result<(), Self::Error> {
        let remote = self.settings.remote()?;
        let connection = self.network.connect(&remote).map_err(|e| {
            log::warn!("connect to broker {remote} failed: {e:?}");
            Error::ConnectionRefused
        })?;

        let mut client = Client::with_packet_id(connection, self.next_packet_id);
        let result = publish_once(&mut client, &self.settings, self.qos, &self.payload);
        self.next_packet_id = client.next_packet_id();

        if let Err(e) = client.into_inner().close() {
            log::debug!("closing connection to {remote} failed: {e:?}");
        }

        result?;
        self.published += 1;
        log::info!(
            "published {} bytes to {} on {remote}",
            self.payload.len(),
            self.settings.topic
        );
        Ok(())
    }
}

fn publish_once<C: Connection>(
    client: &mut Client<C>,
    settings: &MqttSettings,
    qos: QoS,
    payload: &[u8],
) -> Result<(), Error> {
    client.connect(&settings.options())?;
    client.publish(&settings.topic, payload, qos)?;
    client.disconnect()
}

impl<N: Connect> core::fmt::Debug for MqttPublish<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MqttPublish")
            .field("settings", &self.settings)
            .field("qos", &self.qos)
            .field("published", &self.published)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_credentials_are_omitted() {
        let mut settings = MqttSettings::default();
        let options = settings.options();
        assert_eq!(options.username, None);
        assert_eq!(options.password, None);
        assert!(options.clean_session);

        settings.username = String::try_from("A1_TEST_TOKEN").unwrap();
        assert_eq!(settings.options().username, Some("A1_TEST_TOKEN"));
        assert_eq!(settings.options().password, None);
    }

    #[test]
    fn default_settings_target_thingsboard() {
        let settings = MqttSettings::default();
        assert_eq!(settings.remote().unwrap().as_str(), "demo.thingsboard.io:1883");
        assert_eq!(settings.topic.as_str(), "v1/devices/me/telemetry");
        assert_eq!(settings.qos, 1);
    }
}
