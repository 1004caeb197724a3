use heapless::Vec;

use crate::network::application::{read_exact, write_all};
use crate::network::error::Error;
use crate::network::{Connection, Write};

const CONNECT: u8 = 0x10;
const CONNACK: u8 = 0x20;
const PUBLISH: u8 = 0x30;
const PUBACK: u8 = 0x40;
const DISCONNECT: u8 = 0xE0;

const PROTOCOL_NAME: &[u8] = b"MQTT";
const PROTOCOL_LEVEL: u8 = 4; // MQTT 3.1.1

const CLEAN_SESSION: u8 = 0x02;
const PASSWORD_FLAG: u8 = 0x40;
const USERNAME_FLAG: u8 = 0x80;

/// Largest packet this client assembles, fixed header included.
pub const PACKET_CAPACITY: usize = 512;

/// Delivery guarantee of a publish.
///
/// Exactly-once delivery needs a four-packet exchange and session state
/// that outlives a connection; it is not offered.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum QoS {
    /// Fire and forget.
    AtMostOnce = 0,
    /// Acknowledged by the broker with PUBACK.
    AtLeastOnce = 1,
}

impl TryFrom<u8> for QoS {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            _ => Err(Error::ProtocolError),
        }
    }
}

/// Parameters of the CONNECT packet.
#[derive(Debug, Clone)]
pub struct Options<'a> {
    /// Client identifier, at most 23 bytes for maximum broker compatibility.
    pub client_id: &'a str,
    /// Keep-alive interval announced to the broker.
    pub keep_alive_seconds: u16,
    /// Ask the broker to discard any previous session.
    pub clean_session: bool,
    /// User name, such as a device access token.
    pub username: Option<&'a str>,
    /// Password; only sent together with a user name.
    pub password: Option<&'a str>,
}

/// An MQTT 3.1.1 session over one connection.
///
/// The client only publishes. It owns the connection until
/// [`into_inner`](Self::into_inner) hands it back for closing.
pub struct Client<C: Connection> {
    connection: C,
    is_connected: bool,
    next_packet_id: u16,
}

impl<C: Connection> Client<C> {
    /// Wraps an open connection. Packet identifiers start at 1.
    pub fn new(connection: C) -> Self {
        Self::with_packet_id(connection, 1)
    }

    /// Wraps an open connection, numbering QoS 1 publishes from `next`.
    /// Zero is not a valid identifier and is replaced by 1.
    pub fn with_packet_id(connection: C, next: u16) -> Self {
        Self {
            connection,
            is_connected: false,
            next_packet_id: next.max(1),
        }
    }

    /// Sends CONNECT and waits for the CONNACK.
    ///
    /// A broker return code of 1 to 5 maps to [`Error::ConnectionRefused`].
    pub fn connect(&mut self, options: &Options) -> Result<(), Error> {
        let packet = connect_packet(options)?;
        send(&mut self.connection, &packet)?;

        let mut connack = [0u8; 4];
        read_exact(&mut self.connection, &mut connack)?;
        if connack[0] != CONNACK || connack[1] != 2 {
            return Err(Error::ProtocolError);
        }
        match connack[3] {
            0 => {
                self.is_connected = true;
                Ok(())
            }
            code @ 1..=5 => {
                log::warn!("broker refused connection: return code {code}");
                Err(Error::ConnectionRefused)
            }
            _ => Err(Error::ProtocolError),
        }
    }

    /// Whether a CONNACK accepted the session and no DISCONNECT was sent since.
    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// Publishes `payload` to `topic`.
    ///
    /// At [`QoS::AtLeastOnce`] the call waits for the matching PUBACK and
    /// returns the packet identifier used.
    pub fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
    ) -> Result<Option<u16>, Error> {
        if !self.is_connected {
            return Err(Error::NotOpen);
        }
        let packet_id = match qos {
            QoS::AtMostOnce => None,
            QoS::AtLeastOnce => Some(self.take_packet_id()),
        };
        let packet = publish_packet(topic, payload, qos, packet_id.unwrap_or(0))?;
        send(&mut self.connection, &packet)?;

        if let Some(id) = packet_id {
            let mut puback = [0u8; 4];
            read_exact(&mut self.connection, &mut puback)?;
            if puback[0] != PUBACK || puback[1] != 2 {
                return Err(Error::ProtocolError);
            }
            let acked = u16::from_be_bytes([puback[2], puback[3]]);
            if acked != id {
                log::warn!("PUBACK for packet {acked}, expected {id}");
                return Err(Error::ProtocolError);
            }
        }
        Ok(packet_id)
    }

    /// Sends DISCONNECT. The connection itself stays open.
    pub fn disconnect(&mut self) -> Result<(), Error> {
        self.is_connected = false;
        send(&mut self.connection, &[DISCONNECT, 0])
    }

    /// Identifier the next QoS 1 publish will use.
    pub fn next_packet_id(&self) -> u16 {
        self.next_packet_id
    }

    /// Hands the connection back.
    pub fn into_inner(self) -> C {
        self.connection
    }

    fn take_packet_id(&mut self) -> u16 {
        let id = self.next_packet_id;
        self.next_packet_id = id.checked_add(1).unwrap_or(1);
        id
    }
}

impl<C: Connection> core::fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Client")
            .field("is_connected", &self.is_connected)
            .field("next_packet_id", &self.next_packet_id)
            .finish_non_exhaustive()
    }
}

fn send<C: Connection>(connection: &mut C, packet: &[u8]) -> Result<(), Error> {
    write_all(connection, packet)?;
    connection.flush().map_err(|_| Error::WriteError)
}

/// Assembles a CONNECT packet.
pub fn connect_packet(options: &Options) -> Result<Vec<u8, PACKET_CAPACITY>, Error> {
    let mut flags = 0;
    if options.clean_session {
        flags |= CLEAN_SESSION;
    }
    if options.username.is_some() {
        flags |= USERNAME_FLAG;
        if options.password.is_some() {
            flags |= PASSWORD_FLAG;
        }
    }

    let mut body: Vec<u8, PACKET_CAPACITY> = Vec::new();
    push_field(&mut body, PROTOCOL_NAME)?;
    push_bytes(&mut body, &[PROTOCOL_LEVEL, flags])?;
    push_bytes(&mut body, &options.keep_alive_seconds.to_be_bytes())?;
    push_field(&mut body, options.client_id.as_bytes())?;
    if let Some(username) = options.username {
        push_field(&mut body, username.as_bytes())?;
        if let Some(password) = options.password {
            push_field(&mut body, password.as_bytes())?;
        }
    }
    frame(CONNECT, &body)
}

/// Assembles a PUBLISH packet. `packet_id` is only written at QoS 1.
pub fn publish_packet(
    topic: &str,
    payload: &[u8],
    qos: QoS,
    packet_id: u16,
) -> Result<Vec<u8, PACKET_CAPACITY>, Error> {
    if topic.is_empty() || topic.contains(['+', '#']) {
        return Err(Error::ProtocolError);
    }
    let mut body: Vec<u8, PACKET_CAPACITY> = Vec::new();
    push_field(&mut body, topic.as_bytes())?;
    if qos == QoS::AtLeastOnce {
        push_bytes(&mut body, &packet_id.to_be_bytes())?;
    }
    push_bytes(&mut body, payload)?;
    frame(PUBLISH | ((qos as u8) << 1), &body)
}

fn frame(header: u8, body: &[u8]) -> Result<Vec<u8, PACKET_CAPACITY>, Error> {
    let mut fixed_header: Vec<u8, 4> = Vec::new();
    encode_remaining_length(&mut fixed_header, body.len()).map_err(|_| Error::ProtocolError)?;

    let mut packet = Vec::new();
    push_bytes(&mut packet, &[header])?;
    push_bytes(&mut packet, &fixed_header)?;
    push_bytes(&mut packet, body)?;
    Ok(packet)
}

fn push_bytes(buf: &mut Vec<u8, PACKET_CAPACITY>, bytes: &[u8]) -> Result<(), Error> {
    buf.extend_from_slice(bytes).map_err(|_| Error::ProtocolError)
}

/// Writes a length-prefixed string field.
fn push_field(buf: &mut Vec<u8, PACKET_CAPACITY>, bytes: &[u8]) -> Result<(), Error> {
    let len = u16::try_from(bytes.len()).map_err(|_| Error::ProtocolError)?;
    push_bytes(buf, &len.to_be_bytes())?;
    push_bytes(buf, bytes)
}

// Seven bits per byte, least significant group first; the high bit marks continuation.
fn encode_remaining_length(buf: &mut Vec<u8, 4>, mut len: usize) -> Result<(), ()> {
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        buf.push(byte).map_err(|_| ())?;
        if len == 0 {
            return Ok(());
        }
    }
}
