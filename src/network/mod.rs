//! Network layer: readiness tracking, retry policy and transport traits.
//!
//! - [`link`]: is the interface up, does it have an address, reconnect if not
//! - [`retry`]: bounded exponential backoff for the reconnect loop
//! - [`application`]: operations run once the network is ready
//!
//! The transport traits below are what application operations are written
//! against. A platform supplies a [`Connect`] implementation (lwIP socket,
//! smoltcp, `std::net::TcpStream`, a test mock) and the operations stay
//! platform independent.

#![deny(unsafe_code)]

/// Transport error type.
pub mod error;

/// Link / IP readiness state machine and the tracker built on it.
pub mod link;

/// Retry policy for getting the network ready.
pub mod retry;

/// Operations performed over a ready network.
pub mod application;

/// Re-exports of the transport traits.
pub mod prelude {
    pub use super::{Close, Connect, Connection, Read, Write};
}

/// Byte source half of a connection.
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read into `buf`, returning the byte count. `Ok(0)` means the peer closed.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Byte sink half of a connection.
pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write some of `buf`, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Push buffered bytes to the peer.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Orderly teardown of a connection.
pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// An open stream to a remote peer.
pub trait Connection: Read + Write + Close {}

/// Opens connections, typically by resolving a `host:port` string.
pub trait Connect {
    /// Associated connection type
    type Connection: Connection;
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Open a connection to `remote`
    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error>;
}
