//! Transport errors for operations run over a [`Connection`](super::Connection).

use core::fmt;

/// Errors raised while talking to a remote peer.
///
/// Kept small and `Copy` so it can be returned from `no_std` transports.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An operation was attempted on a connection that is not open.
    NotOpen,
    /// Writing to the connection failed or made no progress.
    WriteError,
    /// Reading from the connection failed.
    ReadError,
    /// The remote refused the connection, or it could not be opened.
    ConnectionRefused,
    /// The transport timed out.
    Timeout,
    /// The peer closed the connection before sending anything.
    ConnectionClosed,
    /// The host/port could not be turned into an address.
    InvalidAddress,
    /// A request could not be built, or the peer's reply was malformed.
    ProtocolError,
    /// The server answered with a status outside 2xx.
    UnexpectedStatus(u16),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::NotOpen => "connection not open",
            Error::WriteError => "write failed",
            Error::ReadError => "read failed",
            Error::ConnectionRefused => "connection refused",
            Error::Timeout => "timed out",
            Error::ConnectionClosed => "connection closed by peer",
            Error::InvalidAddress => "invalid address",
            Error::ProtocolError => "protocol error",
            Error::UnexpectedStatus(status) => {
                return write!(f, "unexpected status {status}");
            }
        };
        f.write_str(msg)
    }
}

impl core::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NotOpen => defmt::write!(f, "NotOpen"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::ConnectionRefused => defmt::write!(f, "ConnectionRefused"),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::ConnectionClosed => defmt::write!(f, "ConnectionClosed"),
            Error::InvalidAddress => defmt::write!(f, "InvalidAddress"),
            Error::ProtocolError => defmt::write!(f, "ProtocolError"),
            Error::UnexpectedStatus(status) => defmt::write!(f, "UnexpectedStatus({})", status),
        }
    }
}
