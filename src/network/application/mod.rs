//! Operations an application performs once the network is ready.
//!
//! Every demo has the same shape: wait for the network, do one thing over
//! it, log the result, sleep, repeat. The "one thing" is an [`Operation`];
//! the loop around it is [`crate::app::Runner`]. Protocols that live in
//! external libraries (TLS, for one) plug in by implementing [`Operation`]
//! around their own client.

use heapless::Vec;
use serde::Serialize;

use crate::network::error::Error;
use crate::network::{Read, Write};

/// HTTP GET and JSON telemetry POST.
pub mod http;

/// MQTT 3.1.1 publish.
pub mod mqtt;

/// A single unit of network work, repeated by the application loop.
pub trait Operation {
    /// Failure of one run. Runs are independent: a failure is logged and
    /// the next run is attempted after the loop interval.
    type Error: core::fmt::Debug;

    /// Name used in log lines.
    fn name(&self) -> &str;

    /// Performs the operation once.
    fn perform(&mut self) -> Result<(), Self::Error>;
}

impl<T: Operation + ?Sized> Operation for &mut T {
    type Error = T::Error;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn perform(&mut self) -> Result<(), Self::Error> {
        (**self).perform()
    }
}

/// Writes all of `bytes`, looping over partial writes.
pub(crate) fn write_all<W: Write>(writer: &mut W, mut bytes: &[u8]) -> Result<(), Error> {
    while !bytes.is_empty() {
        match writer.write(bytes) {
            Ok(0) | Err(_) => return Err(Error::WriteError),
            Ok(n) => bytes = &bytes[n.min(bytes.len())..],
        }
    }
    Ok(())
}

/// Fills `buf` completely. A peer closing early is [`Error::ConnectionClosed`].
pub(crate) fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Err(Error::ConnectionClosed),
            Ok(n) => filled += n,
            Err(_) => return Err(Error::ReadError),
        }
    }
    Ok(())
}

/// Serializes `value` as JSON into a buffer of at most `N` bytes.
pub fn encode_json<T: Serialize + ?Sized, const N: usize>(value: &T) -> Result<Vec<u8, N>, Error> {
    let mut buf: Vec<u8, N> = Vec::new();
    buf.resize_default(N).map_err(|_| Error::ProtocolError)?;
    let len = serde_json_core::to_slice(value, &mut buf).map_err(|e| {
        log::warn!("JSON encoding failed: {e:?}");
        Error::ProtocolError
    })?;
    buf.truncate(len);
    Ok(buf)
}
