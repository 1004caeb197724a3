//! Raw HTTP over any [`Connect`](crate::network::Connect) implementation.
//!
//! [`HttpGet`] is the operation the `http_request` demos repeat once the
//! network is ready: open a TCP connection, send a fixed HTTP/1.0 GET, and
//! hand the raw response bytes to the caller until the server closes the
//! connection. Nothing is parsed.
//!
//! [`TelemetryPost`] sends a JSON reading instead and only looks at the
//! status code of the reply.
//!
//! ```rust,no_run
//! use netready::network::application::http::{Client, HttpTarget};
//! # use netready::network::{Close, Connect, Connection, Read, Write};
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
//! # struct Stack;
//! # impl Connect for Stack {
//! #     type Connection = Socket;
//! #     type Error = ();
//! #     fn connect(&mut self, _remote: &str) -> Result<Socket, ()> { Ok(Socket) }
//! # }
//!
//! let mut client = Client::new(Stack);
//! let target = HttpTarget::new("example.com", 80, "/").unwrap();
//! let received = client.get(&target, |chunk| {
//!     print!("{}", String::from_utf8_lossy(chunk));
//! });
//! ```

/// Client and request assembly.
pub mod client;

pub use client::{
    BODY_CAPACITY, Client, HttpTarget, Method, RX_CHUNK_SIZE, build_post, build_request,
};

use heapless::Vec;
use serde::Serialize;

use super::{Operation, encode_json};
use crate::network::Connect;
use crate::network::error::Error;

/// A repeatable GET of one target, as an [`Operation`].
pub struct HttpGet<N: Connect, S: FnMut(&[u8])> {
    client: Client<N>,
    target: HttpTarget,
    sink: S,
    last_received: usize,
}

impl<N: Connect, S: FnMut(&[u8])> HttpGet<N, S> {
    /// GET `target` through `network`, giving response bytes to `sink`.
    pub fn new(network: N, target: HttpTarget, sink: S) -> Self {
        Self {
            client: Client::new(network),
            target,
            sink,
            last_received: 0,
        }
    }

    /// Bytes received by the last successful run.
    pub fn last_received(&self) -> usize {
        self.last_received
    }

    /// The target being fetched.
    pub fn target(&self) -> &HttpTarget {
        &self.target
    }
}

impl<N: Connect, S: FnMut(&[u8])> Operation for HttpGet<N, S> {
    type Error = Error;

    fn name(&self) -> &str {
        "http-get"
    }

    fn perform(&mut self) -> Result<(), Self::Error> {
        self.last_received = self.client.get(&self.target, &mut self.sink)?;
        Ok(())
    }
}

impl<N: Connect, S: FnMut(&[u8])> core::fmt::Debug for HttpGet<N, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HttpGet")
            .field("target", &self.target)
            .field("last_received", &self.last_received)
            .finish_non_exhaustive()
    }
}

/// POSTs one JSON reading per run, as an [`Operation`].
///
/// `reading` is called at the start of every run. A reply outside 2xx fails
/// the run with [`Error::UnexpectedStatus`].
pub struct TelemetryPost<N: Connect, R> {
    client: Client<N>,
    target: HttpTarget,
    reading: R,
    last_status: Option<u16>,
}

impl<N: Connect, R> TelemetryPost<N, R> {
    /// POST readings to `target` through `network`.
    pub fn new(network: N, target: HttpTarget, reading: R) -> Self {
        Self {
            client: Client::new(network),
            target,
            reading,
            last_status: None,
        }
    }

    /// Status code of the last reply, if any run got that far.
    pub fn last_status(&self) -> Option<u16> {
        self.last_status
    }

    /// The target readings are posted to.
    pub fn target(&self) -> &HttpTarget {
        &self.target
    }

    /// Consumes the operation, returning the connector.
    pub fn into_inner(self) -> N {
        self.client.into_inner()
    }
}

impl<N, R, T> Operation for TelemetryPost<N, R>
where
    N: Connect,
    R: FnMut() -> T,
    T: Serialize,
{
    type Error = Error;

    fn name(&self) -> &str {
        "http-post-telemetry"
    }

    fn perform(&mut self) -> Result<(), Self::Error> {
        let body: Vec<u8, BODY_CAPACITY> = encode_json(&(self.reading)())?;
        let status = self.client.post_json(&self.target, &body)?;
        self.last_status = Some(status);
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(Error::UnexpectedStatus(status))
        }
    }
}

impl<N: Connect, R> core::fmt::Debug for TelemetryPost<N, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TelemetryPost")
            .field("target", &self.target)
            .field("last_status", &self.last_status)
            .finish_non_exhaustive()
    }
}
