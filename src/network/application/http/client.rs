use core::fmt::Write as _;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::network::application::write_all;
use crate::network::error::Error;
use crate::network::{Close, Connect, Connection, Read, Write};

/// Longest host name a target can carry.
pub const HOST_CAPACITY: usize = 64;
/// Longest request path a target can carry.
pub const PATH_CAPACITY: usize = 128;
/// Size of the buffer a request head is assembled in.
pub const REQUEST_CAPACITY: usize = 384;
/// Size of each read from the connection; also the largest chunk handed to a sink.
pub const RX_CHUNK_SIZE: usize = 64;
/// Largest JSON body a telemetry POST carries.
pub const BODY_CAPACITY: usize = 128;

const STATUS_LINE_CAPACITY: usize = 64;
const USER_AGENT: &str = concat!("netready/", env!("CARGO_PKG_VERSION"));

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpTarget {
    /// Host name or address literal.
    pub host: String<HOST_CAPACITY>,
    /// TCP port.
    pub port: u16,
    /// Request path, starting with `/`.
    pub path: String<PATH_CAPACITY>,
}

impl HttpTarget {
    /// Builds a target, failing if `host` or `path` exceed their capacity.
    pub fn new(host: &str, port: u16, path: &str) -> Result<Self, Error> {
        Ok(Self {
            host: String::try_from(host).map_err(|_| Error::InvalidAddress)?,
            port,
            path: String::try_from(path).map_err(|_| Error::InvalidAddress)?,
        })
    }

    /// `host:port`, as passed to [`Connect::connect`].
    pub fn remote(&self) -> Result<String<{ HOST_CAPACITY + 6 }>, Error> {
        let mut remote = String::new();
        write!(remote, "{}:{}", self.host, self.port).map_err(|_| Error::InvalidAddress)?;
        Ok(remote)
    }
}

impl Default for HttpTarget {
    fn default() -> Self {
        let mut host = String::new();
        let mut path = String::new();
        // Both literals are well under capacity.
        let _ = host.push_str("example.com");
        let _ = path.push('/');
        Self {
            host,
            port: 80,
            path,
        }
    }
}

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl Method {
    fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Assembles the HTTP/1.0 GET request for `target`.
///
/// HTTP/1.0 makes the server close the connection after the response, which
/// is how the end of the body is detected.
pub fn build_request(target: &HttpTarget) -> Result<String<REQUEST_CAPACITY>, Error> {
    build_head(Method::Get, target, None)
}

/// Assembles the head of a POST carrying `content_length` bytes of
/// `content_type`. The body follows the blank line.
pub fn build_post(
    target: &HttpTarget,
    content_type: &str,
    content_length: usize,
) -> Result<String<REQUEST_CAPACITY>, Error> {
    build_head(Method::Post, target, Some((content_type, content_length)))
}

fn build_head(
    method: Method,
    target: &HttpTarget,
    body: Option<(&str, usize)>,
) -> Result<String<REQUEST_CAPACITY>, Error> {
    let mut head = String::new();
    write!(
        head,
        "{} {} HTTP/1.0\r\nHost: {}:{}\r\nUser-Agent: {}\r\n",
        method.as_str(),
        target.path,
        target.host,
        target.port,
        USER_AGENT
    )
    .map_err(|_| Error::ProtocolError)?;
    if let Some((content_type, length)) = body {
        write!(
            head,
            "Content-Type: {content_type}\r\nContent-Length: {length}\r\n"
        )
        .map_err(|_| Error::ProtocolError)?;
    }
    head.push_str("\r\n").map_err(|_| Error::ProtocolError)?;
    Ok(head)
}

/// Parses the status code out of a response's first line.
fn parse_status(line: &[u8]) -> Result<u16, Error> {
    let line = core::str::from_utf8(line).map_err(|_| Error::ProtocolError)?;
    let line = line.lines().next().ok_or(Error::ProtocolError)?;
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().ok_or(Error::ProtocolError)?;
    if !version.starts_with("HTTP/") {
        return Err(Error::ProtocolError);
    }
    parts
        .next()
        .ok_or(Error::ProtocolError)?
        .parse::<u16>()
        .map_err(|_| Error::ProtocolError)
}

/// A raw HTTP/1.0 client. Responses are streamed, not parsed, apart from the
/// status code of a POST.
pub struct Client<N: Connect> {
    network: N,
}

impl<N: Connect> Client<N> {
    /// Wraps a connector.
    pub fn new(network: N) -> Self {
        Self { network }
    }

    /// The wrapped connector.
    pub fn network(&self) -> &N {
        &self.network
    }

    /// Consumes the client, returning the connector.
    pub fn into_inner(self) -> N {
        self.network
    }

    /// Sends a GET for `target` and streams the raw response into `sink`.
    ///
    /// Bytes arrive in chunks of at most [`RX_CHUNK_SIZE`] until the server
    /// closes the connection. Returns the number of bytes received. The
    /// connection is closed on every path once it has been opened.
    pub fn get<S>(&mut self, target: &HttpTarget, mut sink: S) -> Result<usize, Error>
    where
        S: FnMut(&[u8]),
    {
        let head = build_request(target)?;
        self.send(Method::Get, target, head.as_bytes(), &[], &mut sink)
    }

    /// POSTs a JSON `body` to `target` and returns the response status code.
    ///
    /// The rest of the response is read and discarded.
    pub fn post_json(&mut self, target: &HttpTarget, body: &[u8]) -> Result<u16, Error> {
        let head = build_post(target, "application/json", body.len())?;
        let mut status_line: heapless::Vec<u8, STATUS_LINE_CAPACITY> = heapless::Vec::new();
        let mut capture = |chunk: &[u8]| {
            let room = status_line.capacity() - status_line.len();
            let _ = status_line.extend_from_slice(&chunk[..chunk.len().min(room)]);
        };
        self.send(Method::Post, target, head.as_bytes(), body, &mut capture)?;
        let status = parse_status(&status_line)?;
        log::info!("HTTP POST status: {status}");
        Ok(status)
    }

    fn send<S>(
        &mut self,
        method: Method,
        target: &HttpTarget,
        head: &[u8],
        body: &[u8],
        sink: &mut S,
    ) -> Result<usize, Error>
    where
        S: FnMut(&[u8]),
    {
        let remote = target.remote()?;

        let mut connection = self.network.connect(&remote).map_err(|e| {
            log::warn!("connect to {remote} failed: {e:?}");
            Error::ConnectionRefused
        })?;

        log::info!("sending HTTP {} {}{}", method.as_str(), remote, target.path);
        let result = exchange(&mut connection, head, body, sink);

        if let Err(e) = connection.close() {
            log::debug!("closing connection to {remote} failed: {e:?}");
        }

        if let Ok(total) = result {
            log::info!("HTTP response from {remote}: {total} bytes");
        }
        result
    }
}

impl<N: Connect + core::fmt::Debug> core::fmt::Debug for Client<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Client")
            .field("network", &self.network)
            .finish()
    }
}

fn exchange<C, S>(
    connection: &mut C,
    head: &[u8],
    body: &[u8],
    sink: &mut S,
) -> Result<usize, Error>
where
    C: Connection,
    S: FnMut(&[u8]),
{
    write_all(connection, head)?;
    write_all(connection, body)?;
    connection.flush().map_err(|_| Error::WriteError)?;

    let mut chunk = [0u8; RX_CHUNK_SIZE];
    let mut total = 0;
    loop {
        match connection.read(&mut chunk) {
            Ok(0) if total == 0 => return Err(Error::ConnectionClosed),
            Ok(0) => return Ok(total),
            Ok(n) => {
                sink(&chunk[..n]);
                total += n;
            }
            Err(e) => {
                log::warn!("read failed after {total} bytes: {e:?}");
                return Err(Error::ReadError);
            }
        }
    }
}
