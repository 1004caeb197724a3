//! Repeats one network operation on a host, using the OS network stack as
//! the "driver". Set `NETREADY_CONFIG` to a JSON config file to change the
//! targets, timeouts or retry policy; `RUST_LOG` controls logging.
//!
//! `NETREADY_OPERATION` picks what is repeated: `get` (the default) fetches
//! the `http` target, `post` sends a JSON reading to it, and `mqtt`
//! publishes the same reading to the `mqtt` broker.

use std::env;
use std::fs;
use std::io::{self, Read as _, Write as _};
use std::net::{IpAddr, Shutdown, TcpStream, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use netready::app::{ReadyError, Runner, RunnerConfig};
use netready::config::Config;
use netready::network::application::http::{HttpGet, TelemetryPost};
use netready::network::application::mqtt::MqttPublish;
use netready::network::error::Error;
use netready::network::link::{
    ConnectionStateTracker, DriverStatus, EventPump, EventSender, LinkEvent, NetworkDriver,
};
use netready::network::{Close, Connect, Connection, Read, Write};
use serde::Serialize;

const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);
// Nothing is sent; connecting a UDP socket only selects the outgoing route.
const ROUTE_TARGET_V4: &str = "8.8.8.8:80";
const ROUTE_TARGET_V6: &str = "[2001:4860:4860::8888]:80";
const ROUTE_CHECK_INTERVAL: Duration = Duration::from_secs(5);
const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

#[derive(Serialize)]
struct Reading {
    temp: i32,
}

/// Reports the host's routable address as link-up plus an IP event.
struct HostDriver {
    events: EventSender,
}

impl HostDriver {
    fn local_address() -> Option<IpAddr> {
        [("0.0.0.0:0", ROUTE_TARGET_V4), ("[::]:0", ROUTE_TARGET_V6)]
            .into_iter()
            .find_map(|(bind, target)| {
                let socket = UdpSocket::bind(bind).ok()?;
                socket.connect(target).ok()?;
                socket.local_addr().ok().map(|addr| addr.ip())
            })
    }
}

impl NetworkDriver for HostDriver {
    fn reconnect(&mut self) -> Result<(), DriverStatus> {
        let Some(address) = Self::local_address() else {
            warn!("no route to the internet");
            return Err(DriverStatus(-1));
        };
        debug!("host address {address}");

        let event = match address {
            IpAddr::V4(v4) => LinkEvent::Ipv4Obtained(v4),
            IpAddr::V6(v6) => LinkEvent::Ipv6Obtained(v6),
        };
        self.events
            .post(LinkEvent::Up)
            .and_then(|()| self.events.post(event))
            .map_err(|_| DriverStatus(-2))
    }
}

/// Posts link-down when a ready host loses its route, so the runner
/// reconnects instead of failing operation after operation. Returns once the
/// tracker shuts down, dropping its sender.
fn spawn_route_monitor(
    tracker: Arc<ConnectionStateTracker>,
    events: EventSender,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("route-monitor".into())
        .spawn(move || {
            while sleep_unless_shut_down(&tracker, ROUTE_CHECK_INTERVAL) {
                if !tracker.flags().link_up || HostDriver::local_address().is_some() {
                    continue;
                }
                warn!("route lost, reporting link down");
                if events.post(LinkEvent::Down).is_err() {
                    break;
                }
            }
            debug!("route monitor stopped");
        })
}

/// Sleeps for `total`, returning false early if the tracker shuts down.
fn sleep_unless_shut_down(tracker: &ConnectionStateTracker, total: Duration) -> bool {
    let mut slept = Duration::ZERO;
    while slept < total {
        if tracker.is_shut_down() {
            return false;
        }
        thread::sleep(SHUTDOWN_POLL);
        slept += SHUTDOWN_POLL;
    }
    !tracker.is_shut_down()
}

struct TcpConnection {
    stream: TcpStream,
}

impl Read for TcpConnection {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.stream.read(buf).map_err(|e| match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Error::Timeout,
            _ => Error::ReadError,
        })
    }
}

impl Write for TcpConnection {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream.write(buf).map_err(|_| Error::WriteError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush().map_err(|_| Error::WriteError)
    }
}

impl Close for TcpConnection {
    type Error = Error;
    fn close(self) -> Result<(), Self::Error> {
        self.stream
            .shutdown(Shutdown::Both)
            .map_err(|_| Error::NotOpen)
    }
}

impl Connection for TcpConnection {}

/// Resolves `host:port` and connects to the first address that answers.
struct TcpConnector;

impl Connect for TcpConnector {
    type Connection = TcpConnection;
    type Error = Error;

    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error> {
        let addresses = remote.to_socket_addrs().map_err(|e| {
            warn!("DNS lookup for {remote} failed: {e}");
            Error::InvalidAddress
        })?;

        for address in addresses {
            info!("DNS lookup succeeded. IP={}", address.ip());
            match TcpStream::connect_timeout(&address, SOCKET_TIMEOUT) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(SOCKET_TIMEOUT))
                        .and_then(|()| stream.set_write_timeout(Some(SOCKET_TIMEOUT)))
                        .map_err(|_| Error::NotOpen)?;
                    info!("connected to {address}");
                    return Ok(TcpConnection { stream });
                }
                Err(e) => warn!("connect to {address} failed: {e}"),
            }
        }
        Err(Error::ConnectionRefused)
    }
}

fn load_config() -> Result<Config> {
    let Ok(path) = env::var("NETREADY_CONFIG") else {
        info!("NETREADY_CONFIG not set, using defaults");
        return Ok(Config::default());
    };
    let json = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    Config::from_json(&json).with_context(|| format!("parsing {path}"))
}

fn run_selected(runner: &mut Runner, config: &Config) -> Result<ReadyError> {
    let operation = env::var("NETREADY_OPERATION").unwrap_or_else(|_| "get".to_string());
    let reason = match operation.as_str() {
        "get" => {
            info!(
                "fetching http://{}:{}{}",
                config.http.host, config.http.port, config.http.path
            );
            let mut stdout = io::stdout();
            let mut op = HttpGet::new(TcpConnector, config.http.clone(), |chunk: &[u8]| {
                let _ = stdout.write_all(chunk);
            });
            runner.run(&mut op)
        }
        "post" => {
            info!(
                "posting telemetry to http://{}:{}{}",
                config.http.host, config.http.port, config.http.path
            );
            let mut op = TelemetryPost::new(TcpConnector, config.http.clone(), || Reading {
                temp: 25,
            });
            runner.run(&mut op)
        }
        "mqtt" => {
            info!(
                "publishing to {} on {}:{}",
                config.mqtt.topic, config.mqtt.host, config.mqtt.port
            );
            let mut op = MqttPublish::new(TcpConnector, config.mqtt.clone(), b"")
                .context("mqtt settings")?;
            op.set_json(&Reading { temp: 25 }).context("encoding the reading")?;
            runner.run(&mut op)
        }
        other => anyhow::bail!("unknown NETREADY_OPERATION {other:?}, expected get, post or mqtt"),
    };
    Ok(reason)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;

    let tracker = Arc::new(ConnectionStateTracker::new());
    let (events, pump) =
        EventPump::spawn(Arc::clone(&tracker)).context("starting the event pump")?;
    let monitor = spawn_route_monitor(Arc::clone(&tracker), events.clone())
        .context("starting the route monitor")?;
    tracker.attach_driver(HostDriver { events });

    if let Err(e) = tracker.request_reconnect() {
        warn!("initial association failed: {e}");
    }

    let mut runner = Runner::new(Arc::clone(&tracker), RunnerConfig::from(&config));
    let outcome = run_selected(&mut runner, &config);

    tracker.shutdown();
    if monitor.join().is_err() {
        warn!("route monitor panicked");
    }
    if pump.join().is_err() {
        warn!("event pump panicked");
    }
    Err(outcome?).context("network lost")
}
