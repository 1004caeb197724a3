#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netready::app::Delay;
use netready::network::error::Error;
use netready::network::link::{DriverStatus, EventSender, LinkEvent, NetworkDriver};
use netready::network::{Close, Connect, Connection, Read, Write};

pub const LOCAL_V4: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 2);
pub const LOCAL_V6: Ipv6Addr = Ipv6Addr::new(0xfe80, 0, 0, 0, 0x1, 0x2, 0x3, 0x4);

/// Driver double that counts reconnect calls and optionally reports a
/// successful association through an event channel.
pub struct MockDriver {
    calls: Arc<AtomicU32>,
    outcome: Result<(), DriverStatus>,
    events: Option<EventSender>,
}

impl MockDriver {
    pub fn accepting() -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            outcome: Ok(()),
            events: None,
        }
    }

    pub fn rejecting(code: i32) -> Self {
        Self {
            outcome: Err(DriverStatus(code)),
            ..Self::accepting()
        }
    }

    /// On an accepted reconnect, post link-up and an IPv4 address.
    pub fn reporting_to(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn calls(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }
}

impl NetworkDriver for MockDriver {
    fn reconnect(&mut self) -> Result<(), DriverStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome?;
        if let Some(events) = &self.events {
            events.post(LinkEvent::Up).expect("pump alive");
            events
                .post(LinkEvent::Ipv4Obtained(LOCAL_V4))
                .expect("pump alive");
        }
        Ok(())
    }
}

/// Records requested pauses instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub delays: Vec<Duration>,
}

impl Delay for RecordingDelay {
    fn delay(&mut self, duration: Duration) {
        self.delays.push(duration);
    }
}

/// Shared view of what a [`MockConnection`] saw.
#[derive(Debug, Default, Clone)]
pub struct Wire {
    pub written: Arc<Mutex<Vec<u8>>>,
    pub closed: Arc<AtomicBool>,
}

impl Wire {
    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct MockConnection {
    incoming: VecDeque<u8>,
    max_read: usize,
    max_write: usize,
    fail_read_when_empty: bool,
    wire: Wire,
}

impl Read for MockConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.incoming.is_empty() && self.fail_read_when_empty {
            return Err(Error::Timeout);
        }
        let n = buf.len().min(self.max_read).min(self.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MockConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.max_write);
        self.wire.written.lock().unwrap().extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for MockConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        self.wire.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl Connection for MockConnection {}

/// Connector handing out connections that replay a canned response.
/// Responses added with [`MockNetwork::queue`] are served first, one per
/// connection.
#[derive(Debug)]
pub struct MockNetwork {
    pub response: Vec<u8>,
    pub queued: VecDeque<Vec<u8>>,
    pub max_read: usize,
    pub max_write: usize,
    pub refuse: bool,
    pub fail_read_when_empty: bool,
    pub remotes: Vec<String>,
    pub wire: Wire,
}

impl MockNetwork {
    pub fn serving(response: &[u8]) -> Self {
        Self {
            response: response.to_vec(),
            queued: VecDeque::new(),
            max_read: usize::MAX,
            max_write: usize::MAX,
            refuse: false,
            fail_read_when_empty: false,
            remotes: Vec::new(),
            wire: Wire::default(),
        }
    }

    pub fn queue(mut self, response: &[u8]) -> Self {
        self.queued.push_back(response.to_vec());
        self
    }
}

impl Connect for MockNetwork {
    type Connection = MockConnection;
    type Error = Error;

    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error> {
        self.remotes.push(remote.to_string());
        if self.refuse {
            return Err(Error::ConnectionRefused);
        }
        let response = self
            .queued
            .pop_front()
            .unwrap_or_else(|| self.response.clone());
        Ok(MockConnection {
            incoming: response.into_iter().collect(),
            max_read: self.max_read,
            max_write: self.max_write,
            fail_read_when_empty: self.fail_read_when_empty,
            wire: self.wire.clone(),
        })
    }
}
