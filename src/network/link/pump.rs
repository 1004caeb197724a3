//! Message-passing delivery of [`LinkEvent`]s from a driver to the tracker.
//!
//! The driver owns an [`EventSender`] and posts events from whatever context
//! it runs in. The [`EventReceiver`] applies them to the tracker, either on a
//! dedicated thread ([`EventPump::spawn`]) or at well-defined turns of an
//! application's own loop ([`EventReceiver::dispatch_pending`]).

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};

use super::error::PumpClosed;
use super::event::LinkEvent;
use super::tracker::ConnectionStateTracker;

const PUMP_THREAD_NAME: &str = "netready-link-events";

/// Driver-side handle for posting events.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<LinkEvent>,
}

impl EventSender {
    /// Queues `event` for the tracker.
    pub fn post(&self, event: LinkEvent) -> Result<(), PumpClosed> {
        self.tx.send(event).map_err(|_| PumpClosed)
    }
}

/// Tracker-side end of the event channel.
#[derive(Debug)]
pub struct EventReceiver {
    rx: Receiver<LinkEvent>,
}

impl EventReceiver {
    /// Applies every event queued so far and returns how many were applied.
    pub fn dispatch_pending(&self, tracker: &ConnectionStateTracker) -> usize {
        let mut applied = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    dispatch(tracker, event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    /// Applies events as they arrive until every sender is dropped.
    pub fn run(&self, tracker: &ConnectionStateTracker) {
        for event in self.rx.iter() {
            dispatch(tracker, event);
        }
        log::debug!("all link event senders dropped");
    }
}

/// A background thread applying link events to a shared tracker.
#[derive(Debug)]
pub struct EventPump {
    handle: JoinHandle<()>,
}

impl EventPump {
    /// Creates an unbounded event channel.
    pub fn channel() -> (EventSender, EventReceiver) {
        let (tx, rx) = channel::unbounded();
        (EventSender { tx }, EventReceiver { rx })
    }

    /// Starts the dispatch thread for `tracker`.
    pub fn spawn(tracker: Arc<ConnectionStateTracker>) -> io::Result<(EventSender, EventPump)> {
        let (sender, receiver) = Self::channel();
        let handle = thread::Builder::new()
            .name(PUMP_THREAD_NAME.into())
            .spawn(move || receiver.run(&tracker))?;
        Ok((sender, EventPump { handle }))
    }

    /// Waits for the dispatch thread, which exits once every [`EventSender`]
    /// has been dropped and the queue is drained.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

fn dispatch(tracker: &ConnectionStateTracker, event: LinkEvent) {
    match event {
        LinkEvent::Up => log::debug!("link up"),
        LinkEvent::Down => log::warn!("link down"),
        LinkEvent::Ipv4Obtained(addr) => log::info!("got IPv4 address {addr}"),
        LinkEvent::Ipv6Obtained(addr) => log::info!("got IPv6 address {addr}"),
    }
    tracker.apply(event);
}
