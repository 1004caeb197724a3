//! The connection readiness tracker.
//!
//! A single [`ConnectionStateTracker`] is created at start-up and shared by
//! `Arc` between the driver side, which reports link and IP events, and any
//! number of application threads, which block until the network is usable:
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//! use netready::network::link::ConnectionStateTracker;
//!
//! let tracker = Arc::new(ConnectionStateTracker::new());
//!
//! let driver_side = Arc::clone(&tracker);
//! let driver = thread::spawn(move || {
//!     driver_side.on_link_up();
//!     driver_side.on_ipv4_obtained();
//! });
//!
//! assert!(tracker.wait_ready(Duration::from_secs(5)));
//! driver.join().unwrap();
//! ```
//!
//! The tracker never retries and never aborts. What to do after a timeout is
//! decided by the caller, see [`crate::app::ensure_ready`].

use core::fmt;
use core::net::{Ipv4Addr, Ipv6Addr};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

use super::driver::NetworkDriver;
use super::error::ConnectError;
use super::event::LinkEvent;
use super::state::{IpFamily, LinkState, ReadinessFlags};

/// Result of a blocking wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The requested readiness condition holds.
    Ready,
    /// The deadline passed first.
    TimedOut,
    /// [`ConnectionStateTracker::shutdown`] was called.
    Shutdown,
}

impl WaitOutcome {
    /// True for [`WaitOutcome::Ready`].
    pub fn is_ready(&self) -> bool {
        matches!(self, WaitOutcome::Ready)
    }
}

struct Inner {
    flags: ReadinessFlags,
    shut_down: bool,
}

/// Process-wide record of "is the network usable right now".
///
/// Flags and the shutdown marker are guarded by one mutex paired with one
/// condition variable; every event wakes all waiters. The driver sits behind
/// its own lock so it may report events from inside
/// [`NetworkDriver::reconnect`].
pub struct ConnectionStateTracker {
    inner: Mutex<Inner>,
    changed: Condvar,
    driver: Mutex<Option<Box<dyn NetworkDriver>>>,
}

impl ConnectionStateTracker {
    /// Creates a tracker in the `Down` state with no driver attached.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                flags: ReadinessFlags::DOWN,
                shut_down: false,
            }),
            changed: Condvar::new(),
            driver: Mutex::new(None),
        }
    }

    /// Creates a tracker with `driver` already attached.
    pub fn with_driver(driver: impl NetworkDriver + 'static) -> Self {
        let tracker = Self::new();
        tracker.attach_driver(driver);
        tracker
    }

    /// Attaches (or replaces) the driver used by [`request_reconnect`](Self::request_reconnect).
    pub fn attach_driver(&self, driver: impl NetworkDriver + 'static) {
        *self.driver.lock() = Some(Box::new(driver));
        log::debug!("network driver attached");
    }

    /// Detaches the driver. Later reconnect requests fail with
    /// [`ConnectError::DriverUnavailable`].
    pub fn detach_driver(&self) -> Option<Box<dyn NetworkDriver>> {
        let driver = self.driver.lock().take();
        if driver.is_some() {
            log::debug!("network driver detached");
        }
        driver
    }

    /// The link layer reports connected. From `Down` this lands in
    /// `LinkUpNoIp`; addresses must be obtained again.
    pub fn on_link_up(&self) {
        self.apply(LinkEvent::Up);
    }

    /// The link went down. Clears every flag at once, since addresses
    /// obtained on the old link are no longer valid.
    pub fn on_link_down(&self) {
        self.apply(LinkEvent::Down);
    }

    /// DHCP completed. Ignored while the link is down.
    pub fn on_ipv4_obtained(&self) {
        self.apply(LinkEvent::Ipv4Obtained(Ipv4Addr::UNSPECIFIED));
    }

    /// SLAAC / DHCPv6 completed. Ignored while the link is down.
    pub fn on_ipv6_obtained(&self) {
        self.apply(LinkEvent::Ipv6Obtained(Ipv6Addr::UNSPECIFIED));
    }

    /// Applies a typed driver event in one critical section and wakes every
    /// waiter.
    pub fn apply(&self, event: LinkEvent) {
        let (before, after) = {
            let mut inner = self.inner.lock();
            let before = inner.flags;
            inner.flags = before.apply(&event);
            self.changed.notify_all();
            (before, inner.flags)
        };
        if before.state() != after.state() {
            log::debug!("{}: {:?} -> {:?}", event.name(), before.state(), after.state());
        } else if !after.link_up && !matches!(event, LinkEvent::Down) {
            log::debug!("{}: ignored while link is down", event.name());
        } else {
            log::trace!("{}: state stays {:?}", event.name(), after.state());
        }
    }

    /// Snapshot of the flags, taken under the lock.
    pub fn flags(&self) -> ReadinessFlags {
        self.inner.lock().flags
    }

    /// Snapshot of the derived state.
    pub fn state(&self) -> LinkState {
        self.flags().state()
    }

    /// Link up and at least one IP family has an address.
    pub fn is_ready(&self) -> bool {
        self.is_ready_for(IpFamily::Any)
    }

    /// Link up and `family` has an address.
    pub fn is_ready_for(&self, family: IpFamily) -> bool {
        self.inner.lock().flags.is_ready_for(family)
    }

    /// Blocks until [`is_ready`](Self::is_ready) holds or `timeout` elapses.
    ///
    /// A zero timeout polls. Returns `false` on timeout and after
    /// [`shutdown`](Self::shutdown).
    pub fn wait_ready(&self, timeout: Duration) -> bool {
        self.wait(IpFamily::Any, timeout).is_ready()
    }

    /// [`wait_ready`](Self::wait_ready) for a specific IP family.
    pub fn wait_ready_for(&self, family: IpFamily, timeout: Duration) -> bool {
        self.wait(family, timeout).is_ready()
    }

    /// Blocks until the link is up with an address of `family`, the
    /// deadline passes, or the tracker is shut down.
    ///
    /// The deadline is measured on the monotonic clock. A timeout too large
    /// to represent as an [`Instant`] waits without a deadline.
    pub fn wait(&self, family: IpFamily, timeout: Duration) -> WaitOutcome {
        let mut inner = self.inner.lock();
        if let Some(outcome) = Self::settled(&inner, family) {
            return outcome;
        }
        if timeout.is_zero() {
            return WaitOutcome::TimedOut;
        }

        match Instant::now().checked_add(timeout) {
            Some(deadline) => loop {
                let timed_out = self.changed.wait_until(&mut inner, deadline).timed_out();
                if let Some(outcome) = Self::settled(&inner, family) {
                    return outcome;
                }
                if timed_out {
                    return WaitOutcome::TimedOut;
                }
            },
            None => loop {
                self.changed.wait(&mut inner);
                if let Some(outcome) = Self::settled(&inner, family) {
                    return outcome;
                }
            },
        }
    }

    /// Delegates to the attached driver's reconnect entry point.
    ///
    /// Called exactly once per request; the flags are left untouched.
    pub fn request_reconnect(&self) -> Result<(), ConnectError> {
        let mut driver = self.driver.lock();
        let Some(driver) = driver.as_mut() else {
            log::warn!("reconnect requested with no network driver attached");
            return Err(ConnectError::DriverUnavailable);
        };
        match driver.reconnect() {
            Ok(()) => {
                log::info!("reconnect requested");
                Ok(())
            }
            Err(status) => {
                log::warn!("driver rejected reconnect: {status}");
                Err(ConnectError::DriverRejected(status))
            }
        }
    }

    /// Releases every waiter and detaches the driver.
    ///
    /// Waits started after this return [`WaitOutcome::Shutdown`] unless the
    /// network is already ready. Events are still recorded.
    pub fn shutdown(&self) {
        {
            let mut inner = self.inner.lock();
            inner.shut_down = true;
            self.changed.notify_all();
        }
        self.driver.lock().take();
        log::info!("connection state tracker shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.inner.lock().shut_down
    }

    fn settled(inner: &MutexGuard<'_, Inner>, family: IpFamily) -> Option<WaitOutcome> {
        if inner.flags.is_ready_for(family) {
            Some(WaitOutcome::Ready)
        } else if inner.shut_down {
            Some(WaitOutcome::Shutdown)
        } else {
            None
        }
    }
}

impl Default for ConnectionStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConnectionStateTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (flags, shut_down) = {
            let inner = self.inner.lock();
            (inner.flags, inner.shut_down)
        };
        f.debug_struct("ConnectionStateTracker")
            .field("flags", &flags)
            .field("shut_down", &shut_down)
            .field("driver_attached", &self.driver.lock().is_some())
            .finish()
    }
}
