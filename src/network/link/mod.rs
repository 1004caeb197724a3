//! Link and IP readiness tracking.
//!
//! Network drivers report link and address changes; application code waits
//! until the link is up and an address has been obtained before it opens
//! sockets, and asks the driver to reconnect when that takes too long.
//!
//! - [`state`]: the readiness flags and derived [`LinkState`]
//! - [`event`]: typed [`LinkEvent`]s posted by drivers
//! - [`driver`]: the [`NetworkDriver`] reconnect seam
//! - `tracker` (std): the blocking [`ConnectionStateTracker`]
//! - `pump` (std): channel-based event delivery

pub mod driver;
pub mod error;
pub mod event;
pub mod state;

#[cfg(feature = "std")]
pub mod pump;
#[cfg(feature = "std")]
pub mod tracker;

pub use driver::NetworkDriver;
pub use error::{ConnectError, DriverStatus, PumpClosed};
pub use event::LinkEvent;
pub use state::{IpFamily, LinkState, ReadinessFlags};

#[cfg(feature = "std")]
pub use pump::{EventPump, EventReceiver, EventSender};
#[cfg(feature = "std")]
pub use tracker::{ConnectionStateTracker, WaitOutcome};
