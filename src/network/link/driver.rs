//! The seam between the tracker and a concrete WiFi or Ethernet driver.

use super::error::DriverStatus;

/// Reconnect entry point of a network driver.
///
/// Implementations start a new association attempt and return as soon as the
/// driver has accepted or refused the request. The outcome of the attempt
/// itself arrives later as [`LinkEvent`](super::LinkEvent)s.
pub trait NetworkDriver: Send {
    /// Ask the driver to reconnect.
    fn reconnect(&mut self) -> Result<(), DriverStatus>;
}

impl<F> NetworkDriver for F
where
    F: FnMut() -> Result<(), DriverStatus> + Send,
{
    fn reconnect(&mut self) -> Result<(), DriverStatus> {
        self()
    }
}
