//! Errors reported by the reconnect path.

use core::fmt;

/// Opaque status code returned by a network driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DriverStatus(pub i32);

impl DriverStatus {
    /// The raw driver code.
    pub fn code(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "driver status {}", self.0)
    }
}

/// Failure of [`request_reconnect`](super::ConnectionStateTracker::request_reconnect).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    /// No driver is attached: not yet initialised, detached, or shut down.
    DriverUnavailable,
    /// The driver's own reconnect call failed.
    DriverRejected(DriverStatus),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::DriverUnavailable => f.write_str("network driver unavailable"),
            ConnectError::DriverRejected(status) => {
                write!(f, "network driver rejected reconnect ({status})")
            }
        }
    }
}

impl core::error::Error for ConnectError {}

/// The receiving side of an event channel has been dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpClosed;

impl fmt::Display for PumpClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("link event pump closed")
    }
}

impl core::error::Error for PumpClosed {}

#[cfg(feature = "defmt")]
impl defmt::Format for DriverStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "DriverStatus({=i32})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConnectError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConnectError::DriverUnavailable => defmt::write!(f, "DriverUnavailable"),
            ConnectError::DriverRejected(status) => {
                defmt::write!(f, "DriverRejected({})", status)
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PumpClosed {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "PumpClosed")
    }
}
