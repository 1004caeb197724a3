//! Typed events posted by a network driver.

use core::net::{Ipv4Addr, Ipv6Addr};

/// A link or IP event reported by the network driver.
///
/// Address payloads are for logging; the tracker only records that an
/// address of the given family exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Association / carrier detected.
    Up,
    /// Disconnected. Invalidates every IP address obtained on the link.
    Down,
    /// DHCP assigned an IPv4 address.
    Ipv4Obtained(Ipv4Addr),
    /// SLAAC or DHCPv6 assigned an IPv6 address.
    Ipv6Obtained(Ipv6Addr),
}

impl LinkEvent {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            LinkEvent::Up => "link-up",
            LinkEvent::Down => "link-down",
            LinkEvent::Ipv4Obtained(_) => "ipv4-obtained",
            LinkEvent::Ipv6Obtained(_) => "ipv6-obtained",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkEvent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            LinkEvent::Up => defmt::write!(f, "Up"),
            LinkEvent::Down => defmt::write!(f, "Down"),
            LinkEvent::Ipv4Obtained(addr) => {
                let [a, b, c, d] = addr.octets();
                defmt::write!(f, "Ipv4Obtained({}.{}.{}.{})", a, b, c, d)
            }
            LinkEvent::Ipv6Obtained(addr) => {
                defmt::write!(f, "Ipv6Obtained({:x})", addr.segments())
            }
        }
    }
}
