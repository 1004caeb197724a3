//! Readiness flags and the states derived from them.

use serde::{Deserialize, Serialize};

use super::event::LinkEvent;

/// The set of readiness flags maintained for one network interface.
///
/// Flags only change through [`apply`](Self::apply), which keeps every IP
/// flag clear while `link_up` is false. An address counts only if it was
/// obtained after the most recent link-up.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessFlags {
    /// The data-link layer reports the interface as associated / carrier up.
    pub link_up: bool,
    /// An IPv4 address has been assigned.
    pub ipv4_ready: bool,
    /// An IPv6 address has been assigned.
    pub ipv6_ready: bool,
}

impl ReadinessFlags {
    /// All flags cleared.
    pub const DOWN: Self = Self {
        link_up: false,
        ipv4_ready: false,
        ipv6_ready: false,
    };

    /// True when at least one IP family has an address.
    pub fn has_ip(&self) -> bool {
        self.ipv4_ready || self.ipv6_ready
    }

    /// True when the link is up and `family` has an address.
    pub fn is_ready_for(&self, family: IpFamily) -> bool {
        self.link_up && family.is_satisfied_by(self)
    }

    /// Readiness for any IP family.
    pub fn is_ready(&self) -> bool {
        self.is_ready_for(IpFamily::Any)
    }

    /// The state-machine view of these flags.
    pub fn state(&self) -> LinkState {
        LinkState::from(*self)
    }

    /// The flags after `event`.
    ///
    /// Link-up from `Down` starts with no addresses, so an address reported
    /// before the link came up never makes it ready. Address events while
    /// the link is down are dropped. Link-down clears everything.
    pub fn apply(self, event: &LinkEvent) -> Self {
        match event {
            LinkEvent::Up if self.link_up => self,
            LinkEvent::Up => Self {
                link_up: true,
                ..Self::DOWN
            },
            LinkEvent::Down => Self::DOWN,
            LinkEvent::Ipv4Obtained(_) | LinkEvent::Ipv6Obtained(_) if !self.link_up => self,
            LinkEvent::Ipv4Obtained(_) => Self {
                ipv4_ready: true,
                ..self
            },
            LinkEvent::Ipv6Obtained(_) => Self {
                ipv6_ready: true,
                ..self
            },
        }
    }
}

/// Connection state as seen by application code.
///
/// ```text
///  Down ──link up──▶ LinkUpNoIp ──ip obtained──▶ Ready
///   ▲                    │                         │
///   └────link down───────┴─────────link down───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No link.
    Down,
    /// Link is up but no IP address has been obtained yet.
    LinkUpNoIp,
    /// Link is up and at least one IP family has an address.
    Ready,
}

impl From<ReadinessFlags> for LinkState {
    fn from(flags: ReadinessFlags) -> Self {
        match (flags.link_up, flags.has_ip()) {
            (false, _) => LinkState::Down,
            (true, false) => LinkState::LinkUpNoIp,
            (true, true) => LinkState::Ready,
        }
    }
}

/// IP family an application needs before it can do network I/O.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    /// Only IPv4 will do.
    V4,
    /// Only IPv6 will do.
    V6,
    /// Either family.
    #[default]
    Any,
}

impl IpFamily {
    /// Whether `flags` carry an address of this family. Ignores `link_up`.
    pub fn is_satisfied_by(&self, flags: &ReadinessFlags) -> bool {
        match self {
            IpFamily::V4 => flags.ipv4_ready,
            IpFamily::V6 => flags.ipv6_ready,
            IpFamily::Any => flags.has_ip(),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            LinkState::Down => defmt::write!(f, "Down"),
            LinkState::LinkUpNoIp => defmt::write!(f, "LinkUpNoIp"),
            LinkState::Ready => defmt::write!(f, "Ready"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IpFamily {
    fn format(&self, f: defmt::Formatter) {
        match self {
            IpFamily::V4 => defmt::write!(f, "V4"),
            IpFamily::V6 => defmt::write!(f, "V6"),
            IpFamily::Any => defmt::write!(f, "Any"),
        }
    }
}
