//! # netready - network readiness for IoT devices
//!
//! Firmware that talks to the cloud spends most of its networking code on one
//! question: is the interface up and does it have an address yet? This crate
//! answers it with a single shared
//! [`ConnectionStateTracker`](network::link::ConnectionStateTracker) that
//! network drivers update and application code waits on, plus the
//! reconnect-with-backoff loop that sits on top of it.
//!
//! ## Features
//!
//! ### Readiness tracking
//! - Typed link / IPv4 / IPv6 flags with a derived `Down` → `LinkUpNoIp` → `Ready` state
//! - Blocking waits with a monotonic deadline and broadcast wakeup
//! - Typed [`LinkEvent`](network::link::LinkEvent)s delivered over a channel
//! - Reconnect requests delegated to a pluggable [`NetworkDriver`](network::link::NetworkDriver)
//!
//! ### Application loop
//! - Bounded retry with exponential backoff instead of aborting
//! - A runner repeating one [`Operation`](network::application::Operation) per interval
//! - A raw HTTP GET operation over any [`Connect`](network::Connect) transport
//! - JSON telemetry by HTTP POST or MQTT 3.1.1 publish
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use netready::network::link::{ConnectionStateTracker, EventPump, LinkEvent};
//!
//! let tracker = Arc::new(ConnectionStateTracker::new());
//! let (events, pump) = EventPump::spawn(Arc::clone(&tracker)).unwrap();
//!
//! // Driver side
//! events.post(LinkEvent::Up).unwrap();
//! events.post(LinkEvent::Ipv4Obtained([192, 168, 1, 20].into())).unwrap();
//!
//! // Application side
//! assert!(tracker.wait_ready(Duration::from_secs(5)));
//!
//! drop(events);
//! pump.join().unwrap();
//! ```
//!
//! ## Optional Features
//!
//! - `std` (default): the blocking tracker, event pump and application loop
//! - `defmt`: `defmt::Format` implementations for errors and states
//!
//! Without `std` the crate is `no_std` and still provides the state types,
//! events, retry policy, configuration and the HTTP and MQTT clients.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

/// Network layer: readiness tracking, retry policy, transport traits and
/// the operations run over them.
pub mod network;

/// Application settings loaded from JSON.
pub mod config;

/// Wait / reconnect loop and the runner that repeats an operation.
#[cfg(feature = "std")]
pub mod app;
