//! Application settings.
//!
//! Settings are read from a small JSON document so they can be baked into
//! flash or loaded from a file on a host:
//!
//! ```json
//! {
//!   "network": { "connection_timeout_ms": 10000, "ip_family": "v4" },
//!   "retry": { "max_attempts": 5, "initial_delay_ms": 500 },
//!   "http": { "host": "example.com", "port": 80, "path": "/" },
//!   "mqtt": { "host": "demo.thingsboard.io", "username": "TOKEN", "qos": 1 },
//!   "interval_ms": 5000
//! }
//! ```
//!
//! Every field is optional; missing fields keep their defaults.

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::network::application::http::HttpTarget;
use crate::network::application::mqtt::MqttSettings;
use crate::network::link::IpFamily;
use crate::network::retry::{PolicyError, RetryPolicy};

/// How long to wait for the network and which address family is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Time allowed for link and address before a reconnect is requested.
    pub connection_timeout_ms: u32,
    /// Address family the application needs.
    pub ip_family: IpFamily,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connection_timeout_ms: 10_000,
            ip_family: IpFamily::Any,
        }
    }
}

impl NetworkConfig {
    /// [`connection_timeout_ms`](Self::connection_timeout_ms) as a [`Duration`].
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.connection_timeout_ms))
    }
}

/// Full application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network readiness settings.
    pub network: NetworkConfig,
    /// Reconnect policy.
    pub retry: RetryPolicy,
    /// Target of the HTTP operations.
    pub http: HttpTarget,
    /// Broker and topic of the MQTT publish operation.
    pub mqtt: MqttSettings,
    /// Pause between consecutive operations.
    pub interval_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            retry: RetryPolicy::default(),
            http: HttpTarget::default(),
            mqtt: MqttSettings::default(),
            interval_ms: 5_000,
        }
    }
}

/// Configuration could not be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The document is not valid JSON for [`Config`].
    Parse,
    /// A value is out of range; the message names the field.
    Invalid(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse => f.write_str("malformed configuration"),
            Error::Invalid(what) => write!(f, "invalid configuration: {what}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<PolicyError> for Error {
    fn from(e: PolicyError) -> Self {
        match e {
            PolicyError::NoAttempts => Error::Invalid("retry.max_attempts must be at least 1"),
            PolicyError::ZeroMultiplier => Error::Invalid("retry.multiplier must be at least 1"),
        }
    }
}

impl Config {
    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let (config, _) = serde_json_core::from_str::<Config>(json).map_err(|e| {
            log::warn!("configuration rejected: {e:?}");
            Error::Parse
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), Error> {
        if self.http.host.is_empty() {
            return Err(Error::Invalid("http.host must not be empty"));
        }
        if self.http.port == 0 {
            return Err(Error::Invalid("http.port must not be 0"));
        }
        if !self.http.path.starts_with('/') {
            return Err(Error::Invalid("http.path must start with '/'"));
        }
        if self.mqtt.host.is_empty() {
            return Err(Error::Invalid("mqtt.host must not be empty"));
        }
        if self.mqtt.port == 0 {
            return Err(Error::Invalid("mqtt.port must not be 0"));
        }
        if self.mqtt.topic.is_empty() || self.mqtt.topic.contains(['+', '#']) {
            return Err(Error::Invalid("mqtt.topic must be a non-empty name without wildcards"));
        }
        if self.mqtt.qos > 1 {
            return Err(Error::Invalid("mqtt.qos must be 0 or 1"));
        }
        self.retry.validate()?;
        Ok(())
    }

    /// [`interval_ms`](Self::interval_ms) as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.interval_ms))
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Parse => defmt::write!(f, "Parse"),
            Error::Invalid(what) => defmt::write!(f, "Invalid({=str})", what),
        }
    }
}
