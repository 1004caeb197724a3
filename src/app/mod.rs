//! The application side of the readiness contract.
//!
//! [`ensure_ready`] is the wait / reconnect / back off loop every demo runs
//! before touching the network, with a bounded number of attempts instead of
//! aborting the process. [`Runner`] repeats an
//! [`Operation`](crate::network::application::Operation) forever, checking
//! readiness before each run.

use core::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::network::application::Operation;
use crate::network::link::{ConnectError, ConnectionStateTracker, IpFamily, WaitOutcome};
use crate::network::retry::RetryPolicy;

/// Something that can pause the calling thread.
pub trait Delay {
    /// Sleep for `duration`.
    fn delay(&mut self, duration: Duration);
}

/// [`Delay`] backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

impl<D: Delay + ?Sized> Delay for &mut D {
    fn delay(&mut self, duration: Duration) {
        (**self).delay(duration);
    }
}

/// The network could not be made ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyError {
    /// Every attempt timed out.
    Exhausted {
        /// Number of waits performed.
        attempts: u32,
    },
    /// Reconnecting is impossible (no driver attached).
    Reconnect(ConnectError),
    /// The tracker was shut down while waiting.
    Shutdown,
}

impl fmt::Display for ReadyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadyError::Exhausted { attempts } => {
                write!(f, "network not ready after {attempts} attempts")
            }
            ReadyError::Reconnect(e) => write!(f, "cannot reconnect: {e}"),
            ReadyError::Shutdown => f.write_str("connection tracker shut down"),
        }
    }
}

impl std::error::Error for ReadyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadyError::Reconnect(e) => Some(e),
            _ => None,
        }
    }
}

/// Waits for the network, reconnecting with backoff when it is slow.
///
/// Each attempt waits up to `timeout`. After a timed-out attempt other than
/// the last, a reconnect is requested and the policy's backoff delay applied
/// before the next attempt. A rejected reconnect is retried on the next
/// attempt; a missing driver ends the loop at once.
pub fn ensure_ready<D: Delay>(
    tracker: &ConnectionStateTracker,
    family: IpFamily,
    timeout: Duration,
    policy: &RetryPolicy,
    delay: &mut D,
) -> Result<(), ReadyError> {
    let mut backoff = policy.backoff();
    let mut attempts = 0;

    loop {
        attempts += 1;
        match tracker.wait(family, timeout) {
            WaitOutcome::Ready => {
                if attempts > 1 {
                    log::info!("network ready after {attempts} attempts");
                }
                return Ok(());
            }
            WaitOutcome::Shutdown => return Err(ReadyError::Shutdown),
            WaitOutcome::TimedOut => {}
        }

        if attempts >= policy.max_attempts {
            log::error!("giving up on network after {attempts} attempts");
            return Err(ReadyError::Exhausted { attempts });
        }
        log::warn!(
            "network not ready within {} ms (attempt {attempts}/{}), reconnecting",
            timeout.as_millis(),
            policy.max_attempts
        );

        match tracker.request_reconnect() {
            Ok(()) => {}
            Err(ConnectError::DriverUnavailable) => {
                log::error!("no network driver to reconnect with");
                return Err(ReadyError::Reconnect(ConnectError::DriverUnavailable));
            }
            Err(e @ ConnectError::DriverRejected(_)) => {
                log::warn!("reconnect failed: {e}");
            }
        }

        if let Some(pause) = backoff.next() {
            delay.delay(pause);
        }
    }
}

/// Parameters of the application loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Address family the operation needs.
    pub family: IpFamily,
    /// Per-attempt readiness timeout.
    pub connection_timeout: Duration,
    /// Reconnect policy.
    pub retry: RetryPolicy,
    /// Pause after each run.
    pub interval: Duration,
}

impl From<&Config> for RunnerConfig {
    fn from(config: &Config) -> Self {
        Self {
            family: config.network.ip_family,
            connection_timeout: config.network.connection_timeout(),
            retry: config.retry,
            interval: config.interval(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Failure of a single [`Runner::run_once`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError<E> {
    /// The network never became ready.
    NotReady(ReadyError),
    /// The operation itself failed.
    Operation(E),
}

impl<E: fmt::Debug> fmt::Display for RunError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::NotReady(e) => write!(f, "{e}"),
            RunError::Operation(e) => write!(f, "operation failed: {e:?}"),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for RunError<E> {}

/// Repeats an operation over a ready network.
#[derive(Debug)]
pub struct Runner<D: Delay = StdDelay> {
    tracker: Arc<ConnectionStateTracker>,
    config: RunnerConfig,
    delay: D,
}

impl Runner<StdDelay> {
    /// A runner sleeping on the current thread.
    pub fn new(tracker: Arc<ConnectionStateTracker>, config: RunnerConfig) -> Self {
        Self::with_delay(tracker, config, StdDelay)
    }
}

impl<D: Delay> Runner<D> {
    /// A runner using `delay` for backoff and interval pauses.
    pub fn with_delay(
        tracker: Arc<ConnectionStateTracker>,
        config: RunnerConfig,
        delay: D,
    ) -> Self {
        Self {
            tracker,
            config,
            delay,
        }
    }

    /// The shared tracker.
    pub fn tracker(&self) -> &Arc<ConnectionStateTracker> {
        &self.tracker
    }

    /// Loop parameters.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Ensures readiness, then performs `operation` once.
    pub fn run_once<O: Operation>(
        &mut self,
        operation: &mut O,
    ) -> Result<(), RunError<O::Error>> {
        ensure_ready(
            &self.tracker,
            self.config.family,
            self.config.connection_timeout,
            &self.config.retry,
            &mut self.delay,
        )
        .map_err(RunError::NotReady)?;
        operation.perform().map_err(RunError::Operation)
    }

    /// Runs `operation` every [`interval`](RunnerConfig::interval) until the
    /// network cannot be made ready, and returns why.
    ///
    /// A failed run is logged and does not stop the loop.
    pub fn run<O: Operation>(&mut self, operation: &mut O) -> ReadyError {
        loop {
            match self.run_once(operation) {
                Ok(()) => log::info!("{} succeeded", operation.name()),
                Err(RunError::Operation(e)) => log::error!("{} failed: {e:?}", operation.name()),
                Err(RunError::NotReady(e)) => {
                    log::error!("stopping {}: {e}", operation.name());
                    return e;
                }
            }
            self.delay.delay(self.config.interval);
        }
    }
}
