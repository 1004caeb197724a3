use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use netready::app::{ReadyError, RunError, Runner, RunnerConfig, ensure_ready};
use netready::config::Config;
use netready::network::application::Operation;
use netready::network::link::{ConnectError, ConnectionStateTracker, EventPump, IpFamily};
use netready::network::retry::RetryPolicy;

mod common;
use common::{MockDriver, RecordingDelay};

const SHORT: Duration = Duration::from_millis(10);

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay_ms: 100,
        max_delay_ms: 1_000,
        multiplier: 2,
    }
}

fn quick_config(max_attempts: u32) -> RunnerConfig {
    RunnerConfig {
        family: IpFamily::Any,
        connection_timeout: SHORT,
        retry: policy(max_attempts),
        interval: Duration::from_millis(250),
    }
}

#[test]
fn ready_network_needs_no_reconnect() {
    let driver = MockDriver::accepting();
    let calls = driver.calls();
    let tracker = ConnectionStateTracker::with_driver(driver);
    tracker.on_link_up();
    tracker.on_ipv4_obtained();

    let mut delay = RecordingDelay::default();
    ensure_ready(&tracker, IpFamily::Any, SHORT, &policy(3), &mut delay).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(delay.delays.is_empty());
}

#[test]
fn rejecting_driver_exhausts_attempts_with_backoff() {
    let driver = MockDriver::rejecting(-1);
    let calls = driver.calls();
    let tracker = ConnectionStateTracker::with_driver(driver);

    let mut delay = RecordingDelay::default();
    let result = ensure_ready(&tracker, IpFamily::Any, SHORT, &policy(4), &mut delay);

    assert_eq!(result, Err(ReadyError::Exhausted { attempts: 4 }));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        delay.delays,
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(400)
        ]
    );
}

#[test]
fn missing_driver_fails_without_backoff() {
    let tracker = ConnectionStateTracker::new();
    let mut delay = RecordingDelay::default();
    let result = ensure_ready(&tracker, IpFamily::Any, SHORT, &policy(5), &mut delay);

    assert_eq!(
        result,
        Err(ReadyError::Reconnect(ConnectError::DriverUnavailable))
    );
    assert!(delay.delays.is_empty());
}

#[test]
fn reconnect_brings_network_up() {
    let tracker = Arc::new(ConnectionStateTracker::new());
    let (events, pump) = EventPump::spawn(Arc::clone(&tracker)).unwrap();
    let driver = MockDriver::accepting().reporting_to(events);
    let calls = driver.calls();
    tracker.attach_driver(driver);

    // The first wait times out, the reconnect reports link and address, and
    // the second wait sees them.
    let mut delay = RecordingDelay::default();
    let result = ensure_ready(
        &tracker,
        IpFamily::V4,
        Duration::from_millis(200),
        &policy(3),
        &mut delay,
    );

    assert_eq!(result, Ok(()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(delay.delays, vec![Duration::from_millis(100)]);

    drop(tracker.detach_driver());
    pump.join().unwrap();
}

#[test]
fn shutdown_ends_the_wait_loop() {
    let tracker = Arc::new(ConnectionStateTracker::with_driver(MockDriver::accepting()));
    let stopper = {
        let tracker = Arc::clone(&tracker);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            tracker.shutdown();
        })
    };

    let start = Instant::now();
    let mut delay = RecordingDelay::default();
    let result = ensure_ready(
        &tracker,
        IpFamily::Any,
        Duration::from_secs(30),
        &policy(3),
        &mut delay,
    );
    stopper.join().unwrap();

    assert_eq!(result, Err(ReadyError::Shutdown));
    assert!(start.elapsed() < Duration::from_secs(10));
}

/// Fails every other run; on the fourth run takes the link down and shuts
/// the tracker down, which ends the loop.
struct Flaky {
    tracker: Arc<ConnectionStateTracker>,
    runs: u32,
}

impl Operation for Flaky {
    type Error = &'static str;

    fn name(&self) -> &str {
        "flaky"
    }

    fn perform(&mut self) -> Result<(), Self::Error> {
        self.runs += 1;
        if self.runs == 4 {
            self.tracker.on_link_down();
            self.tracker.shutdown();
        }
        if self.runs % 2 == 0 {
            Err("boom")
        } else {
            Ok(())
        }
    }
}

#[test]
fn runner_survives_operation_failures() {
    let tracker = Arc::new(ConnectionStateTracker::with_driver(MockDriver::accepting()));
    tracker.on_link_up();
    tracker.on_ipv4_obtained();

    let mut op = Flaky {
        tracker: Arc::clone(&tracker),
        runs: 0,
    };
    let mut runner = Runner::with_delay(
        Arc::clone(&tracker),
        quick_config(3),
        RecordingDelay::default(),
    );

    assert_eq!(runner.run(&mut op), ReadyError::Shutdown);
    assert_eq!(op.runs, 4);
    assert!(runner.tracker().is_shut_down());
    assert_eq!(runner.config().interval, Duration::from_millis(250));
}

#[test]
fn run_once_reports_not_ready() {
    let tracker = Arc::new(ConnectionStateTracker::with_driver(MockDriver::rejecting(3)));
    let mut op = Flaky {
        tracker: Arc::clone(&tracker),
        runs: 0,
    };
    let mut runner = Runner::with_delay(tracker, quick_config(2), RecordingDelay::default());

    assert_eq!(
        runner.run_once(&mut op),
        Err(RunError::NotReady(ReadyError::Exhausted { attempts: 2 }))
    );
    assert_eq!(op.runs, 0);
}

#[test]
fn runner_config_follows_config() {
    let config = Config::from_json(
        r#"{"network": {"connection_timeout_ms": 2500, "ip_family": "v4"}, "interval_ms": 750}"#,
    )
    .unwrap();
    let runner_config = RunnerConfig::from(&config);
    assert_eq!(runner_config.family, IpFamily::V4);
    assert_eq!(runner_config.connection_timeout, Duration::from_millis(2500));
    assert_eq!(runner_config.interval, Duration::from_millis(750));
    assert_eq!(runner_config.retry, RetryPolicy::default());
}
