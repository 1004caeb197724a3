use std::sync::Arc;
use std::thread;
use std::time::Duration;

use netready::network::link::{
    ConnectionStateTracker, EventPump, IpFamily, LinkEvent, LinkState, PumpClosed,
};

mod common;
use common::{LOCAL_V4, LOCAL_V6, MockDriver};

#[test]
fn dispatch_pending_applies_queued_events_in_order() {
    let tracker = ConnectionStateTracker::new();
    let (events, receiver) = EventPump::channel();

    events.post(LinkEvent::Up).unwrap();
    events.post(LinkEvent::Ipv4Obtained(LOCAL_V4)).unwrap();
    events.post(LinkEvent::Down).unwrap();
    events.post(LinkEvent::Up).unwrap();

    // Nothing is applied until the loop turn.
    assert_eq!(tracker.state(), LinkState::Down);
    assert_eq!(receiver.dispatch_pending(&tracker), 4);
    assert_eq!(tracker.state(), LinkState::LinkUpNoIp);

    assert_eq!(receiver.dispatch_pending(&tracker), 0);
}

#[test]
fn post_fails_once_receiver_is_gone() {
    let (events, receiver) = EventPump::channel();
    drop(receiver);
    assert_eq!(events.post(LinkEvent::Up), Err(PumpClosed));
}

#[test]
fn spawned_pump_drives_tracker() {
    let tracker = Arc::new(ConnectionStateTracker::new());
    let (events, pump) = EventPump::spawn(Arc::clone(&tracker)).unwrap();

    let driver_events = events.clone();
    let driver = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        driver_events.post(LinkEvent::Up).unwrap();
        driver_events.post(LinkEvent::Ipv6Obtained(LOCAL_V6)).unwrap();
    });

    assert!(tracker.wait_ready_for(IpFamily::V6, Duration::from_secs(5)));
    driver.join().unwrap();

    drop(events);
    pump.join().unwrap();
}

#[test]
fn pump_drains_queue_before_exiting() {
    let tracker = Arc::new(ConnectionStateTracker::new());
    let (events, pump) = EventPump::spawn(Arc::clone(&tracker)).unwrap();

    events.post(LinkEvent::Up).unwrap();
    events.post(LinkEvent::Ipv4Obtained(LOCAL_V4)).unwrap();
    drop(events);
    pump.join().unwrap();

    assert!(tracker.is_ready());
}

#[test]
fn driver_reports_reconnect_through_pump() {
    let tracker = Arc::new(ConnectionStateTracker::new());
    let (events, pump) = EventPump::spawn(Arc::clone(&tracker)).unwrap();
    tracker.attach_driver(MockDriver::accepting().reporting_to(events));

    assert!(!tracker.wait_ready(Duration::from_millis(20)));
    tracker.request_reconnect().unwrap();
    assert!(tracker.wait_ready(Duration::from_secs(5)));

    // Dropping the driver drops the last sender.
    drop(tracker.detach_driver());
    pump.join().unwrap();
}
