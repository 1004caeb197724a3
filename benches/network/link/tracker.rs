use criterion::{BatchSize, Criterion, Throughput};
use netready::network::link::{ConnectionStateTracker, EventPump, IpFamily, LinkEvent};
use std::hint::black_box;
use std::net::Ipv4Addr;

const ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 20);

pub fn bench_is_ready(c: &mut Criterion) {
    let tracker = ConnectionStateTracker::new();
    tracker.on_link_up();
    tracker.on_ipv4_obtained();

    let mut group = c.benchmark_group("is_ready");
    group.bench_function("any", |b| b.iter(|| black_box(tracker.is_ready())));
    group.bench_function("v6", |b| {
        b.iter(|| black_box(tracker.is_ready_for(black_box(IpFamily::V6))))
    });
    group.finish();
}

pub fn bench_event_cycle(c: &mut Criterion) {
    let tracker = ConnectionStateTracker::new();
    let cycle = [
        LinkEvent::Up,
        LinkEvent::Ipv4Obtained(ADDRESS),
        LinkEvent::Down,
    ];

    let mut group = c.benchmark_group("event_cycle");
    group.throughput(Throughput::Elements(cycle.len() as u64));
    group.bench_function("up_ip_down", |b| {
        b.iter(|| {
            for event in cycle {
                tracker.apply(black_box(event));
            }
        })
    });
    group.finish();
}

pub fn bench_dispatch_pending(c: &mut Criterion) {
    const QUEUED: usize = 64;
    let tracker = ConnectionStateTracker::new();

    let mut group = c.benchmark_group("dispatch_pending");
    group.throughput(Throughput::Elements(QUEUED as u64));
    group.bench_function("queued_64", |b| {
        b.iter_batched(
            || {
                let (events, receiver) = EventPump::channel();
                for i in 0..QUEUED {
                    let event = if i % 2 == 0 {
                        LinkEvent::Up
                    } else {
                        LinkEvent::Ipv4Obtained(ADDRESS)
                    };
                    events.post(event).expect("receiver alive");
                }
                (events, receiver)
            },
            |(_events, receiver)| black_box(receiver.dispatch_pending(&tracker)),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}
