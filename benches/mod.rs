use criterion::{criterion_group, criterion_main};

mod network;

criterion_group!(
    benches,
    network::link::tracker::bench_is_ready,
    network::link::tracker::bench_event_cycle,
    network::link::tracker::bench_dispatch_pending,
    network::application::http::client::bench_get
);
criterion_main!(benches);
