use criterion::{BatchSize, Criterion, Throughput};
use netready::network::application::http::{Client, HttpTarget};
use netready::network::error::Error;
use netready::network::{Close, Connect, Connection, Read, Write};
use std::hint::black_box;

const RESPONSE_LEN: usize = 4096;

/// In-memory connection replaying a fixed response.
struct LoopbackConnection {
    response: &'static [u8],
    offset: usize,
}

impl Read for LoopbackConnection {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = &self.response[self.offset..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.offset += n;
        Ok(n)
    }
}

impl Write for LoopbackConnection {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for LoopbackConnection {
    type Error = Error;
    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for LoopbackConnection {}

struct Loopback {
    response: &'static [u8],
}

impl Connect for Loopback {
    type Connection = LoopbackConnection;
    type Error = Error;

    fn connect(&mut self, _remote: &str) -> Result<Self::Connection, Self::Error> {
        Ok(LoopbackConnection {
            response: self.response,
            offset: 0,
        })
    }
}

pub fn bench_get(c: &mut Criterion) {
    let response: &'static [u8] = Box::leak(vec![b'x'; RESPONSE_LEN].into_boxed_slice());
    let target = HttpTarget::default();

    let mut group = c.benchmark_group("http_get");
    group.throughput(Throughput::Bytes(RESPONSE_LEN as u64));
    group.bench_function("loopback_4k", |b| {
        b.iter_batched_ref(
            || Client::new(Loopback { response }),
            |client| {
                let mut sum = 0u64;
                let total = client
                    .get(&target, |chunk| sum += chunk.len() as u64)
                    .expect("Failed to GET");
                black_box((total, sum))
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}
