use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use queue_relay::{BoundedQueue, SessionBuilder, Sink};
use std::thread;

const ITEMS: u64 = 10_000;

fn benchmark_spsc_raw_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc_raw_queue");
    group.throughput(Throughput::Elements(ITEMS));

    for capacity in [1usize, 16, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &cap| {
            b.iter(|| {
                let queue = BoundedQueue::new(cap).expect("Queue failed");
                let producer_queue = queue.clone();
                let producer = thread::spawn(move || {
                    for i in 0..ITEMS {
                        producer_queue.put(black_box(i));
                    }
                });

                let mut sum = 0u64;
                for _ in 0..ITEMS {
                    sum += queue.take();
                }
                producer.join().expect("Producer panicked");
                black_box(sum)
            });
        });
    }

    group.finish();
}

fn benchmark_session_round_trip(c: &mut Criterion) {
    let source: Vec<u64> = (0..ITEMS).collect();
    let mut group = c.benchmark_group("session_round_trip");
    group.throughput(Throughput::Elements(ITEMS));

    group.bench_function("capacity_64", |b| {
        b.iter(|| {
            let report = SessionBuilder::new(64)
                .add_producer("P1", source.clone())
                .add_consumer("C1", Sink::new(), Some(source.len()))
                .build()
                .expect("Build failed")
                .start()
                .expect("Start failed")
                .wait();
            black_box(report.consumed())
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_spsc_raw_queue, benchmark_session_round_trip);
criterion_main!(benches);
