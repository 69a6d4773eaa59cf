use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use blocking_queue_rs::BlockingQueue;
use std::sync::{Arc, Barrier};
use std::thread;

// Queue capacities for benchmarks
const CAPACITIES: [u32; 2] = [16, 1024];
// Number of operations per benchmark
const OPS_PER_BENCH: usize = 200_000;

fn run_mpmc(capacity: u32, threads: usize) {
    let queue = Arc::new(BlockingQueue::<u32>::new(capacity).unwrap());
    let barrier = Arc::new(Barrier::new(threads * 2));

    let mut handles = Vec::with_capacity(threads * 2);

    // Producers
    for _ in 0..threads {
        let q = queue.clone();
        let b = barrier.clone();
        handles.push(thread::spawn(move || {
            b.wait();
            for i in 0..(OPS_PER_BENCH / threads) {
                q.push(black_box(i as u32)).unwrap();
            }
        }));
    }

    // Consumers
    for _ in 0..threads {
        let q = queue.clone();
        let b = barrier.clone();
        handles.push(thread::spawn(move || {
            b.wait();
            for _ in 0..(OPS_PER_BENCH / threads) {
                black_box(q.pop().unwrap());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.throughput(Throughput::Elements(OPS_PER_BENCH as u64));
    group.sample_size(10);

    // Test different thread counts
    for threads in [1, 2, 4].iter() {
        // Skip configurations that would require more than available CPUs
        if *threads * 2 > num_cpus::get() {
            continue;
        }

        for capacity in CAPACITIES {
            group.bench_with_input(
                BenchmarkId::new(format!("BlockingQueue/{}", capacity), threads),
                threads,
                |b, &threads| b.iter(|| run_mpmc(capacity, threads)),
            );
        }
    }

    group.finish();
}

fn bench_try_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncontended");

    group.bench_function("try_push/try_pop", |b| {
        let q = BlockingQueue::<u32>::new(1024).unwrap();
        b.iter(|| {
            q.try_push(black_box(1)).unwrap();
            black_box(q.try_pop().unwrap());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_throughput, bench_try_ops);
criterion_main!(benches);
