use blocking_queue_rs::{init_tracing, BlockingQueue, PopError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

fn main() {
    init_tracing();

    println!("BlockingQueue Rust Example");
    println!("--------------------------\n");

    // Configuration
    const PRODUCERS: usize = 1; // Number of producer threads
    const CONSUMERS: usize = 2; // Number of consumer threads
    const N: u32 = 1_000_000; // Each producer pushes this many elements into the queue
    const CAPACITY: u32 = 1024; // Queue capacity

    // Create a queue object shared between all producers and consumers
    let queue = match BlockingQueue::<u32>::new(CAPACITY) {
        Ok(queue) => Arc::new(queue),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("Starting {} producers and {} consumers", PRODUCERS, CONSUMERS);
    println!("Each producer will push {} elements", N);
    println!("Queue capacity: {}\n", CAPACITY);

    let start_time = Instant::now();

    // Start the consumers
    let sums = Arc::new(Mutex::new(vec![0u64; CONSUMERS]));
    let mut consumer_threads = Vec::with_capacity(CONSUMERS);

    for i in 0..CONSUMERS {
        let q = queue.clone();
        let sums = sums.clone();
        consumer_threads.push(thread::spawn(move || {
            let mut local_sum = 0u64;

            // Keep popping until the queue is terminated and drained
            loop {
                match q.pop() {
                    Ok(n) => local_sum += n as u64,
                    Err(PopError::Interrupted) => continue,
                    Err(_) => break,
                }
            }

            // Update the global sum array (only once to avoid contention)
            let mut sums = sums.lock().unwrap();
            sums[i] = local_sum;
        }));
    }

    // Start the producers
    let mut producer_threads = Vec::with_capacity(PRODUCERS);

    for _ in 0..PRODUCERS {
        let q = queue.clone();
        producer_threads.push(thread::spawn(move || {
            // Push elements in descending order [N, 1]
            for n in (1..=N).rev() {
                if q.push(n).is_err() {
                    break;
                }
            }
        }));
    }

    // Wait for all producers to finish
    for handle in producer_threads {
        handle.join().unwrap();
    }

    // Tell consumers to stop once everything buffered has been taken
    queue.terminate();

    // Wait for all consumers to finish
    for handle in consumer_threads {
        handle.join().unwrap();
    }

    // Calculate and verify the total sum
    let sums = sums.lock().unwrap();
    let total_sum: u64 = sums.iter().sum();

    // The expected sum is N*(N+1)/2 * PRODUCERS
    let expected_sum: u64 = (N as u64 * (N as u64 + 1) / 2) * PRODUCERS as u64;

    println!("Execution time: {:?}", start_time.elapsed());
    println!("Total sum: {}", total_sum);
    println!("Expected sum: {}", expected_sum);

    // Verify the result
    if total_sum != expected_sum {
        println!("ERROR: Sum mismatch! Difference: {}", total_sum as i64 - expected_sum as i64);
    } else {
        println!("SUCCESS: All elements were correctly processed.");
    }

    // Show per-consumer stats
    println!("\nPer-consumer statistics:");
    for (i, &sum) in sums.iter().enumerate() {
        println!("Consumer {}: sum = {}", i, sum);
        if sum == 0 {
            println!("WARNING: Consumer {} received no elements!", i);
        }
    }
}
