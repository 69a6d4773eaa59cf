//! Feeds the lines of a text file through a bounded queue to one worker per
//! core.
//!
//! Usage: `cargo run --example line_feed -- <file>`

use blocking_queue_rs::{init_tracing, BlockingQueue, PopError};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;
use std::thread;

const QUEUE_CAPACITY: u32 = 10_000;

/// Placeholder per-line workload.
fn process(line: &str) -> usize {
    line.trim_end().len()
}

fn feed(queue: &BlockingQueue<String>, path: &str) -> io::Result<usize> {
    let reader = BufReader::new(File::open(path)?);
    let mut pushed = 0;
    for line in reader.lines() {
        let mut line = line?;
        loop {
            match queue.push(line) {
                Ok(()) => break,
                Err(e) if e.is_transient() => line = e.into_inner(),
                Err(_) => return Ok(pushed),
            }
        }
        pushed += 1;
    }
    Ok(pushed)
}

fn main() {
    init_tracing();

    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: line_feed <file>");
            std::process::exit(2);
        }
    };

    let queue = match BlockingQueue::<String>::new(QUEUE_CAPACITY) {
        Ok(queue) => Arc::new(queue),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let workers: Vec<_> = (0..num_cpus::get())
        .map(|_| {
            let q = Arc::clone(&queue);
            thread::spawn(move || {
                let (mut lines, mut bytes) = (0usize, 0usize);
                loop {
                    match q.pop() {
                        Ok(line) => {
                            bytes += process(&line);
                            lines += 1;
                        }
                        Err(PopError::Interrupted) => continue,
                        Err(_) => break,
                    }
                }
                (lines, bytes)
            })
        })
        .collect();

    let fed = feed(&queue, &path);
    // Always end the stream so workers exit, even if reading failed.
    queue.terminate();

    let mut total_lines = 0;
    let mut total_bytes = 0;
    for (i, worker) in workers.into_iter().enumerate() {
        let (lines, bytes) = worker.join().unwrap();
        println!("Worker {}: {} lines, {} bytes", i, lines, bytes);
        total_lines += lines;
        total_bytes += bytes;
    }

    let leftover = match Arc::try_unwrap(queue) {
        Ok(queue) => queue.destroy().len(),
        Err(_) => 0,
    };

    match fed {
        Ok(pushed) => {
            println!("Read {} lines from {}", pushed, path);
            println!("Processed {} lines ({} bytes), {} left unprocessed", total_lines, total_bytes, leftover);
        }
        Err(e) => {
            eprintln!("ERROR: reading {}: {}", path, e);
            std::process::exit(1);
        }
    }
}
