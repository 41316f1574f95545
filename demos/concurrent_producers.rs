//! Concurrent producers example
//!
//! Several threads log into a deliberately small pool. Lines never
//! interleave, producers never block, and whatever does not fit is counted
//! as dropped.
//!
//! Run with: cargo run --example concurrent_producers

use rda_log::prelude::*;
use rda_log::info;
use std::thread;
use std::time::Instant;

fn main() -> Result<()> {
    println!("=== rda_log - Concurrent Producers Example ===\n");

    let (sink, receiver) = ChannelSink::unbounded();
    let core = LoggingCore::builder()
        .buffer_count(8)
        .max_batch(4)
        .sink(sink)
        .try_build()?;

    let start = Instant::now();
    let producers: Vec<_> = (0..6)
        .map(|worker| {
            let core = core.clone();
            thread::spawn(move || {
                for job in 0..1_000 {
                    info!(core, "worker {} finished job {}", worker, job);
                }
            })
        })
        .collect();
    for producer in producers {
        if producer.join().is_err() {
            eprintln!("a producer panicked");
        }
    }
    let elapsed = start.elapsed();

    core.shutdown();
    let written = receiver.try_iter().count();

    let metrics = core.metrics();
    println!("Producers finished in {:?}", elapsed);
    println!("Lines written:     {}", written);
    println!("Messages dropped:  {}", metrics.dropped_count());
    println!("Pool exhaustions:  {}", metrics.exhaustion_events());
    println!("Drop rate:         {:.1}%", metrics.drop_rate());
    println!("\n{}", core.snapshot());

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
