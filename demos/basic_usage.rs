//! Basic logging core usage example
//!
//! Demonstrates level filtering, runtime threshold changes, truncation and
//! pool introspection with the stderr sink.
//!
//! Run with: cargo run --example basic_usage

use rda_log::prelude::*;
use rda_log::{always, debug, error, info, verbose, warn};

fn main() -> Result<()> {
    println!("=== rda_log - Basic Usage Example ===\n");

    // Small buffers so truncation is easy to see
    let core = LoggingCore::builder()
        .buffer_size(96)
        .buffer_count(4)
        .min_level(LogLevel::Info)
        .sink(StderrSink::new())
        .try_build()?;
    let _guard = core.shutdown_guard();

    core.debug_dump("Pool before the first message:");

    println!("1. Logging at different levels (threshold Info):");
    always!(core, "This is an always message");
    error!(core, "This is an error message");
    warn!(core, "This is a warning message");
    info!(core, "This is an info message");
    verbose!(core, "This verbose message is filtered");
    debug!(core, "Debug builds only: {}", cfg!(debug_assertions));

    println!("\n2. Raising the threshold to Verbose:");
    core.set_level(LogLevel::Verbose);
    verbose!(core, "Verbose message (visible)");

    println!("\n3. An oversized message is cut to fit its buffer:");
    info!(core, "{}", "long ".repeat(40));

    core.shutdown();
    core.debug_dump("Pool after shutdown:");

    let metrics = core.metrics();
    println!(
        "\nWritten: {}, dropped: {}, truncated: {}",
        metrics.total_logged(),
        metrics.dropped_count(),
        metrics.truncated_count()
    );
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
