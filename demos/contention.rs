//! Contention Stress Test
//!
//! Starts a fleet of workers in a tight loop so their threads race both the
//! first construction of the bus and the bus lock itself, then reports how
//! the run serialized.

use monobus::{Bus, BusConfig, Worker};
use std::time::{Duration, Instant};

const WORKERS: usize = 16;

fn main() {
    env_logger::init();

    let config = BusConfig {
        work_duration: Duration::from_millis(10),
    };
    if Bus::init_with(config).is_err() {
        eprintln!("bus already initialized, keeping existing configuration");
    }

    println!("Starting {} workers...", WORKERS);
    let started = Instant::now();

    let handles: Vec<_> = (0..WORKERS)
        .map(|i| Worker::new(format!("worker_{:02}", i)).start())
        .collect();

    for handle in handles {
        let name = handle.name().to_string();
        match handle.join() {
            Ok(()) => {}
            Err(e) => eprintln!("{}: {}", name, e),
        }
    }

    let elapsed = started.elapsed();
    let bus = Bus::instance();
    let log = bus.transmissions();

    let mut min = Duration::MAX;
    let mut max = Duration::ZERO;
    let mut total = Duration::ZERO;
    for t in &log {
        let held = t.finished.duration_since(t.started);
        min = min.min(held);
        max = max.max(held);
        total += held;
    }

    println!("\nResults:");
    println!("  Workers:        {}", WORKERS);
    println!("  Transfers:      {}", bus.transfer_count());
    println!("  Elapsed:        {:?}", elapsed);
    println!("  Lock held tot:  {:?}", total);
    if !log.is_empty() {
        println!("  Hold min/avg/max: {:?} / {:?} / {:?}", min, total / log.len() as u32, max);
    }
    println!("  Peak occupancy: {}", bus.peak_occupancy());
    println!("  Bus uptime:     {:?}", bus.uptime());

    assert_eq!(bus.peak_occupancy(), 1, "critical sections overlapped");
    Bus::verify_singleton().expect("more than one bus instance was constructed");
    println!("\nAll {} transfers serialized through one bus instance.", log.len());
}
