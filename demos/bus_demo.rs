//! Bus Demo - three named entities race for the shared bus
//!
//! Every entity resolves the same bus instance at run time; their transfers
//! are serialized by the bus lock, so the whole run takes at least three
//! work units of wall-clock time.

use monobus::{Bus, BusConfig, Worker};
use std::time::{Duration, Instant};

fn main() {
    env_logger::init();

    // Configure the bus before any entity resolves it. If something beat us
    // to it, the existing instance wins and this configuration is dropped.
    let config = BusConfig {
        work_duration: Duration::from_millis(500),
    };
    if Bus::init_with(config).is_err() {
        eprintln!("bus already initialized, keeping existing configuration");
    }

    let started = Instant::now();

    let mut handles = Vec::new();
    for i in 0..3 {
        let mut entity = Worker::new("");
        entity.set_name(format!("Entity_{}", i));
        println!("{} begin to run...", entity.name());
        handles.push(entity.start());
    }

    for handle in handles {
        let name = handle.name().to_string();
        handle.join().expect("entity panicked");
        println!("{} completed", name);
    }

    println!("\nAll transfers done in {:?}:", started.elapsed());
    let bus = Bus::instance();
    for t in bus.transmissions() {
        println!(
            "  {:>10?}  {}",
            t.finished.duration_since(t.started),
            t.payload
        );
    }
    println!("Peak bus occupancy: {}", bus.peak_occupancy());

    Bus::verify_singleton().expect("more than one bus instance was constructed");
    println!("Singleton verified: one bus, serialized transfers.");
}
