//! Monobus - one shared bus, many concurrent workers
//!
//! This library provides a lazily-initialized, process-wide shared bus and
//! the workers that compete for it.
//!
//! # Architecture
//!
//! - **Bus**: the single shared resource; `send_data` is its one serialized
//!   operation, transfers never overlap in time
//! - **Workers**: independently scheduled threads that each resolve the same
//!   bus instance and send their name over it once
//!
//! # Guarantees
//!
//! - First resolution constructs the bus exactly once, even under races
//! - Critical sections are mutually exclusive; occupancy never exceeds 1
//! - Transfer order is whatever lock-acquisition order happens to be

pub mod bus;
pub mod error;
pub mod once;
pub mod worker;

pub use bus::{Bus, BusConfig, Transmission};
pub use error::{BusError, Result};
pub use once::SharedOnce;
pub use worker::{Worker, WorkerHandle, WorkerState};
