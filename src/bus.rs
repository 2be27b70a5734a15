//! The shared bus - a process-wide resource with serialized access
//!
//! Exactly one `Bus` exists per process, reachable through [`Bus::instance`].
//! It is constructed lazily by whichever caller resolves it first; every
//! later caller converges on the same instance. `send_data` is the single
//! serialized operation: transfers from any number of workers never overlap
//! in time.

use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace};
use parking_lot::Mutex;

use crate::error::{BusError, Result};
use crate::once::SharedOnce;

/// Default simulated transfer time per payload
const DEFAULT_WORK_DURATION: Duration = Duration::from_millis(100);

/// Bus configuration
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// How long the bus holds the line for each transfer.
    ///
    /// Stand-in for real exclusive use of the medium; tests set this to
    /// zero or a few milliseconds to control timing deterministically.
    pub work_duration: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            work_duration: DEFAULT_WORK_DURATION,
        }
    }
}

/// One completed transfer, as recorded by the bus
#[derive(Debug, Clone)]
pub struct Transmission {
    /// The payload that was sent
    pub payload: String,
    /// When the transfer entered the critical section
    pub started: Instant,
    /// When the transfer left the critical section
    pub finished: Instant,
}

/// The process-wide shared bus.
///
/// The internal mutex is fixed at construction and guards both the line
/// and the transmission log; the log is only ever mutated while the line
/// is held.
pub struct Bus {
    config: BusConfig,
    epoch: Instant,
    /// The line itself. Holding this guard IS occupying the bus.
    line: Mutex<Vec<Transmission>>,
    occupancy: AtomicU32,
    peak_occupancy: AtomicU32,
}

static BUS: SharedOnce<Bus> = SharedOnce::new(Bus::default_instance);

impl Bus {
    fn default_instance() -> Bus {
        Bus::with_config(BusConfig::default())
    }

    /// Create a standalone bus with the given configuration.
    ///
    /// Standalone buses are not the process-wide instance; they exist for
    /// tests and benchmarks that need their own timing.
    pub fn with_config(config: BusConfig) -> Bus {
        Bus {
            config,
            epoch: Instant::now(),
            line: Mutex::new(Vec::new()),
            occupancy: AtomicU32::new(0),
            peak_occupancy: AtomicU32::new(0),
        }
    }

    /// Get the process-wide bus, constructing it on first resolution.
    ///
    /// Concurrent first callers are strictly ordered: one constructs, the
    /// rest observe the published instance. Every call returns the same
    /// reference for the lifetime of the process.
    #[inline]
    pub fn instance() -> &'static Bus {
        BUS.get()
    }

    /// Initialize the process-wide bus with an explicit configuration.
    ///
    /// First resolution wins: if the instance already exists (constructed
    /// by an earlier `instance` or `init_with` call), the supplied
    /// configuration is discarded and `AlreadyInitialized` is returned.
    pub fn init_with(config: BusConfig) -> Result<&'static Bus> {
        let mut fresh = false;
        let bus = BUS.get_or_init_with(|| {
            fresh = true;
            Bus::with_config(config)
        });
        if fresh {
            Ok(bus)
        } else {
            Err(BusError::AlreadyInitialized)
        }
    }

    /// Check that the process-wide bus was constructed at most once.
    ///
    /// A count above one is fatal: the initialization race was not closed.
    pub fn verify_singleton() -> Result<()> {
        match BUS.constructions() {
            0 | 1 => Ok(()),
            count => Err(BusError::DoubleConstruction { count }),
        }
    }

    /// Send a payload over the bus.
    ///
    /// Blocks until the line is free, occupies it for the configured work
    /// duration, records the transfer, and releases on every exit path via
    /// guard drop. Transfers from any two callers never overlap.
    pub fn send_data(&self, payload: &str) {
        trace!("payload {:?} waiting for the bus", payload);
        let mut line = self.line.lock();

        let occupied = self.occupancy.fetch_add(1, Ordering::AcqRel) + 1;
        self.note_occupancy(occupied);
        debug_assert_eq!(occupied, 1, "bus critical section entered concurrently");

        let started = Instant::now();
        if !self.config.work_duration.is_zero() {
            thread::sleep(self.config.work_duration);
        }
        let finished = Instant::now();
        debug!("sending signal data {:?}", payload);

        line.push(Transmission {
            payload: payload.to_string(),
            started,
            finished,
        });

        self.occupancy.fetch_sub(1, Ordering::AcqRel);
    }

    /// Snapshot of all transfers recorded so far, in completion order
    pub fn transmissions(&self) -> Vec<Transmission> {
        self.line.lock().clone()
    }

    /// Number of transfers recorded so far
    #[inline]
    pub fn transfer_count(&self) -> usize {
        self.line.lock().len()
    }

    /// Highest number of callers ever observed inside the critical
    /// section at once. Anything above 1 means serialization failed.
    #[inline]
    pub fn peak_occupancy(&self) -> u32 {
        self.peak_occupancy.load(Ordering::Acquire)
    }

    /// Time since this bus was constructed
    #[inline]
    pub fn uptime(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn note_occupancy(&self, occupied: u32) {
        let mut peak = self.peak_occupancy.load(Ordering::Relaxed);
        while occupied > peak {
            match self.peak_occupancy.compare_exchange_weak(
                peak,
                occupied,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }
}
