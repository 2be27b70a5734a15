//! Workers - independently scheduled units that use the shared bus
//!
//! A worker carries a name and nothing else; it does not own the bus. When
//! started it runs on its own OS thread, resolves the process-wide bus
//! (constructing it if this is the first resolution anywhere), sends its
//! name as payload exactly once, and completes. Workers are not reused.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::trace;

use crate::bus::Bus;
use crate::error::{BusError, Result};

/// Worker lifecycle states
mod state {
    pub const CREATED: u8 = 0;
    pub const STARTED: u8 = 1;
    pub const RUNNING: u8 = 2;
    pub const COMPLETED: u8 = 3;
}

/// Observable lifecycle state of a worker.
///
/// Transitions are one-way: Created -> Started -> Running -> Completed.
/// There is no cancellation, pause, or retry; Completed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Created,
    Started,
    Running,
    Completed,
}

impl WorkerState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            state::CREATED => WorkerState::Created,
            state::STARTED => WorkerState::Started,
            state::RUNNING => WorkerState::Running,
            _ => WorkerState::Completed,
        }
    }
}

/// A not-yet-started worker
pub struct Worker {
    name: String,
    state: Arc<AtomicU8>,
}

impl Worker {
    /// Create a worker with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(AtomicU8::new(state::CREATED)),
        }
    }

    /// Rename the worker. Only meaningful before `start`.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The name this worker will send as payload
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> WorkerState {
        WorkerState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Schedule the worker for concurrent execution.
    ///
    /// Returns immediately; the returned handle is the only way to observe
    /// progress or wait for completion.
    pub fn start(self) -> WorkerHandle {
        let name = self.name.clone();
        let state = Arc::clone(&self.state);
        state.store(state::STARTED, Ordering::Release);

        let join = thread::spawn(move || self.run());

        WorkerHandle { name, state, join }
    }

    fn run(self) {
        self.state.store(state::RUNNING, Ordering::Release);
        trace!("worker {:?} resolving the shared bus", self.name);

        // Resolved here, at run time: the first worker to get this far
        // triggers construction, everyone else converges on its result.
        let bus = Bus::instance();
        bus.send_data(&self.name);

        self.state.store(state::COMPLETED, Ordering::Release);
        trace!("worker {:?} completed", self.name);
    }
}

/// Handle to a started worker
pub struct WorkerHandle {
    name: String,
    state: Arc<AtomicU8>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// The worker's name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> WorkerState {
        WorkerState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Whether the worker has reached its terminal state
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.state() == WorkerState::Completed
    }

    /// Wait for the worker to finish.
    ///
    /// A panic on the worker thread surfaces here; the bus lock itself is
    /// released by guard drop regardless.
    pub fn join(self) -> Result<()> {
        let WorkerHandle { name, join, .. } = self;
        join.join().map_err(|_| BusError::WorkerPanicked { name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusConfig;
    use std::time::{Duration, Instant};

    #[test]
    fn test_name_accessors() {
        let mut worker = Worker::new("first");
        assert_eq!(worker.name(), "first");

        worker.set_name("second");
        assert_eq!(worker.name(), "second");
    }

    #[test]
    fn test_state_machine_reaches_completed() {
        let worker = Worker::new("state_probe");
        assert_eq!(worker.state(), WorkerState::Created);

        let handle = worker.start();
        assert_ne!(handle.state(), WorkerState::Created);

        // Liveness: the worker reaches its terminal state on its own
        let deadline = Instant::now() + Duration::from_secs(10);
        while !handle.is_completed() {
            assert!(Instant::now() < deadline, "worker never completed");
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(handle.state(), WorkerState::Completed);
        handle.join().unwrap();
    }

    #[test]
    fn test_entities_serialize_on_the_shared_bus() {
        let work = BusConfig::default().work_duration;
        let started = Instant::now();

        let handles: Vec<WorkerHandle> = (0..3)
            .map(|i| Worker::new(format!("Entity_{}", i)).start())
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // Three transfers of one work unit each cannot complete in fewer
        // than three units; anything faster means the line was shared
        assert!(started.elapsed() >= work * 3);

        let log = Bus::instance().transmissions();
        for i in 0..3 {
            let name = format!("Entity_{}", i);
            let count = log.iter().filter(|t| t.payload == name).count();
            assert_eq!(count, 1, "expected exactly one transfer from {}", name);
        }
    }

    #[test]
    fn test_workers_converge_on_one_bus() {
        let before = Bus::instance() as *const Bus;

        let handles: Vec<WorkerHandle> = (0..4)
            .map(|i| Worker::new(format!("converge_{}", i)).start())
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let after = Bus::instance() as *const Bus;
        assert!(std::ptr::eq(before, after));
        Bus::verify_singleton().unwrap();
    }
}
