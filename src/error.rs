//! Error types for Monobus

use thiserror::Error;

/// Result type for Monobus operations
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors that can occur in Monobus operations
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus constructor ran more than once.
    ///
    /// This is a correctness bug, never a recoverable runtime condition:
    /// the initialization race was not closed.
    #[error("bus constructed {count} times; exactly one instance may exist")]
    DoubleConstruction { count: u32 },

    /// A configured initialization lost the first-resolution race
    #[error("bus already initialized; supplied configuration not applied")]
    AlreadyInitialized,

    /// A worker thread panicked before completing its transfer
    #[error("worker '{name}' panicked during run")]
    WorkerPanicked { name: String },
}
