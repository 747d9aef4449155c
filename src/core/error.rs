//! Error types for scheduler operations.
//!
//! Only failures at the edge of the scheduler are recoverable errors. Broken
//! scheduling invariants (negative token counts, a monitor released by a
//! thread that does not hold it, waiting outside a logical thread) panic.

use thiserror::Error;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The OS refused to create the thread backing a logical thread.
    #[error("failed to spawn thread `{name}`: {source}")]
    Spawn {
        /// Name of the logical thread.
        name: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// A logical thread's body panicked.
    #[error("thread `{0}` panicked")]
    ThreadPanicked(String),
    /// The timer lane was started twice.
    #[error("interrupt timer already running")]
    TimerRunning,
    /// The kernel is shutting down and accepts no new threads.
    #[error("kernel is shutting down")]
    ShuttingDown,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
