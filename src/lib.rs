/*!
 * Completion Signal Library
 *
 * Exactly-once success/failure cells for asynchronous operations:
 * - Settlement with first-writer-wins semantics
 * - Continuation callbacks, deferred or inline
 * - Fan-in aggregation over many signals
 * - Bounded, interruptible blocking joins
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::{SignalError, SignalResult};
pub use crate::core::sync::{
    CompletionSignal, Interrupt, JoinConfig, OnTimeout, Outcome, SpinWait, StrategyType,
};
pub use crate::monitoring::{init_tracing, try_init_tracing};
