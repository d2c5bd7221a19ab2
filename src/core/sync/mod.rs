/*!
 * Synchronization Primitives
 *
 * Completion signals: exactly-once outcome cells that producers settle and
 * consumers observe, chain callbacks onto, aggregate, or block on.
 *
 * # Architecture
 *
 * - `signal`: the outcome cell, callback list and bounded join
 * - `aggregate`: counter-based fan-in over many signals
 * - `interrupt`: cooperative abort for blocked joins
 * - `spinwait`: optional adaptive spin before a join parks
 *
 * # Use Cases
 *
 * - **Exporters**: report when an asynchronous flush or shutdown finished
 * - **Fan-out work**: wait for every sub-operation through one signal
 * - **Shutdown**: bound how long a caller blocks on outstanding work
 */

mod aggregate;
mod config;
mod interrupt;
mod signal;
mod spinwait;

pub use config::{
    JoinConfig, OnTimeout, StrategyType, ENV_MAX_SPINS, ENV_ON_TIMEOUT, ENV_SPIN_US, ENV_STRATEGY,
};
pub use interrupt::Interrupt;
pub use signal::{CompletionSignal, Outcome};
pub use spinwait::SpinWait;
