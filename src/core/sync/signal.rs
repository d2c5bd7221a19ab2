/*!
 * Completion Signal
 *
 * A shared, exactly-once-settlable outcome cell for an asynchronous
 * operation. Producers settle it with `succeed`/`fail`, consumers observe it,
 * register continuations, or block on it with a bounded `join`.
 *
 * # Design: One Lock for Commit and Drain
 *
 * The outcome and the callback list live behind a single `parking_lot::Mutex`.
 * Settling commits the outcome and takes the callback list in the same
 * critical section, so a registration either lands in the list that gets
 * drained or observes the terminal outcome and runs inline. Callbacks run
 * after the lock is released, which lets a callback register further
 * callbacks on the same signal.
 *
 * The committed outcome is mirrored into an atomic so `is_done`/`is_success`
 * never take the lock.
 */

use super::config::{JoinConfig, OnTimeout, StrategyType};
use super::interrupt::Interrupt;
use super::spinwait::SpinWait;
use crate::core::errors::{SignalError, SignalResult};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

/// Outcome of a completion signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Outcome {
    Pending = 0,
    Succeeded = 1,
    Failed = 2,
}

impl Outcome {
    #[inline(always)]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Pending)
    }

    #[inline(always)]
    pub const fn is_success(self) -> bool {
        matches!(self, Outcome::Succeeded)
    }

    #[inline(always)]
    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Outcome::Succeeded,
            2 => Outcome::Failed,
            _ => Outcome::Pending,
        }
    }
}

type Callback = Box<dyn FnOnce(Outcome) + Send + 'static>;

struct SignalState {
    outcome: Outcome,
    callbacks: Vec<Callback>,
}

pub(crate) struct SignalInner {
    state: Mutex<SignalState>,
    /// Mirror of `state.outcome`, written only while `state` is locked
    outcome: AtomicU8,
    settled: Condvar,
    config: JoinConfig,
}

impl SignalInner {
    /// Wake every thread parked in a join on this signal
    pub(crate) fn wake_waiters(&self) {
        // Taking the lock orders us after any waiter that is between its
        // predicate check and parking
        let _state = self.state.lock();
        self.settled.notify_all();
    }
}

/// Why a blocking wait returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitExit {
    Settled,
    TimedOut,
    Interrupted,
}

/// Shared handle to a completion signal
///
/// Cloning is cheap and every clone refers to the same underlying cell.
///
/// # Examples
///
/// ```
/// use completion_signal::CompletionSignal;
/// use std::time::Duration;
///
/// let signal = CompletionSignal::new();
/// let producer = signal.clone();
///
/// std::thread::spawn(move || {
///     producer.succeed();
/// });
///
/// assert!(signal.join(Duration::from_secs(5)).is_success());
/// ```
#[derive(Clone)]
pub struct CompletionSignal {
    inner: Arc<SignalInner>,
}

impl CompletionSignal {
    /// Create a pending signal with the default join configuration
    pub fn new() -> Self {
        Self::with_config(JoinConfig::default())
    }

    /// Create a pending signal with a custom join configuration
    pub fn with_config(config: JoinConfig) -> Self {
        Self::from_parts(Outcome::Pending, config)
    }

    /// Create a signal that has already succeeded
    pub fn of_success() -> Self {
        Self::from_parts(Outcome::Succeeded, JoinConfig::default())
    }

    /// Create a signal that has already failed
    pub fn of_failure() -> Self {
        Self::from_parts(Outcome::Failed, JoinConfig::default())
    }

    fn from_parts(outcome: Outcome, config: JoinConfig) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                state: Mutex::new(SignalState {
                    outcome,
                    callbacks: Vec::new(),
                }),
                outcome: AtomicU8::new(outcome as u8),
                settled: Condvar::new(),
                config,
            }),
        }
    }

    /// Settle as succeeded; no-op if already settled
    pub fn succeed(&self) -> &Self {
        self.commit(Outcome::Succeeded);
        self
    }

    /// Settle as failed; no-op if already settled
    pub fn fail(&self) -> &Self {
        self.commit(Outcome::Failed);
        self
    }

    /// Settle with the given outcome
    ///
    /// Returns true if this call performed the transition. `Pending` is
    /// ignored and returns false.
    pub fn settle(&self, outcome: Outcome) -> bool {
        outcome.is_terminal() && self.commit(outcome)
    }

    /// True once the signal has settled either way
    #[inline]
    pub fn is_done(&self) -> bool {
        self.outcome().is_terminal()
    }

    /// True only if the signal settled as succeeded
    #[inline]
    pub fn is_success(&self) -> bool {
        self.outcome().is_success()
    }

    /// Current outcome, without blocking
    #[inline]
    pub fn outcome(&self) -> Outcome {
        Outcome::from_raw(self.inner.outcome.load(Ordering::Acquire))
    }

    /// Run `action` once the signal settles
    ///
    /// A pending signal defers `action` to the settling thread. A settled
    /// signal runs it right here, before returning.
    pub fn when_complete<F>(&self, action: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.when_complete_with(move |_| action())
    }

    /// Like [`when_complete`](Self::when_complete), but `action` receives the
    /// terminal outcome
    pub fn when_complete_with<F>(&self, action: F) -> &Self
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        // Fast path: already settled, no lock needed
        let outcome = self.outcome();
        if outcome.is_terminal() {
            run_callback(Box::new(action), outcome);
            return self;
        }

        let outcome = {
            let mut state = self.inner.state.lock();
            if !state.outcome.is_terminal() {
                state.callbacks.push(Box::new(action));
                trace!(
                    pending_callbacks = state.callbacks.len(),
                    "callback deferred until settlement"
                );
                return self;
            }
            state.outcome
        };

        run_callback(Box::new(action), outcome);
        self
    }

    /// Number of callbacks waiting for settlement (for diagnostics)
    pub fn pending_callbacks(&self) -> usize {
        self.inner.state.lock().callbacks.len()
    }

    /// True if both handles refer to the same signal
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Join configuration this signal was created with
    pub fn config(&self) -> &JoinConfig {
        &self.inner.config
    }

    /// Block until the signal settles or `timeout` elapses
    ///
    /// If the timeout elapses first, the signal is settled as failed for
    /// every observer (unless configured with [`OnTimeout::LeavePending`]).
    /// Returns immediately if the signal has already settled.
    pub fn join(&self, timeout: Duration) -> &Self {
        let exit = self.wait_for_settlement(timeout, None);
        self.give_up(exit, timeout);
        self
    }

    /// Join with a signed millisecond timeout
    ///
    /// Negative timeouts are rejected.
    pub fn try_join(&self, timeout_ms: i64) -> SignalResult<&Self> {
        let millis =
            u64::try_from(timeout_ms).map_err(|_| SignalError::NegativeTimeout(timeout_ms))?;
        Ok(self.join(Duration::from_millis(millis)))
    }

    /// Join that also returns early when `interrupt` fires
    ///
    /// An interrupted join always settles the signal as failed. The
    /// interruption itself is not reported; callers observe it through the
    /// signal's outcome.
    pub fn join_interruptible(&self, timeout: Duration, interrupt: &Interrupt) -> &Self {
        let exit = self.wait_for_settlement(timeout, Some(interrupt));
        self.give_up(exit, timeout);
        self
    }

    /// Commit a terminal outcome and run the drained callbacks
    ///
    /// Returns false if the signal was already settled.
    fn commit(&self, outcome: Outcome) -> bool {
        debug_assert!(outcome.is_terminal());

        let callbacks = {
            let mut state = self.inner.state.lock();
            if state.outcome.is_terminal() {
                trace!(
                    current = ?state.outcome,
                    ignored = ?outcome,
                    "signal already settled"
                );
                return false;
            }
            state.outcome = outcome;
            self.inner.outcome.store(outcome as u8, Ordering::Release);
            std::mem::take(&mut state.callbacks)
        };

        self.inner.settled.notify_all();

        debug!(
            outcome = ?outcome,
            callbacks = callbacks.len(),
            "completion signal settled"
        );

        for callback in callbacks {
            run_callback(callback, outcome);
        }
        true
    }

    fn wait_for_settlement(&self, timeout: Duration, interrupt: Option<&Interrupt>) -> WaitExit {
        if self.is_done() {
            return WaitExit::Settled;
        }

        // Overflowing deadline means wait without bound
        let deadline = Instant::now().checked_add(timeout);
        let interrupted = || interrupt.is_some_and(Interrupt::is_interrupted);
        let expired = || deadline.is_some_and(|d| Instant::now() >= d);

        if self.inner.config.select_strategy() == StrategyType::SpinWait {
            let spinner = SpinWait::new(self.inner.config.spin_duration, self.inner.config.max_spins);
            spinner.spin(|| self.is_done() || interrupted() || expired());
        }

        let _registration = interrupt.map(|token| token.register(&self.inner));
        let mut state = self.inner.state.lock();

        loop {
            if state.outcome.is_terminal() {
                return WaitExit::Settled;
            }
            if interrupted() {
                return WaitExit::Interrupted;
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return WaitExit::TimedOut;
                    }
                    self.inner.settled.wait_until(&mut state, deadline);
                }
                None => self.inner.settled.wait(&mut state),
            }
        }
    }

    fn give_up(&self, exit: WaitExit, timeout: Duration) {
        match exit {
            WaitExit::Settled => {}
            WaitExit::TimedOut => match self.inner.config.on_timeout {
                OnTimeout::ForceFailure => {
                    if self.commit(Outcome::Failed) {
                        warn!(
                            timeout_ms = timeout.as_millis() as u64,
                            "join timed out, signal forced to failed"
                        );
                    }
                }
                OnTimeout::LeavePending => {
                    debug!(
                        timeout_ms = timeout.as_millis() as u64,
                        "join timed out, signal left pending"
                    );
                }
            },
            WaitExit::Interrupted => {
                if self.commit(Outcome::Failed) {
                    debug!("join interrupted, signal forced to failed");
                }
            }
        }
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("outcome", &self.outcome())
            .finish_non_exhaustive()
    }
}

/// Run one callback, containing any panic so later callbacks still run
fn run_callback(callback: Callback, outcome: Outcome) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || callback(outcome))) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(outcome = ?outcome, panic = %message, "completion callback panicked");
    }
}
