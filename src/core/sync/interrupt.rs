/*!
 * Join Interruption
 *
 * Cooperative interrupt token for threads blocked in
 * `CompletionSignal::join_interruptible`. Firing the token wakes every
 * registered waiter; each of them gives up and fails the signal it was
 * waiting on. The flag is sticky, so a join that starts after the token
 * fired returns at once.
 */

use super::signal::SignalInner;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

#[derive(Default)]
struct InterruptState {
    /// Signals with a thread currently parked on this token
    waiters: Vec<Weak<SignalInner>>,
}

#[derive(Default)]
struct InterruptInner {
    interrupted: AtomicBool,
    state: Mutex<InterruptState>,
}

/// Clonable interrupt handle shared between a waiting thread and whoever
/// may want to abort its wait
#[derive(Clone, Default)]
pub struct Interrupt {
    inner: Arc<InterruptInner>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the interrupt and wake every thread currently joining with it
    pub fn interrupt(&self) {
        let waiters = {
            let state = self.inner.state.lock();
            self.inner.interrupted.store(true, Ordering::Release);
            state.waiters.clone()
        };

        debug!(waiters = waiters.len(), "interrupting joins");

        for signal in waiters.iter().filter_map(Weak::upgrade) {
            signal.wake_waiters();
        }
    }

    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.inner.interrupted.load(Ordering::Acquire)
    }

    /// Reset the flag so the token can be reused for later joins
    pub fn clear(&self) {
        self.inner.interrupted.store(false, Ordering::Release);
    }

    /// Number of joins currently parked on this token (for diagnostics)
    pub fn waiter_count(&self) -> usize {
        self.inner.state.lock().waiters.len()
    }

    /// Register a signal whose waiters must be woken on interrupt
    ///
    /// Must be called before the waiter checks `is_interrupted` under the
    /// signal lock, otherwise a concurrent `interrupt` can be missed.
    pub(crate) fn register(&self, signal: &Arc<SignalInner>) -> InterruptRegistration<'_> {
        let weak = Arc::downgrade(signal);
        self.inner.state.lock().waiters.push(weak.clone());
        InterruptRegistration {
            interrupt: self,
            signal: weak,
        }
    }
}

impl std::fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interrupt")
            .field("interrupted", &self.is_interrupted())
            .finish_non_exhaustive()
    }
}

/// Removes the waiter entry when the join returns
pub(crate) struct InterruptRegistration<'a> {
    interrupt: &'a Interrupt,
    signal: Weak<SignalInner>,
}

impl Drop for InterruptRegistration<'_> {
    fn drop(&mut self) {
        let mut state = self.interrupt.inner.state.lock();
        if let Some(pos) = state
            .waiters
            .iter()
            .position(|w| Weak::ptr_eq(w, &self.signal))
        {
            state.waiters.swap_remove(pos);
        }
    }
}
