/*!
 * Signal Aggregation
 *
 * `of_all` fans many signals into one. Each member decrements a shared
 * countdown as it settles; the member that brings it to zero settles the
 * aggregate. Any failed member makes the aggregate fail.
 */

use super::signal::{CompletionSignal, Outcome};
use std::borrow::Borrow;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Countdown shared by the member callbacks of one aggregate
struct FanIn {
    remaining: AtomicUsize,
    failed: AtomicBool,
    aggregate: CompletionSignal,
}

impl FanIn {
    fn record(&self, outcome: Outcome) {
        if !outcome.is_success() {
            self.failed.store(true, Ordering::Relaxed);
        }

        // AcqRel chains every member's `failed` store into the last decrement
        let previous = self.remaining.fetch_sub(1, Ordering::AcqRel);
        trace!(remaining = previous - 1, "aggregate member settled");

        if previous == 1 {
            if self.failed.load(Ordering::Relaxed) {
                self.aggregate.fail();
            } else {
                self.aggregate.succeed();
            }
        }
    }
}

impl CompletionSignal {
    /// Signal that settles once every member has settled
    ///
    /// Succeeds only if every member succeeded. An empty collection yields a
    /// signal that has already succeeded.
    ///
    /// # Examples
    ///
    /// ```
    /// use completion_signal::CompletionSignal;
    ///
    /// let a = CompletionSignal::new();
    /// let b = CompletionSignal::new();
    /// let all = CompletionSignal::of_all([&a, &b]);
    ///
    /// a.succeed();
    /// assert!(!all.is_done());
    /// b.fail();
    /// assert!(all.is_done());
    /// assert!(!all.is_success());
    /// ```
    pub fn of_all<I>(signals: I) -> CompletionSignal
    where
        I: IntoIterator,
        I::Item: Borrow<CompletionSignal>,
    {
        let members: Vec<I::Item> = signals.into_iter().collect();
        if members.is_empty() {
            return CompletionSignal::of_success();
        }

        let aggregate = CompletionSignal::new();
        let fan_in = Arc::new(FanIn {
            remaining: AtomicUsize::new(members.len()),
            failed: AtomicBool::new(false),
            aggregate: aggregate.clone(),
        });

        for member in &members {
            let fan_in = Arc::clone(&fan_in);
            let member: &CompletionSignal = member.borrow();
            member.when_complete_with(move |outcome| fan_in.record(outcome));
        }

        aggregate
    }
}
