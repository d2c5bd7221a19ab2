/*!
 * Adaptive Spin-Wait with Exponential Backoff
 *
 * Optimized for joins on signals that settle within microseconds. A join
 * spins here first and parks on the signal's condvar only if the signal is
 * still pending when the spin budget runs out.
 *
 * Three-phase backoff:
 *
 * 1. **Tight spin phase** (0-10 iterations): Just `spin_loop()` hint
 * 2. **Yield phase** (10-50 iterations): `yield_now()` every iteration
 * 3. **Sleep phase** (50+ iterations): Exponentially increasing sleep
 */

use std::thread;
use std::time::{Duration, Instant};

/// Adaptive spin-wait with exponential backoff
///
/// # Use Cases
///
/// Best for scenarios where:
/// - Settlement typically happens < 100µs after the join starts
/// - Low latency is critical
#[derive(Debug, Clone, Copy)]
pub struct SpinWait {
    /// Spin duration before falling back
    spin_duration: Duration,
    /// Maximum spin iterations
    max_spins: u32,
}

impl SpinWait {
    /// Create a new adaptive spin-wait
    pub fn new(spin_duration: Duration, max_spins: u32) -> Self {
        Self {
            spin_duration,
            max_spins,
        }
    }

    /// Create with default parameters (optimized for <100µs waits)
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_micros(50), 500)
    }

    /// Spin until `check` returns true or the spin budget is exhausted
    ///
    /// Returns true if `check` was satisfied, false if the caller should park
    pub fn spin(&self, check: impl Fn() -> bool) -> bool {
        let start = Instant::now();
        let mut spin_count = 0u32;
        let mut backoff_ns = 1u64;

        loop {
            if check() {
                return true;
            }

            if start.elapsed() >= self.spin_duration || spin_count >= self.max_spins {
                return false;
            }

            if spin_count < 10 {
                std::hint::spin_loop();
            } else if spin_count < 50 {
                thread::yield_now();
            } else {
                // Double backoff time each iteration, capped at 1ms
                thread::sleep(Duration::from_nanos(backoff_ns));
                backoff_ns = (backoff_ns * 2).min(1_000_000);
            }

            spin_count += 1;
        }
    }
}

impl Default for SpinWait {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_spin_gives_up_within_budget() {
        let sw = SpinWait::new(Duration::from_millis(5), u32::MAX);
        let start = Instant::now();

        assert!(!sw.spin(|| false));
        assert!(start.elapsed() >= Duration::from_millis(5));
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_spin_respects_max_spins() {
        let sw = SpinWait::new(Duration::from_secs(10), 20);
        let calls = AtomicU32::new(0);

        assert!(!sw.spin(|| {
            calls.fetch_add(1, Ordering::Relaxed);
            false
        }));
        // One check per iteration plus the final one
        assert_eq!(calls.load(Ordering::Relaxed), 21);
    }

    #[test]
    fn test_spin_sees_flag_from_other_thread() {
        let sw = SpinWait::new(Duration::from_secs(1), u32::MAX);
        let flag = Arc::new(AtomicBool::new(false));
        let flag_clone = flag.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            flag_clone.store(true, Ordering::Release);
        });

        assert!(sw.spin(|| flag.load(Ordering::Acquire)));
        handle.join().unwrap();
    }
}
