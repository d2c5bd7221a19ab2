/*!
 * Join Configuration
 *
 * Runtime configuration for how a blocked `join` waits and what it does
 * when it gives up.
 */

use crate::core::errors::{SignalError, SignalResult};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_STRATEGY: &str = "SIGNAL_JOIN_STRATEGY";
pub const ENV_SPIN_US: &str = "SIGNAL_JOIN_SPIN_US";
pub const ENV_MAX_SPINS: &str = "SIGNAL_JOIN_MAX_SPINS";
pub const ENV_ON_TIMEOUT: &str = "SIGNAL_JOIN_ON_TIMEOUT";

/// Strategy type selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyType {
    /// Park on the signal's condvar right away
    Condvar,
    /// Adaptive spin with backoff before parking (low-latency, high-CPU for short waits)
    SpinWait,
    /// Auto-select
    Auto,
}

impl FromStr for StrategyType {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "condvar" => Ok(Self::Condvar),
            "spin" | "spinwait" => Ok(Self::SpinWait),
            "auto" => Ok(Self::Auto),
            _ => Err(SignalError::invalid_config(ENV_STRATEGY, s)),
        }
    }
}

/// What a join does to a still-pending signal when its timeout elapses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnTimeout {
    /// Settle the signal as failed for every observer
    #[default]
    ForceFailure,
    /// Return to the caller and leave the signal pending
    LeavePending,
}

impl FromStr for OnTimeout {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" | "force_failure" => Ok(Self::ForceFailure),
            "pending" | "leave_pending" => Ok(Self::LeavePending),
            _ => Err(SignalError::invalid_config(ENV_ON_TIMEOUT, s)),
        }
    }
}

/// Join configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinConfig {
    /// Preferred strategy
    pub strategy: StrategyType,
    /// Spin duration before parking (for SpinWait)
    pub spin_duration: Duration,
    /// Maximum spin iterations before parking
    pub max_spins: u32,
    /// Timeout policy
    pub on_timeout: OnTimeout,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_duration: Duration::from_micros(10),
            max_spins: 100,
            on_timeout: OnTimeout::ForceFailure,
        }
    }
}

impl JoinConfig {
    /// Configuration optimized for low-latency (< 1ms settlement expected)
    pub const fn low_latency() -> Self {
        Self {
            strategy: StrategyType::SpinWait,
            spin_duration: Duration::from_micros(50),
            max_spins: 500,
            on_timeout: OnTimeout::ForceFailure,
        }
    }

    /// Configuration optimized for long waits (> 1ms expected)
    pub const fn long_wait() -> Self {
        Self {
            strategy: StrategyType::Condvar,
            spin_duration: Duration::from_micros(1),
            max_spins: 10,
            on_timeout: OnTimeout::ForceFailure,
        }
    }

    pub fn with_on_timeout(mut self, on_timeout: OnTimeout) -> Self {
        self.on_timeout = on_timeout;
        self
    }

    /// Load configuration from the environment
    ///
    /// Environment variables:
    /// - SIGNAL_JOIN_STRATEGY: condvar | spin | auto
    /// - SIGNAL_JOIN_SPIN_US: spin duration in microseconds
    /// - SIGNAL_JOIN_MAX_SPINS: spin iteration cap
    /// - SIGNAL_JOIN_ON_TIMEOUT: fail | pending
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> SignalResult<Self> {
        let mut config = Self::default();

        if let Some(strategy) = read_env::<StrategyType>(ENV_STRATEGY)? {
            config.strategy = strategy;
        }
        if let Some(micros) = read_env::<u64>(ENV_SPIN_US)? {
            config.spin_duration = Duration::from_micros(micros);
        }
        if let Some(max_spins) = read_env::<u32>(ENV_MAX_SPINS)? {
            config.max_spins = max_spins;
        }
        if let Some(on_timeout) = read_env::<OnTimeout>(ENV_ON_TIMEOUT)? {
            config.on_timeout = on_timeout;
        }

        Ok(config)
    }

    /// Select the strategy to actually use
    pub fn select_strategy(&self) -> StrategyType {
        match self.strategy {
            // Signals settle on other threads after real work; parking wins
            StrategyType::Auto => StrategyType::Condvar,
            other => other,
        }
    }
}

fn read_env<T: FromStr>(key: &str) -> SignalResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| SignalError::invalid_config(key, raw)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_resolves_to_condvar() {
        assert_eq!(
            JoinConfig::default().select_strategy(),
            StrategyType::Condvar
        );
        assert_eq!(
            JoinConfig::low_latency().select_strategy(),
            StrategyType::SpinWait
        );
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("Spin".parse::<StrategyType>(), Ok(StrategyType::SpinWait));
        assert_eq!(" condvar ".parse::<StrategyType>(), Ok(StrategyType::Condvar));
        assert!("futex".parse::<StrategyType>().is_err());
    }

    #[test]
    fn test_parse_on_timeout() {
        assert_eq!("fail".parse::<OnTimeout>(), Ok(OnTimeout::ForceFailure));
        assert_eq!("pending".parse::<OnTimeout>(), Ok(OnTimeout::LeavePending));
        assert!(matches!(
            "later".parse::<OnTimeout>(),
            Err(SignalError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_with_on_timeout() {
        let config = JoinConfig::long_wait().with_on_timeout(OnTimeout::LeavePending);
        assert_eq!(config.on_timeout, OnTimeout::LeavePending);
        assert_eq!(config.strategy, StrategyType::Condvar);
    }
}
