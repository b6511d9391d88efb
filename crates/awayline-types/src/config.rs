//! Gateway configuration types.
//!
//! `GatewayConfig` represents the top-level `awayline.toml` that controls
//! startup reconciliation, pairing timeouts, and broadcast capacity.

use serde::{Deserialize, Serialize};

use std::time::Duration;

/// Top-level configuration for the Awayline gateway.
///
/// All fields have sensible defaults; a missing or empty file yields a
/// fully working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Startup reconciliation retry policy.
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Pairing-phase limits.
    #[serde(default)]
    pub pairing: PairingConfig,

    /// Broadcast channel capacity before slow subscribers start lagging.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
    256
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            reconcile: ReconcileConfig::default(),
            pairing: PairingConfig::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Retry policy for the startup sweep that reconnects sessions still marked
/// active in the store.
///
/// Attempts are 1-based. `max_attempts = None` retries until the store
/// answers; a bounded policy gives up after the configured count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Upper bound on sweep attempts; absent means retry forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Delay before the second attempt.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    /// Growth factor applied to the delay after each failed attempt.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Ceiling the growing delay never exceeds.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

fn default_initial_delay_secs() -> u64 {
    5
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay_secs() -> u64 {
    60
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_delay_secs: default_initial_delay_secs(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl ReconcileConfig {
    /// Whether another attempt is allowed after `attempt` failures.
    ///
    /// `attempt` is 1-based (first execution is attempt 1).
    pub fn should_retry(&self, attempt: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempt < max,
            None => true,
        }
    }

    /// Delay to sleep after failed attempt number `attempt` (1-based).
    ///
    /// Grows geometrically from `initial_delay_secs` and never exceeds
    /// `max_delay_secs`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let raw = self.initial_delay_secs as f64 * self.backoff_multiplier.powi(exponent);
        let capped = raw.min(self.max_delay_secs as f64).max(0.0);
        Duration::from_secs_f64(capped)
    }
}

/// Limits on the pairing phase of a freshly started session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingConfig {
    /// Seconds a session may sit unpaired before it is torn down.
    /// Zero disables the timeout.
    #[serde(default = "default_pairing_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_pairing_timeout_secs() -> u64 {
    120
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_pairing_timeout_secs(),
        }
    }
}

impl PairingConfig {
    /// The timeout as a `Duration`, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}
