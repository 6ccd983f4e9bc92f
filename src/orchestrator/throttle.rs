//! Barcode read throttling.
//!
//! The recognizer reports the same code many times per second. Only reads
//! at least one throttle interval after the last accepted read are
//! forwarded to the host.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counters kept by [`BarcodeThrottle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrottleStats {
    pub accepted: u64,
    pub throttled: u64,
}

/// Remembers when a read was last accepted.
#[derive(Debug, Default)]
pub struct BarcodeThrottle {
    last_accepted: Option<Instant>,
    stats: ThrottleStats,
}

impl BarcodeThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides whether a read at `now` is forwarded. Accepting updates the
    /// last-accepted time; rejecting changes nothing but the counter.
    pub fn offer(&mut self, now: Instant, interval: Duration) -> bool {
        let accept = match self.last_accepted {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= interval,
        };
        if accept {
            self.last_accepted = Some(now);
            self.stats.accepted += 1;
        } else {
            self.stats.throttled += 1;
        }
        accept
    }

    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }

    pub fn stats(&self) -> ThrottleStats {
        self.stats
    }
}
