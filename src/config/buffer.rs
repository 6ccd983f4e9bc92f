//! Versioned configuration snapshot with an applied-diff log.
//!
//! The host delivers `(snapshot, changed fields)` pairs. The buffer keeps
//! the latest snapshot, stamps each delivery with a version, and retains a
//! bounded history so diff sequences can be inspected after the fact.

use super::{CameraConfiguration, ChangedFields};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Default number of deliveries retained in the log.
pub const DEFAULT_LOG_CAPACITY: usize = 64;

/// One delivery as recorded in the log.
#[derive(Debug, Clone)]
pub struct AppliedDiff {
    /// Version assigned to the delivery (first delivery is 1).
    pub version: u64,
    /// Fields the host reported as changed.
    pub fields: ChangedFields,
    /// When the delivery was applied.
    pub applied_at: DateTime<Utc>,
}

/// Outcome of [`ConfigurationBuffer::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub version: u64,
    /// True for the first delivery, which completes the configuration.
    pub first: bool,
}

/// Accumulates configuration deliveries.
#[derive(Debug)]
pub struct ConfigurationBuffer {
    current: CameraConfiguration,
    version: u64,
    log: VecDeque<AppliedDiff>,
    log_capacity: usize,
}

impl ConfigurationBuffer {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            current: CameraConfiguration::default(),
            version: 0,
            log: VecDeque::with_capacity(log_capacity.min(DEFAULT_LOG_CAPACITY)),
            log_capacity,
        }
    }

    /// Replaces the snapshot and records the diff.
    pub fn apply(&mut self, changed: &ChangedFields, values: CameraConfiguration) -> Delivery {
        let first = self.version == 0;
        self.version += 1;
        self.current = values;

        if self.log_capacity > 0 {
            if self.log.len() == self.log_capacity {
                self.log.pop_front();
            }
            self.log.push_back(AppliedDiff {
                version: self.version,
                fields: changed.clone(),
                applied_at: Utc::now(),
            });
        }

        tracing::trace!(version = self.version, fields = changed.len(), first, "Configuration delivered");

        Delivery {
            version: self.version,
            first,
        }
    }

    /// Current snapshot.
    pub fn current(&self) -> &CameraConfiguration {
        &self.current
    }

    /// Number of deliveries applied so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// True once the first delivery arrived.
    pub fn is_delivered(&self) -> bool {
        self.version > 0
    }

    /// Retained deliveries, oldest first.
    pub fn log(&self) -> impl Iterator<Item = &AppliedDiff> {
        self.log.iter()
    }
}

impl Default for ConfigurationBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
