//! Two-source readiness gate for session construction.
//!
//! The camera session may only be built once camera access is granted and
//! the first configuration has arrived. Either may happen first, on any
//! thread. Arming is a compare-and-set, so exactly one caller wins the
//! right to build the session no matter how the signals interleave.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Lifecycle of the hardware session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Waiting for one or both preconditions.
    Uninitialized = 0,
    /// A caller has claimed construction and is building the session.
    Armed = 1,
    /// The session was built.
    Initialized = 2,
    /// Construction was attempted and failed. There is no retry.
    Failed = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Uninitialized,
            1 => SessionState::Armed,
            2 => SessionState::Initialized,
            _ => SessionState::Failed,
        }
    }
}

/// Which precondition a caller is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    PermissionGranted,
    ConfigurationDelivered,
}

/// Readiness gate guarding one-time session construction.
#[derive(Debug)]
pub struct ReadinessGate {
    permission_granted: AtomicBool,
    configuration_delivered: AtomicBool,
    state: AtomicU8,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self {
            permission_granted: AtomicBool::new(false),
            configuration_delivered: AtomicBool::new(false),
            state: AtomicU8::new(SessionState::Uninitialized as u8),
        }
    }
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a precondition and tries to arm the gate.
    ///
    /// Returns true if the caller must now build the session and report
    /// the outcome with [`ReadinessGate::complete`].
    pub fn satisfy(&self, precondition: Precondition) -> bool {
        let flag = match precondition {
            Precondition::PermissionGranted => &self.permission_granted,
            Precondition::ConfigurationDelivered => &self.configuration_delivered,
        };
        flag.store(true, Ordering::SeqCst);
        self.try_arm()
    }

    /// Arms the gate iff both preconditions hold and nobody armed it yet.
    /// Safe to call any number of times.
    pub fn try_arm(&self) -> bool {
        if !self.permission_granted.load(Ordering::SeqCst)
            || !self.configuration_delivered.load(Ordering::SeqCst)
        {
            return false;
        }
        self.state
            .compare_exchange(
                SessionState::Uninitialized as u8,
                SessionState::Armed as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Records the outcome of construction after a successful arm.
    pub fn complete(&self, success: bool) {
        let next = if success {
            SessionState::Initialized
        } else {
            SessionState::Failed
        };
        let _ = self.state.compare_exchange(
            SessionState::Armed as u8,
            next as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_initialized(&self) -> bool {
        self.state() == SessionState::Initialized
    }

    pub fn permission_granted(&self) -> bool {
        self.permission_granted.load(Ordering::SeqCst)
    }

    pub fn configuration_delivered(&self) -> bool {
        self.configuration_delivered.load(Ordering::SeqCst)
    }
}
