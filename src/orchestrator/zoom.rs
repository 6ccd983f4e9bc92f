//! Pinch-to-zoom gesture tracking.

/// Phase of a pinch gesture as reported by the recognizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinchPhase {
    Began,
    Changed(f64),
    Ended,
}

/// What the orchestrator should forward to the hardware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinchCommand {
    Start,
    Change(f64),
}

/// Tracks whether the recognizer is attached and a gesture is active.
#[derive(Debug, Default)]
pub struct ZoomGesture {
    attached: bool,
    active: bool,
}

impl ZoomGesture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches or detaches the recognizer. Returns true if the attachment
    /// changed. Detaching ends any gesture in flight.
    pub fn set_attached(&mut self, attached: bool) -> bool {
        if self.attached == attached {
            return false;
        }
        self.attached = attached;
        if !attached {
            self.active = false;
        }
        true
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Maps a recognizer phase to a hardware command, if any.
    pub fn handle(&mut self, phase: PinchPhase) -> Option<PinchCommand> {
        if !self.attached {
            return None;
        }
        match phase {
            PinchPhase::Began if !self.active => {
                self.active = true;
                Some(PinchCommand::Start)
            }
            PinchPhase::Began => None,
            PinchPhase::Changed(scale) if self.active => Some(PinchCommand::Change(scale)),
            PinchPhase::Changed(_) => None,
            PinchPhase::Ended => {
                self.active = false;
                None
            }
        }
    }
}
