//! Correlates hardware capture events with their requests.
//!
//! Every in-flight still capture is stored under the id the hardware
//! issued for it. Events are routed by id; a terminal event removes the
//! entry, so each request sees exactly one terminal callback.
//!
//! Requests must be admitted in the order the hardware issued their ids.
//! An event for an id at or below the highest admitted one that is no
//! longer in flight is late and dropped. An event for a higher id is early
//! and parked until its request is admitted.

use super::CaptureError;
use crate::hardware::{CaptureEvent, Dimensions, RequestId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Most ids with parked events; the lowest is evicted past this.
const PARKED_LIMIT: usize = 16;

/// Image data delivered by a successful capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub image: Vec<u8>,
    pub thumbnail: Option<Vec<u8>>,
    pub dimensions: Dimensions,
}

/// Terminal continuation of a capture request.
pub type CaptureCompletion = Box<dyn FnOnce(Result<CapturedImage, CaptureError>) + Send>;

/// Continuations of one capture request.
pub struct CaptureRequest {
    on_will_capture: Arc<dyn Fn() + Send + Sync>,
    on_complete: CaptureCompletion,
}

impl CaptureRequest {
    pub fn new<W, C>(on_will_capture: W, on_complete: C) -> Self
    where
        W: Fn() + Send + Sync + 'static,
        C: FnOnce(Result<CapturedImage, CaptureError>) + Send + 'static,
    {
        Self {
            on_will_capture: Arc::new(on_will_capture),
            on_complete: Box::new(on_complete),
        }
    }

    /// Resolves a request that never reached the hardware.
    pub fn fail(self, err: CaptureError) {
        (self.on_complete)(Err(err));
    }
}

/// Where a registered request stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Pending,
    WillCapture,
}

struct Entry {
    state: CaptureState,
    request: CaptureRequest,
}

#[derive(Default)]
struct PipelineState {
    entries: HashMap<RequestId, Entry>,
    /// Events that arrived before their request was registered.
    parked: BTreeMap<RequestId, Vec<CaptureEvent>>,
    highest: Option<RequestId>,
    completed: u64,
}

/// Work to run once the pipeline lock is released.
enum Dispatch {
    WillCapture(Arc<dyn Fn() + Send + Sync>),
    Complete(CaptureCompletion, Result<CapturedImage, CaptureError>),
}

impl Dispatch {
    fn run(self) {
        match self {
            Dispatch::WillCapture(f) => f(),
            Dispatch::Complete(f, outcome) => f(outcome),
        }
    }
}

/// Table of in-flight capture requests.
#[derive(Default)]
pub struct CapturePipeline {
    state: Mutex<PipelineState>,
}

impl CapturePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the continuations for `id` and replays any events the
    /// hardware delivered before registration.
    pub fn register(&self, id: RequestId, request: CaptureRequest) {
        let parked = self.admit(id, request);
        self.replay(id, parked);
    }

    /// Registers the continuations for `id` without running anything.
    ///
    /// Returns the events parked for `id`, to be handed to
    /// [`CapturePipeline::replay`] once the caller released its own locks.
    /// Parked events for lower ids are discarded: their requests were
    /// never admitted and never will be.
    pub fn admit(&self, id: RequestId, request: CaptureRequest) -> Vec<CaptureEvent> {
        let (parked, stale) = {
            let mut state = self.lock();
            state.entries.insert(
                id,
                Entry {
                    state: CaptureState::Pending,
                    request,
                },
            );
            if state.highest.map_or(true, |highest| id > highest) {
                state.highest = Some(id);
            }
            let later = state.parked.split_off(&id);
            let stale = std::mem::replace(&mut state.parked, later);
            (state.parked.remove(&id).unwrap_or_default(), stale.len())
        };
        if stale > 0 {
            tracing::warn!(request = %id, stale, "Discarded events for requests never registered");
        }
        tracing::debug!(request = %id, replayed = parked.len(), "Capture request registered");
        parked
    }

    /// Routes events returned by [`CapturePipeline::admit`].
    pub fn replay(&self, id: RequestId, events: Vec<CaptureEvent>) {
        for event in events {
            self.handle(id, event);
        }
    }

    /// Drops every parked event. Called when issuing a capture failed, so
    /// anything the hardware sent for it can never be claimed.
    pub fn discard_parked(&self) {
        let discarded = std::mem::take(&mut self.lock().parked);
        if !discarded.is_empty() {
            tracing::warn!(requests = discarded.len(), "Discarded events for unissued capture");
        }
    }

    /// Routes a hardware event to the request it belongs to.
    pub fn handle(&self, id: RequestId, event: CaptureEvent) {
        let dispatch = {
            let mut state = self.lock();
            Self::route(&mut state, id, event)
        };
        if let Some(dispatch) = dispatch {
            dispatch.run();
        }
    }

    fn route(state: &mut PipelineState, id: RequestId, event: CaptureEvent) -> Option<Dispatch> {
        if !state.entries.contains_key(&id) {
            if state.highest.is_some_and(|highest| id <= highest) {
                tracing::warn!(request = %id, ?event, "Dropping event for resolved capture");
            } else {
                state.parked.entry(id).or_default().push(event);
                if state.parked.len() > PARKED_LIMIT {
                    if let Some((evicted, _)) = state.parked.pop_first() {
                        tracing::warn!(request = %evicted, "Parked capture events evicted");
                    }
                }
            }
            return None;
        }

        match event {
            CaptureEvent::WillCapture => {
                let entry = state.entries.get_mut(&id)?;
                if entry.state == CaptureState::WillCapture {
                    tracing::warn!(request = %id, "Duplicate will-capture ignored");
                    return None;
                }
                entry.state = CaptureState::WillCapture;
                Some(Dispatch::WillCapture(Arc::clone(&entry.request.on_will_capture)))
            }
            CaptureEvent::Succeeded {
                image,
                thumbnail,
                dimensions,
            } => {
                let entry = Self::resolve(state, id)?;
                Some(Dispatch::Complete(
                    entry.request.on_complete,
                    Ok(CapturedImage {
                        image,
                        thumbnail,
                        dimensions,
                    }),
                ))
            }
            CaptureEvent::Failed { message } => {
                let entry = Self::resolve(state, id)?;
                Some(Dispatch::Complete(
                    entry.request.on_complete,
                    Err(CaptureError::CaptureFailed(message)),
                ))
            }
        }
    }

    fn resolve(state: &mut PipelineState, id: RequestId) -> Option<Entry> {
        let entry = state.entries.remove(&id)?;
        state.completed += 1;
        Some(entry)
    }

    /// Current state of a registered request.
    pub fn state(&self, id: RequestId) -> Option<CaptureState> {
        self.lock().entries.get(&id).map(|e| e.state)
    }

    /// Number of requests awaiting a terminal event.
    pub fn in_flight(&self) -> usize {
        self.lock().entries.len()
    }

    /// Number of ids with events waiting for their request.
    pub fn parked(&self) -> usize {
        self.lock().parked.len()
    }

    /// Number of requests that reached a terminal event.
    pub fn completed(&self) -> u64 {
        self.lock().completed
    }

    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
