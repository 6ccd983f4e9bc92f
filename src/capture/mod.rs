//! Still capture coordination and persistence.

mod pipeline;
mod result;
mod storage;

pub use pipeline::{CaptureCompletion, CapturePipeline, CaptureRequest, CaptureState, CapturedImage};
pub use result::{CaptureError, CaptureResult};
pub use storage::{CaptureStorage, StorageError, StoredImage};
