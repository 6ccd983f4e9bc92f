//! Execution contexts.
//!
//! The orchestrator separates work that must run on the UI-owning thread
//! (shutter animation, overlay toggles) from blocking work (file writes).
//! A [`Dispatcher`] decides where each runs.

/// Unit of work handed to a dispatcher.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Schedules work on the UI context or a background worker.
pub trait Dispatcher: Send + Sync {
    fn run_on_ui(&self, task: Task);

    fn run_in_background(&self, task: Task);
}

/// Runs every task immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn run_on_ui(&self, task: Task) {
        task();
    }

    fn run_in_background(&self, task: Task) {
        task();
    }
}

#[cfg(feature = "runtime")]
pub use self::tokio_dispatch::{TokioDispatcher, UiQueue};

#[cfg(feature = "runtime")]
mod tokio_dispatch {
    use super::{Dispatcher, Task};
    use tokio::runtime::Handle;
    use tokio::sync::mpsc;

    /// Background work on tokio's blocking pool; UI work queued for the
    /// host's UI loop.
    #[derive(Clone)]
    pub struct TokioDispatcher {
        handle: Handle,
        ui: mpsc::UnboundedSender<Task>,
    }

    /// Receiving end of UI tasks, drained on the UI thread.
    pub struct UiQueue {
        rx: mpsc::UnboundedReceiver<Task>,
    }

    impl TokioDispatcher {
        /// Creates a dispatcher bound to `handle` plus its UI queue.
        pub fn new(handle: Handle) -> (Self, UiQueue) {
            let (ui, rx) = mpsc::unbounded_channel();
            (Self { handle, ui }, UiQueue { rx })
        }
    }

    impl Dispatcher for TokioDispatcher {
        fn run_on_ui(&self, task: Task) {
            if self.ui.send(task).is_err() {
                tracing::warn!("UI queue closed, dropping task");
            }
        }

        fn run_in_background(&self, task: Task) {
            self.handle.spawn_blocking(task);
        }
    }

    impl UiQueue {
        /// Runs every queued task without waiting. Returns how many ran.
        pub fn run_pending(&mut self) -> usize {
            let mut ran = 0;
            while let Ok(task) = self.rx.try_recv() {
                task();
                ran += 1;
            }
            ran
        }

        /// Waits for the next task and runs it. Returns false once every
        /// dispatcher has been dropped.
        pub async fn run_next(&mut self) -> bool {
            match self.rx.recv().await {
                Some(task) => {
                    task();
                    true
                }
                None => false,
            }
        }
    }
}
