//! Hand-off of work onto the UI context.
//!
//! Lifecycle and bridge state belong to the UI context. Anything running
//! elsewhere (engine callbacks on a worker thread, background fetches)
//! posts a closure here; the host drains the queue on the UI context
//! through [`Surface::run_pending_tasks`].

use tokio::sync::mpsc;
use tracing::debug;

use crate::render::RenderCallback;
use crate::surface::Surface;

/// Work to run against a surface on the UI context.
pub type UiTask = Box<dyn FnOnce(&mut Surface) + Send>;

/// Cloneable handle for posting [`UiTask`]s to one surface.
#[derive(Clone)]
pub struct UiTaskSender {
    tx: mpsc::UnboundedSender<UiTask>,
}

impl UiTaskSender {
    /// Queue `task`. Returns false once the surface is gone.
    pub fn post(&self, task: impl FnOnce(&mut Surface) + Send + 'static) -> bool {
        let sent = self.tx.send(Box::new(task)).is_ok();
        if !sent {
            debug!("UI task dropped: surface closed");
        }
        sent
    }

    /// Queue an engine callback for delivery on the UI context.
    pub fn post_callback(&self, callback: RenderCallback) -> bool {
        self.post(move |surface| surface.handle_callback(callback))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, owned by the surface.
pub(crate) struct UiTaskQueue {
    rx: mpsc::UnboundedReceiver<UiTask>,
    sender: UiTaskSender,
}

impl UiTaskQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rx,
            sender: UiTaskSender { tx },
        }
    }

    pub(crate) fn sender(&self) -> UiTaskSender {
        self.sender.clone()
    }

    pub(crate) fn try_next(&mut self) -> Option<UiTask> {
        self.rx.try_recv().ok()
    }

    /// Stop accepting tasks and drop whatever is still queued.
    pub(crate) fn close(&mut self) -> usize {
        self.rx.close();
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}
