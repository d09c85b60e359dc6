//! Single-slot owner of the outstanding validation task.

use crate::engine::ValidationRequest;
use crate::session::Input;
use crate::validate::ValidationPort;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Owns at most one outstanding validation task.
///
/// The engine's `Resolving` phase blocks new submissions, so starting a
/// second task while one is active cannot happen through the dispatch loop;
/// the slot asserts that contract rather than handling it.
#[derive(Debug, Default)]
pub(crate) struct ValidationSlot {
    active: Option<JoinHandle<()>>,
}

impl ValidationSlot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Spawns the validation task for one request.
    ///
    /// The task runs the port's pipeline and delivers exactly one completion
    /// message, tagged with the request's instance id, into the dispatch
    /// queue, unless cancelled first, in which case it delivers none.
    pub(crate) fn start(
        &mut self,
        request: ValidationRequest,
        port: ValidationPort,
        tx: mpsc::UnboundedSender<Input>,
    ) {
        assert!(
            self.active.is_none(),
            "validation slot already occupied; the resolving phase must block submissions"
        );

        let handle = tokio::spawn(async move {
            let instance = *request.instance();
            let result = port.validate(&request).await;
            // Send failure means the session is gone; nothing to deliver to.
            let _ = tx.send(Input::Completion { instance, result });
        });
        self.active = Some(handle);
    }

    /// Aborts the outstanding task, if any.
    ///
    /// Abort is best-effort: a task that already sent its completion leaves
    /// a message in the queue, which the dispatch loop discards by instance
    /// tag.
    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            debug!("Cancelling outstanding validation");
            handle.abort();
        }
    }

    /// Releases the slot after the active task's completion was delivered.
    pub(crate) fn finish(&mut self) {
        self.active = None;
    }
}
