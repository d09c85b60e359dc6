//! The event dispatch loop and the published snapshot.
//!
//! A [`Session`] owns the authoritative `(phase, context)` pair. Any number
//! of callers hold cloned [`SessionHandle`]s and act only by
//! submitting [`Event`]s and reading [`Snapshot`]s. Events and internal
//! validation completions share one queue and are processed strictly one at
//! a time; the snapshot is republished after every processed input.

use crate::context::Context;
use crate::engine::{Engine, Phase};
use crate::event::Event;
use crate::puzzle::PuzzleSource;
use crate::slot::ValidationSlot;
use crate::validate::{ValidationError, ValidationOutcome, ValidationPort};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument};

/// One input to the dispatch loop: an external event or an internal
/// validation completion.
#[derive(Debug)]
pub(crate) enum Input {
    /// An event submitted through a handle.
    Event(Event),
    /// A completion delivered by the validation task.
    Completion {
        /// Instance tag carried by the originating request.
        instance: u64,
        /// Outcome of the validation pipeline.
        result: Result<ValidationOutcome, ValidationError>,
    },
}

/// Read-only view of the session state after the most recently processed
/// input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Snapshot {
    /// Number of inputs fully processed so far.
    seq: u64,
    /// Current engine phase.
    phase: Phase,
    /// Current game context.
    context: Context,
}

/// The session this handle belonged to has shut down.
#[derive(Debug, Clone, Copy, Display, Error)]
#[display("Session closed")]
pub struct SessionClosed;

/// A caller's handle to a running session.
///
/// Cheap to clone; the UI and the agent each hold one.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Input>,
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl SessionHandle {
    /// Submits an event for processing.
    ///
    /// Returns immediately; the effect becomes observable through the
    /// snapshot once the event has been processed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session task has shut down.
    pub fn submit(&self, event: Event) -> Result<(), SessionClosed> {
        self.tx.send(Input::Event(event)).map_err(|_| SessionClosed)
    }

    /// Returns the snapshot after the most recently processed input.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Returns a receiver that yields a change notification for every
    /// republished snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// Waits until no validation is outstanding and returns that snapshot.
    ///
    /// Convenience for callers that want the session idle; the core
    /// contract itself has no blocking wait.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session task shuts down first.
    pub async fn settled(&self) -> Result<Snapshot, SessionClosed> {
        let mut rx = self.snapshot_rx.clone();
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if *snapshot.phase() == Phase::Accepting {
                return Ok(snapshot);
            }
            rx.changed().await.map_err(|_| SessionClosed)?;
        }
    }

    /// Submits an event and waits until it has been processed and any
    /// validation it started has resolved, then returns that snapshot.
    ///
    /// With several callers submitting concurrently this may also cover
    /// their inputs; the returned snapshot is still the authoritative state
    /// at that point.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session task shuts down first.
    pub async fn submit_and_settle(&self, event: Event) -> Result<Snapshot, SessionClosed> {
        let mut rx = self.snapshot_rx.clone();
        let sent_at = *rx.borrow_and_update().seq();
        self.tx.send(Input::Event(event)).map_err(|_| SessionClosed)?;
        loop {
            rx.changed().await.map_err(|_| SessionClosed)?;
            let snapshot = rx.borrow_and_update().clone();
            if *snapshot.seq() > sent_at && *snapshot.phase() == Phase::Accepting {
                return Ok(snapshot);
            }
        }
    }
}

/// A running puzzle session.
#[derive(Debug)]
pub struct Session;

impl Session {
    /// Spawns the dispatch loop for a new session and returns a handle to
    /// it.
    ///
    /// The loop runs until every handle (and any in-flight validation) has
    /// been dropped.
    #[instrument(skip(source, port))]
    pub fn spawn(source: Arc<dyn PuzzleSource>, port: ValidationPort) -> SessionHandle {
        let engine = Engine::new(source);
        let context = engine.initial_context();
        info!(puzzle_index = context.puzzle_index(), "Starting session");

        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot {
            seq: 0,
            phase: Phase::Accepting,
            context: context.clone(),
        });

        // The loop keeps only a weak sender, so the queue closes (and the
        // loop exits) once all handles are gone.
        let weak_tx = tx.downgrade();
        tokio::spawn(run(engine, port, context, rx, weak_tx, snapshot_tx));

        SessionHandle { tx, snapshot_rx }
    }
}

async fn run(
    engine: Engine,
    port: ValidationPort,
    context: Context,
    mut rx: mpsc::UnboundedReceiver<Input>,
    weak_tx: mpsc::WeakUnboundedSender<Input>,
    snapshot_tx: watch::Sender<Snapshot>,
) {
    let mut phase = Phase::Accepting;
    let mut context = context;
    let mut seq: u64 = 0;
    let mut instance: u64 = 0;
    let mut slot = ValidationSlot::new();

    while let Some(input) = rx.recv().await {
        match input {
            Input::Event(event) => {
                if matches!(event, Event::AdvancePuzzle) {
                    // Cancel eagerly; the instance bump below makes any
                    // completion already in the queue recognizably stale.
                    slot.cancel();
                    instance += 1;
                }

                let step = engine.apply(phase, context, &event, instance);
                phase = step.phase;
                context = step.context;

                if let Some(request) = step.request {
                    match weak_tx.upgrade() {
                        Some(tx) => slot.start(request, port.clone(), tx),
                        None => {
                            // All handles gone; nothing will ever observe
                            // the outcome.
                            debug!("Skipping validation; session is shutting down");
                            phase = Phase::Accepting;
                        }
                    }
                }
            }
            Input::Completion {
                instance: tag,
                result,
            } => {
                if tag != instance {
                    debug!(tag, instance, "Discarding stale validation completion");
                } else {
                    slot.finish();
                    context = engine.resolve(context, result);
                    phase = Phase::Accepting;
                }
            }
        }

        seq += 1;
        snapshot_tx.send_replace(Snapshot {
            seq,
            phase,
            context: context.clone(),
        });
    }

    debug!("All handles dropped; dispatch loop exiting");
}
