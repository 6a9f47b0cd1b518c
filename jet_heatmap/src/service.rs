// THEORY:
// `HeatmapService` is the message-passing alternative to the registry's mutex. A
// single actor task owns one `Session` outright; every request reaches it through an
// `mpsc` channel and is answered on a `oneshot` channel. Because only the actor
// ever touches the session, requests from any number of cloned handles are applied
// strictly one at a time, in the order the actor receives them.
//
// The handle is cheap to clone. The actor stops when it receives `Shutdown` or
// when every handle has been dropped.
//
// Painting, and above all the final blur, is CPU work. Each cell is therefore
// handed to the blocking pool together with the session and the session comes
// back with the result, so the runtime's workers never run a blur. If that work
// panics the session is lost and the actor stops; pending requests then fail with
// `ServiceClosed`.
//
// `spawn` must be called from within a tokio runtime.

use crate::error::{HeatmapError, Result};
use crate::session::{CellInfo, CellReport, HeatmapSettings, Session, SessionPhase};
use image::RgbImage;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

const MAILBOX_CAPACITY: usize = 64;

/// Message type for the session actor.
enum SessionMessage {
    Cell(CellInfo, Box<HeatmapSettings>, oneshot::Sender<Result<CellReport>>),
    Reset(oneshot::Sender<()>),
    Status(oneshot::Sender<SessionStatus>),
    Heatmap(oneshot::Sender<Option<Arc<RgbImage>>>),
    Shutdown,
}

/// Snapshot of the actor's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub received: usize,
    pub expected: usize,
}

/// Cloneable handle to a session owned by an actor task.
#[derive(Clone)]
pub struct HeatmapService {
    sender: mpsc::Sender<SessionMessage>,
}

impl HeatmapService {
    /// Spawns an actor task that owns `session`.
    pub fn spawn(session: Session) -> Self {
        let (sender, mut receiver) = mpsc::channel::<SessionMessage>(MAILBOX_CAPACITY);

        tokio::spawn(async move {
            let mut session = session;

            while let Some(message) = receiver.recv().await {
                match message {
                    SessionMessage::Cell(cell, settings, reply) => {
                        let mut owned = session;
                        let work = tokio::task::spawn_blocking(move || {
                            let result = owned.handle_cell(cell, &settings);
                            (owned, result)
                        });
                        match work.await {
                            Ok((returned, result)) => {
                                session = returned;
                                let _ = reply.send(result);
                            }
                            Err(err) => {
                                tracing::error!("session task failed: {err}");
                                break;
                            }
                        }
                    }
                    SessionMessage::Reset(reply) => {
                        session.reset();
                        let _ = reply.send(());
                    }
                    SessionMessage::Status(reply) => {
                        let (received, expected) = session.progress();
                        let _ = reply.send(SessionStatus {
                            phase: session.phase(),
                            received,
                            expected,
                        });
                    }
                    SessionMessage::Heatmap(reply) => {
                        let _ = reply.send(session.shared_heatmap().cloned());
                    }
                    SessionMessage::Shutdown => break,
                }
            }

            tracing::debug!("session actor stopped");
        });

        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionMessage,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| HeatmapError::ServiceClosed)?;
        response.await.map_err(|_| HeatmapError::ServiceClosed)
    }

    pub async fn handle_cell(&self, cell: CellInfo, settings: HeatmapSettings) -> Result<CellReport> {
        let settings = Box::new(settings);
        self.request(|reply| SessionMessage::Cell(cell, settings, reply))
            .await?
    }

    pub async fn reset(&self) -> Result<()> {
        self.request(SessionMessage::Reset).await
    }

    pub async fn status(&self) -> Result<SessionStatus> {
        self.request(SessionMessage::Status).await
    }

    /// The smoothed heatmap, once the session is finalized.
    pub async fn heatmap(&self) -> Result<Option<Arc<RgbImage>>> {
        self.request(SessionMessage::Heatmap).await
    }

    /// Stops the actor. Requests sent afterwards fail with `ServiceClosed`.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(SessionMessage::Shutdown).await;
    }
}
