// THEORY:
// The `SessionRegistry` lets several callers, possibly on different threads, run
// independent heatmap sessions through one shared object. Each session is
// identified by an opaque `SessionHandle`; all sessions live in one map behind a
// single mutex, so allocation, painting and finalization of any session are
// serialized. Sessions never see each other's state.
//
// Handles are issued from a monotonically increasing counter starting at 1. Handle 0
// is never issued, so C callers can use it as "no session".

use crate::core_modules::sinks::{DisplaySink, NullDisplay};
use crate::error::{HeatmapError, Result};
use crate::session::{CellInfo, CellReport, HeatmapSettings, Session, SessionPhase};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Opaque identifier of a session inside a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionHandle(u64);

impl SessionHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A thread-safe table of sessions keyed by handle.
pub struct SessionRegistry {
    next_handle: AtomicU64,
    sessions: Mutex<HashMap<SessionHandle, Session>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionHandle, Session>> {
        // A panic inside a session leaves the map itself consistent.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new headless session.
    pub fn create(&self) -> SessionHandle {
        self.insert(Session::with_display(NullDisplay))
    }

    pub fn create_with_display(&self, display: impl DisplaySink + 'static) -> SessionHandle {
        self.insert(Session::with_display(display))
    }

    pub fn insert(&self, session: Session) -> SessionHandle {
        let handle = SessionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(handle, session);
        tracing::debug!(handle = handle.raw(), "session created");
        handle
    }

    pub fn handle_cell(
        &self,
        handle: SessionHandle,
        cell: CellInfo,
        settings: &HeatmapSettings,
    ) -> Result<CellReport> {
        self.with_session(handle, |session| session.handle_cell(cell, settings))?
    }

    /// Never fails: falls back to the settings' range for unknown handles.
    pub fn color_for(&self, handle: SessionHandle, value: f32, settings: &HeatmapSettings) -> u32 {
        self.with_session(handle, |session| session.color_for(value, settings))
            .unwrap_or_else(|_| Session::new().color_for(value, settings))
    }

    pub fn reset(&self, handle: SessionHandle) -> Result<()> {
        self.with_session(handle, Session::reset)
    }

    pub fn phase(&self, handle: SessionHandle) -> Result<SessionPhase> {
        self.with_session(handle, |session| session.phase())
    }

    pub fn progress(&self, handle: SessionHandle) -> Result<(usize, usize)> {
        self.with_session(handle, |session| session.progress())
    }

    /// Removes a session and hands it back to the caller.
    pub fn remove(&self, handle: SessionHandle) -> Result<Session> {
        let session = self
            .lock()
            .remove(&handle)
            .ok_or(HeatmapError::UnknownSession(handle.raw()))?;
        tracing::debug!(handle = handle.raw(), "session removed");
        Ok(session)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Runs `f` on the session while holding the registry lock.
    pub fn with_session<T>(
        &self,
        handle: SessionHandle,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<T> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(&handle)
            .ok_or(HeatmapError::UnknownSession(handle.raw()))?;
        Ok(f(session))
    }
}
