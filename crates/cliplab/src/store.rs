//! Session store: the single source of truth for client-side job state.
//!
//! Holds the current job, the bounded history, the loading flag, the
//! user-visible error, and the cached format list. Every mutation is one
//! indivisible step under the write lock and emits one [`StoreEvent`] so
//! the presentation layer can re-render from a fresh snapshot.

use std::sync::RwLock;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::api::models::SupportedFormats;
use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::job::{Job, JobPatch};

/// Change notification emitted after each store mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// The current job was replaced (or cleared when the id is `None`).
    CurrentJobChanged(Option<String>),
    /// A patch was applied to the current job.
    CurrentJobPatched(String),
    /// The history list changed (upsert, removal, or eviction).
    HistoryChanged,
    LoadingChanged(bool),
    ErrorChanged(Option<String>),
    FormatsLoaded,
}

/// Read-only view of the aggregate state at one instant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_job: Option<Job>,
    /// Most-recent-first by `updated_at`.
    pub job_history: Vec<Job>,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_formats: Option<SupportedFormats>,
}

#[derive(Debug, Default)]
struct SessionState {
    current_job: Option<Job>,
    job_history: Vec<Job>,
    loading: bool,
    error: Option<String>,
    supported_formats: Option<SupportedFormats>,
}

/// The aggregate state container.
///
/// One writer path (this operation set), many readers. Mutations are pure
/// state transitions that never fail; remote side effects live in the
/// orchestrator, which calls these after a call resolves.
pub struct SessionStore {
    state: RwLock<SessionState>,
    events: broadcast::Sender<StoreEvent>,
    history_limit: usize,
}

impl SessionStore {
    /// Creates a store with the given history cap.
    pub fn new(history_limit: usize) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: RwLock::new(SessionState::default()),
            events,
            history_limit: history_limit.max(1),
        }
    }

    /// Subscribes to mutation events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No active receivers is fine
        let _ = self.events.send(event);
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Session store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Session store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    // ── Mutations ──

    /// Replaces the current job wholesale and clears any displayed error.
    pub fn set_current_job(&self, job: Job) {
        let job_id = job.job_id.clone();
        {
            let mut state = self.write_state();
            state.current_job = Some(job);
            state.error = None;
        }
        self.emit(StoreEvent::CurrentJobChanged(Some(job_id)));
    }

    /// Merges a patch into the current job if the ids match.
    ///
    /// Returns false without touching state when the patch addresses a job
    /// that is no longer current — the guard against stale async responses.
    pub fn patch_current_job(&self, patch: &JobPatch) -> bool {
        let applied = {
            let mut state = self.write_state();
            match state.current_job.as_mut() {
                Some(job) if job.job_id == patch.job_id => {
                    job.apply(patch);
                    true
                }
                Some(job) => {
                    log::debug!(
                        "Discarding patch for job {} (current is {})",
                        patch.job_id,
                        job.job_id
                    );
                    false
                }
                None => {
                    log::debug!("Discarding patch for job {} (no current job)", patch.job_id);
                    false
                }
            }
        };
        if applied {
            self.emit(StoreEvent::CurrentJobPatched(patch.job_id.clone()));
        }
        applied
    }

    /// Inserts a job into history or replaces an existing entry in place.
    ///
    /// Recency is carried by `updated_at`, not list position; when the cap
    /// is exceeded, the entry with the oldest `updated_at` is evicted —
    /// never the one matching the current job.
    pub fn upsert_history(&self, job: Job) {
        {
            let mut state = self.write_state();

            if let Some(existing) = state
                .job_history
                .iter_mut()
                .find(|j| j.job_id == job.job_id)
            {
                *existing = job;
            } else {
                state.job_history.insert(0, job);

                if state.job_history.len() > self.history_limit {
                    let current_id = state.current_job.as_ref().map(|j| j.job_id.clone());
                    let evict = state
                        .job_history
                        .iter()
                        .enumerate()
                        .filter(|(_, j)| Some(&j.job_id) != current_id.as_ref())
                        .min_by_key(|(_, j)| j.updated_at)
                        .map(|(i, _)| i);
                    if let Some(index) = evict {
                        let evicted = state.job_history.remove(index);
                        log::debug!("History cap reached, evicted job {}", evicted.job_id);
                    }
                }
            }
        }
        self.emit(StoreEvent::HistoryChanged);
    }

    /// Removes a job from history. No-op if absent.
    pub fn remove_from_history(&self, job_id: &str) {
        let removed = {
            let mut state = self.write_state();
            let before = state.job_history.len();
            state.job_history.retain(|j| j.job_id != job_id);
            state.job_history.len() != before
        };
        if removed {
            self.emit(StoreEvent::HistoryChanged);
        }
    }

    /// Clears the current job without touching history.
    pub fn clear_current_job(&self) {
        {
            let mut state = self.write_state();
            state.current_job = None;
        }
        self.emit(StoreEvent::CurrentJobChanged(None));
    }

    pub fn set_loading(&self, loading: bool) {
        {
            let mut state = self.write_state();
            state.loading = loading;
        }
        self.emit(StoreEvent::LoadingChanged(loading));
    }

    /// Sets or clears the user-visible error message.
    pub fn set_error(&self, error: Option<String>) {
        {
            let mut state = self.write_state();
            state.error = error.clone();
        }
        self.emit(StoreEvent::ErrorChanged(error));
    }

    /// Caches the format list fetched at session start.
    pub fn set_supported_formats(&self, formats: SupportedFormats) {
        {
            let mut state = self.write_state();
            state.supported_formats = Some(formats);
        }
        self.emit(StoreEvent::FormatsLoaded);
    }

    // ── Reads ──

    /// Returns a consistent snapshot, history sorted newest-first.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.read_state();
        let mut job_history = state.job_history.clone();
        job_history.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        SessionSnapshot {
            current_job: state.current_job.clone(),
            job_history,
            loading: state.loading,
            error: state.error.clone(),
            supported_formats: state.supported_formats.clone(),
        }
    }

    pub fn current_job(&self) -> Option<Job> {
        self.read_state().current_job.clone()
    }

    pub fn current_job_id(&self) -> Option<String> {
        self.read_state()
            .current_job
            .as_ref()
            .map(|j| j.job_id.clone())
    }

    /// Looks up a history entry by id.
    pub fn history_job(&self, job_id: &str) -> Option<Job> {
        self.read_state()
            .job_history
            .iter()
            .find(|j| j.job_id == job_id)
            .cloned()
    }

    pub fn supported_formats(&self) -> Option<SupportedFormats> {
        self.read_state().supported_formats.clone()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
