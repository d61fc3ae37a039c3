//! The job lifecycle orchestrator.
//!
//! Translates user intent into store mutations and remote calls: the
//! two-phase submission (local prompt commit, then optimistic dispatch),
//! the status polling loop, step derivation for the guided flow, and the
//! cleanup protocol for abandoned jobs. Every remote failure is normalized
//! into the store's error field; operations never panic or leak raw
//! transport errors.

mod cleanup;
mod poller;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use crate::api::http::HttpTransport;
use crate::api::transport::JobTransport;
use crate::api::validate::{validate_prompt, validate_upload};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::job::{Job, JobPatch, JobStatus, StatusOrigin};
use crate::steps::{Step, StepController, StepView};
use crate::store::{SessionStore, StoreEvent};

use poller::Poller;

/// Orchestrates the lifecycle of the single current job.
///
/// Explicitly constructed and explicitly owned: create one per session,
/// inject the store and transport, drop it when the session ends (dropping
/// cancels the poll loop).
pub struct Orchestrator {
    store: Arc<SessionStore>,
    transport: Arc<dyn JobTransport>,
    config: ClientConfig,
    poller: Poller,
    steps: Mutex<StepController>,
}

impl Orchestrator {
    /// Creates an orchestrator over an injected store and transport.
    pub fn new(
        store: Arc<SessionStore>,
        transport: Arc<dyn JobTransport>,
        config: ClientConfig,
    ) -> Self {
        Self {
            store,
            transport,
            config,
            poller: Poller::new(),
            steps: Mutex::new(StepController::new()),
        }
    }

    /// Convenience constructor wiring an HTTP transport and a fresh store.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let store = Arc::new(SessionStore::new(config.history_limit));
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::new(store, transport, config))
    }

    /// The session store this orchestrator mutates.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Subscribes to store mutation events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    fn steps(&self) -> std::sync::MutexGuard<'_, StepController> {
        match self.steps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Step controller lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Stores a normalized error for display unless it is a silent
    /// guard rejection, then hands it back to the caller.
    fn fail(&self, e: ClientError) -> ClientError {
        if !e.is_silent() {
            self.store.set_error(Some(e.to_string()));
        }
        e
    }

    // ── Session setup ──

    /// Fetches and caches the supported-format list. Called once at
    /// session start; client-side upload validation is skipped until it
    /// succeeds.
    pub async fn init(&self) -> Result<()> {
        match self.transport.supported_formats().await {
            Ok(formats) => {
                info!(
                    "Supported formats: {} (max {} bytes)",
                    formats.supported_formats.join(", "),
                    formats.max_file_size
                );
                self.store.set_supported_formats(formats);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    // ── Job lifecycle operations ──

    /// Uploads a video, creating a new current job in `Pending`.
    ///
    /// Validation failures are returned directly and never reach the
    /// store's error field; remote failures do both.
    pub async fn upload(&self, file: &Path, description: Option<&str>) -> Result<Job> {
        if let Some(formats) = self.store.supported_formats() {
            let size = tokio::fs::metadata(file).await?.len();
            validate_upload(file, size, &formats)?;
        } else {
            debug!("No cached format list, skipping client-side validation");
        }

        self.store.set_loading(true);
        let result = self.transport.upload(file, description).await;
        self.store.set_loading(false);

        match result {
            Ok(resp) => {
                let job = Job::from_upload(&resp);
                info!("Upload created job {}", job.job_id);
                self.store.set_current_job(job.clone());
                self.store.upsert_history(job.clone());
                // A new job id resumes auto-navigation
                self.steps().reset();
                Ok(job)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Phase 1 of submission: commits the processing description locally.
    ///
    /// Purely local, so the describe step completes before any network
    /// round trip. The status is untouched unless the job was terminal, in
    /// which case resubmitting re-enters a fresh cycle at `Pending`.
    pub fn submit_prompt(&self, prompt: &str) -> Result<Job> {
        let prompt = validate_prompt(prompt)?;
        let job = self.store.current_job().ok_or_else(|| {
            ClientError::InvalidState("no current job to describe".to_string())
        })?;

        let mut patch = JobPatch::new(job.job_id.clone())
            .prompt(prompt)
            .message("Description saved, ready to process");
        if job.is_finished() {
            patch = patch.status(JobStatus::Pending, StatusOrigin::Local);
        }
        self.store.patch_current_job(&patch);

        let updated = self.store.current_job().ok_or_else(|| {
            ClientError::InvalidState("current job disappeared".to_string())
        })?;
        self.store.upsert_history(updated.clone());
        Ok(updated)
    }

    /// Phase 2 of submission: optimistic dispatch of remote processing.
    ///
    /// The status is forced to `Processing` locally before the call so the
    /// interface advances immediately; `status_origin` stays `Local` until
    /// the response confirms. On failure the optimistic status is left in
    /// place and the error is surfaced through the store.
    pub async fn start_processing(&self) -> Result<Job> {
        let job = self
            .store
            .current_job()
            .ok_or_else(|| ClientError::InvalidState("no current job".to_string()))?;
        let prompt = job.prompt.clone().ok_or_else(|| {
            ClientError::InvalidState("job has no processing description".to_string())
        })?;

        let optimistic = JobPatch::new(job.job_id.clone())
            .status(JobStatus::Processing, StatusOrigin::Local)
            .progress(0)
            .message("Processing requested");
        self.store.patch_current_job(&optimistic);
        if let Some(updated) = self.store.current_job() {
            self.store.upsert_history(updated);
        }

        match self.transport.start_processing(&job.job_id, &prompt).await {
            Ok(resp) => {
                // Reconcile with whatever the response carries; a locally
                // kept prompt survives because the patch never sets it.
                if !self.store.patch_current_job(&JobPatch::from_status(&resp)) {
                    debug!(
                        "Dispatch response for job {} arrived after a job switch, dropped",
                        resp.job_id
                    );
                    return Err(ClientError::StateGuardRejected(resp.job_id));
                }

                let current = self.store.current_job().ok_or_else(|| {
                    ClientError::StateGuardRejected(job.job_id.clone())
                })?;
                self.store.upsert_history(current.clone());

                if current.status == JobStatus::Processing {
                    self.poller.start(
                        &current.job_id,
                        Arc::clone(&self.store),
                        Arc::clone(&self.transport),
                        self.config.poll_interval,
                    );
                }
                Ok(current)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Re-enters the submission cycle after a failure, without a new
    /// upload. The job cycles back to `Pending`; the existing prompt is
    /// kept and can be overwritten by another [`submit_prompt`] call.
    ///
    /// [`submit_prompt`]: Orchestrator::submit_prompt
    pub fn retry(&self) -> Result<Job> {
        let job = self
            .store
            .current_job()
            .ok_or_else(|| ClientError::InvalidState("no current job".to_string()))?;
        if job.status != JobStatus::Failed {
            return Err(ClientError::InvalidState(format!(
                "only failed jobs can be retried (status is {})",
                job.status
            )));
        }

        info!("Retrying job {}", job.job_id);
        self.store.set_error(None);
        self.store.patch_current_job(
            &JobPatch::new(job.job_id.clone())
                .status(JobStatus::Pending, StatusOrigin::Local)
                .progress(0)
                .message("Ready to retry"),
        );

        let updated = self.store.current_job().ok_or_else(|| {
            ClientError::InvalidState("current job disappeared".to_string())
        })?;
        self.store.upsert_history(updated.clone());
        Ok(updated)
    }

    /// Replaces the current job with an entry from history. Restarts the
    /// poll loop when the selected job is still processing and cancels it
    /// otherwise; two timers never coexist.
    pub fn select_job(&self, job_id: &str) -> Result<Job> {
        let job = self
            .store
            .history_job(job_id)
            .ok_or_else(|| ClientError::NotFound(format!("job {} is not in history", job_id)))?;

        self.store.set_current_job(job.clone());

        if job.status == JobStatus::Processing {
            self.poller.start(
                job_id,
                Arc::clone(&self.store),
                Arc::clone(&self.transport),
                self.config.poll_interval,
            );
        } else {
            self.poller.stop();
        }
        Ok(job)
    }

    /// Deletes a job locally and best-effort remotely.
    ///
    /// The remote outcome is logged only; local removal always happens and
    /// the call never fails.
    pub async fn delete_job(&self, job_id: &str) -> Result<()> {
        if let Err(e) = self.transport.delete_job(job_id).await {
            warn!("Remote delete for job {} failed: {}", job_id, e);
        }

        if self.store.current_job_id().as_deref() == Some(job_id) {
            self.poller.stop();
            self.store.clear_current_job();
        }
        self.store.remove_from_history(job_id);
        Ok(())
    }

    /// Downloads the processed result of the current job into `dest_dir`,
    /// returning the written file's path.
    pub async fn download_result(&self, dest_dir: &Path) -> Result<PathBuf> {
        let job = self
            .store
            .current_job()
            .ok_or_else(|| ClientError::InvalidState("no current job".to_string()))?;
        if job.status != JobStatus::Completed || job.output_url.is_none() {
            return Err(ClientError::InvalidState(format!(
                "video is not ready for download (status is {})",
                job.status
            )));
        }

        let stem = Path::new(&job.video_metadata.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let dest = dest_dir.join(format!("{}_processed.{}", stem, job.video_metadata.format));

        match self.transport.download_result(&job.job_id, &dest).await {
            Ok(bytes) => {
                info!("Saved result of job {} ({} bytes) to {:?}", job.job_id, bytes, dest);
                Ok(dest)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Clears the current job and cancels any polling. History is kept.
    pub fn clear(&self) {
        self.poller.stop();
        self.store.clear_current_job();
    }

    /// Dismisses the displayed error.
    pub fn dismiss_error(&self) {
        self.store.set_error(None);
    }

    // ── Step flow ──

    /// The derived step view for the current job.
    pub fn step_view(&self) -> StepView {
        let job = self.store.current_job();
        self.steps().view(job.as_ref())
    }

    /// Manually selects a step, suspending auto-navigation until the next
    /// fresh upload.
    pub fn select_step(&self, step: Step) {
        self.steps().select(step);
    }

    // ── Teardown ──

    /// Best-effort cleanup when the orchestrating view goes away: awaits a
    /// delete of the incomplete current job and cancels polling. Failures
    /// are logged, never returned.
    pub async fn teardown_view(&self) {
        self.poller.stop();
        cleanup::teardown_view(&self.store, self.transport.as_ref()).await;
    }

    /// Fire-and-forget cleanup at full session teardown (unload/close):
    /// detached deletes for the incomplete current job and every history
    /// entry still pending or processing. Returns the targeted ids.
    ///
    /// Backgrounding must NOT call this — only a real unload does, so
    /// users can switch tabs without losing in-flight jobs.
    pub fn teardown_session(&self) -> Vec<String> {
        self.poller.stop();
        cleanup::teardown_session(&self.store, self.transport.as_ref())
    }

    /// Id of the job currently being polled, if a loop is live.
    pub fn polling_job(&self) -> Option<String> {
        self.poller.active_job()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        // Pending timers must not fire after the session is gone
        self.poller.stop();
    }
}
