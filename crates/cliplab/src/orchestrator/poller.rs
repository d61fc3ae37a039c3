//! The status polling loop.
//!
//! A single cancellable interval task bound to a job id. It runs only
//! while that job is current and `processing`, stops itself on a terminal
//! poll result, and is torn down when the job changes or the session ends.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::transport::JobTransport;
use crate::job::{JobPatch, JobStatus};
use crate::store::SessionStore;

struct ActivePoll {
    job_id: String,
    handle: JoinHandle<()>,
}

/// Owns at most one live polling task.
pub(crate) struct Poller {
    active: Mutex<Option<ActivePoll>>,
}

impl Poller {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ActivePoll>> {
        match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Poller lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Starts polling `job_id`, cancelling any previous timer first.
    ///
    /// A second start for the same job while its timer is still live is a
    /// no-op, so duplicate state changes can never stack two intervals.
    pub fn start(
        &self,
        job_id: &str,
        store: Arc<SessionStore>,
        transport: Arc<dyn JobTransport>,
        interval: Duration,
    ) {
        let mut active = self.lock();

        if let Some(poll) = active.as_ref() {
            if poll.job_id == job_id && !poll.handle.is_finished() {
                debug!("Poll loop already running for job {}", job_id);
                return;
            }
            debug!("Cancelling poll loop for job {}", poll.job_id);
            poll.handle.abort();
        }

        info!("Starting poll loop for job {} every {:?}", job_id, interval);
        let handle = tokio::spawn(poll_loop(job_id.to_string(), store, transport, interval));
        *active = Some(ActivePoll {
            job_id: job_id.to_string(),
            handle,
        });
    }

    /// Cancels the live timer, if any. Pending ticks never fire afterward.
    pub fn stop(&self) {
        let mut active = self.lock();
        if let Some(poll) = active.take() {
            debug!("Stopping poll loop for job {}", poll.job_id);
            poll.handle.abort();
        }
    }

    /// Returns the id of the job currently being polled.
    pub fn active_job(&self) -> Option<String> {
        self.lock()
            .as_ref()
            .filter(|p| !p.handle.is_finished())
            .map(|p| p.job_id.clone())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    job_id: String,
    store: Arc<SessionStore>,
    transport: Arc<dyn JobTransport>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of a tokio interval completes immediately; consume it
    // so polls are never tighter than the configured interval.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        // The job may have been switched away or deleted between ticks.
        match store.current_job_id() {
            Some(current) if current == job_id => {}
            _ => {
                debug!("Job {} no longer current, poll loop exiting", job_id);
                return;
            }
        }

        match transport.job_status(&job_id).await {
            Ok(resp) => {
                let status = JobStatus::parse_lenient(&resp.status, &job_id);
                let applied = store.patch_current_job(&JobPatch::from_status(&resp));
                if applied {
                    if let Some(job) = store.current_job() {
                        store.upsert_history(job);
                    }
                }

                if status != JobStatus::Processing {
                    info!("Job {} reached {}, poll loop exiting", job_id, status);
                    return;
                }
            }
            Err(e) => {
                // Transient failures keep the loop alive; only a status
                // change or teardown stops it.
                warn!("Status poll for job {} failed: {}", job_id, e);
            }
        }
    }
}
