//! Best-effort cleanup of abandoned jobs.
//!
//! Server-side files for jobs the user never finished are deleted on the
//! way out. Two teardown flavors exist: view teardown awaits its delete
//! call, session teardown fires detached requests that nothing can await.
//! Backgrounding (tab switch, minimize) deliberately triggers neither, so
//! in-flight jobs survive multitasking. All failures are swallowed after a
//! log line; cleanup never blocks a user-visible action and is accepted to
//! be lossy.

use log::debug;

use crate::api::transport::JobTransport;
use crate::job::JobStatus;
use crate::store::SessionStore;

/// Awaitable best-effort delete of an incomplete current job, for when the
/// orchestrating view goes away but the session lives on.
pub(crate) async fn teardown_view(store: &SessionStore, transport: &dyn JobTransport) {
    let Some(job) = store.current_job() else {
        return;
    };
    if job.status == JobStatus::Completed {
        return;
    }

    debug!("View teardown, deleting incomplete job {}", job.job_id);
    if let Err(e) = transport.delete_job(&job.job_id).await {
        debug!("View-teardown delete for job {} failed: {}", job.job_id, e);
    }
}

/// Fire-and-forget cleanup at full session teardown (unload/close).
///
/// Targets the current job unless it completed, plus every history entry
/// still pending or processing. Returns the targeted ids so callers can
/// log or test the decision; the requests themselves are detached.
pub(crate) fn teardown_session(store: &SessionStore, transport: &dyn JobTransport) -> Vec<String> {
    let snapshot = store.snapshot();
    let mut targets: Vec<String> = Vec::new();

    if let Some(job) = snapshot.current_job {
        if job.status != JobStatus::Completed {
            targets.push(job.job_id);
        }
    }

    for job in snapshot.job_history {
        let abandoned = matches!(job.status, JobStatus::Pending | JobStatus::Processing);
        if abandoned && !targets.contains(&job.job_id) {
            targets.push(job.job_id);
        }
    }

    for job_id in &targets {
        debug!("Session teardown, detached delete for job {}", job_id);
        transport.delete_job_detached(job_id);
    }

    targets
}
