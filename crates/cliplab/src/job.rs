//! Domain model for video-processing jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::models::{StatusResponse, UploadResponse};

// ─── Status ─────────────────────────────────────────────────────────────────

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Parses a backend status string, tolerating states the client
    /// lifecycle does not model.
    ///
    /// `cancelled` maps to `Failed` (terminal, error-ish). Unknown strings
    /// fall back to `Processing` so an active poll loop keeps running
    /// instead of wedging a live job.
    pub fn parse_lenient(s: &str, job_id: &str) -> JobStatus {
        match s {
            "pending" => JobStatus::Pending,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "cancelled" => {
                log::warn!("Job {} reported 'cancelled', treating as failed", job_id);
                JobStatus::Failed
            }
            other => {
                log::warn!(
                    "Unknown job status '{}' for job {}, defaulting to Processing",
                    other,
                    job_id
                );
                JobStatus::Processing
            }
        }
    }

    /// Returns true for terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Where the current `status` value came from.
///
/// The orchestrator writes `Processing` locally before the remote call
/// resolves; this flag lets embedders tell an asserted status from a
/// confirmed one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusOrigin {
    /// Set by an optimistic local write, not yet confirmed remotely.
    Local,
    /// Reported by the remote service.
    Remote,
}

// ─── Metadata and workflow results ──────────────────────────────────────────

/// Video file metadata, set once at upload and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoMetadata {
    pub filename: String,
    /// Container format extension, e.g. "mp4".
    pub format: String,
    /// File size in bytes.
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
}

/// One executed tool step inside a workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolExecution {
    pub tool_name: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
    /// Execution time in seconds.
    pub execution_time: f64,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Structured result of the AI-planned workflow, populated when a job
/// reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowExecution {
    pub workflow_id: String,
    /// The model's reasoning for the chosen tool sequence.
    #[serde(alias = "gemini_reasoning")]
    pub reasoning: String,
    #[serde(default)]
    pub planned_tools: Vec<String>,
    #[serde(default)]
    pub executed_tools: Vec<ToolExecution>,
    /// Total execution time in seconds.
    pub total_execution_time: f64,
    #[serde(default)]
    pub success: bool,
}

// ─── Job ────────────────────────────────────────────────────────────────────

/// The single tracked unit of work: one uploaded video and its processing
/// lifecycle. Owned exclusively by the session store; everything else holds
/// clones and communicates mutation intent through store operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Server-assigned identifier, immutable once set.
    pub job_id: String,
    pub status: JobStatus,
    pub status_origin: StatusOrigin,
    /// Progress percentage (0-100).
    pub progress: u8,
    /// User-supplied processing instruction. Its presence together with
    /// `Pending` marks the "prepared, not yet dispatched" sub-state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Human-readable line describing current activity.
    pub message: String,
    pub video_metadata: VideoMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_execution: Option<WorkflowExecution>,
    /// Download locator; present iff status is `Completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    /// Failure reason; present iff status is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Creates a freshly uploaded job from the upload response.
    pub fn from_upload(resp: &UploadResponse) -> Self {
        let now = Utc::now();
        Self {
            job_id: resp.job_id.clone(),
            status: JobStatus::Pending,
            status_origin: StatusOrigin::Remote,
            progress: 0,
            prompt: None,
            message: resp.message.clone(),
            video_metadata: resp.video_metadata.clone(),
            workflow_execution: None,
            output_url: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true while the job is pending with a prompt attached but
    /// processing not yet dispatched.
    pub fn is_prepared(&self) -> bool {
        self.status == JobStatus::Pending && self.prompt.is_some()
    }

    /// Returns true once the job reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies a partial update, bumping `updated_at`.
    ///
    /// Fields absent from the patch keep their current value; a status
    /// change re-establishes the `output_url`/`error` exclusivity
    /// invariants.
    pub fn apply(&mut self, patch: &JobPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(origin) = patch.status_origin {
            self.status_origin = origin;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress.min(100);
        }
        if let Some(ref prompt) = patch.prompt {
            self.prompt = Some(prompt.clone());
        }
        if let Some(ref message) = patch.message {
            self.message = message.clone();
        }
        if let Some(ref workflow) = patch.workflow_execution {
            self.workflow_execution = Some(workflow.clone());
        }
        if let Some(ref output_url) = patch.output_url {
            self.output_url = Some(output_url.clone());
        }
        if let Some(ref error) = patch.error {
            self.error = Some(error.clone());
        }

        // output_url implies Completed, error implies Failed
        if self.status != JobStatus::Completed {
            self.output_url = None;
        }
        if self.status != JobStatus::Failed {
            self.error = None;
        }

        self.updated_at = Utc::now();
    }
}

// ─── JobPatch ───────────────────────────────────────────────────────────────

/// Partial update addressed to a specific job id.
///
/// The store applies a patch only when its `job_id` matches the current
/// job, which is the primary defense against stale async responses.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub job_id: String,
    pub status: Option<JobStatus>,
    pub status_origin: Option<StatusOrigin>,
    pub progress: Option<u8>,
    pub prompt: Option<String>,
    pub message: Option<String>,
    pub workflow_execution: Option<WorkflowExecution>,
    pub output_url: Option<String>,
    pub error: Option<String>,
}

impl JobPatch {
    /// Creates an empty patch for the given job.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            ..Self::default()
        }
    }

    /// Builds a patch from a remote status response. The response carries
    /// no prompt, so a locally-set prompt always survives reconciliation.
    pub fn from_status(resp: &StatusResponse) -> Self {
        Self {
            job_id: resp.job_id.clone(),
            status: Some(JobStatus::parse_lenient(&resp.status, &resp.job_id)),
            status_origin: Some(StatusOrigin::Remote),
            progress: Some(resp.progress),
            prompt: None,
            message: if resp.message.is_empty() {
                None
            } else {
                Some(resp.message.clone())
            },
            workflow_execution: resp.workflow_execution.clone(),
            output_url: resp.output_url.clone(),
            error: resp.error.clone(),
        }
    }

    pub fn status(mut self, status: JobStatus, origin: StatusOrigin) -> Self {
        self.status = Some(status);
        self.status_origin = Some(origin);
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_metadata() -> VideoMetadata {
        VideoMetadata {
            filename: "clip.mp4".to_string(),
            format: "mp4".to_string(),
            size: 1024,
            duration: Some(12.5),
            width: Some(1920),
            height: Some(1080),
            fps: Some(30.0),
            bitrate: None,
        }
    }

    fn test_job(job_id: &str) -> Job {
        Job::from_upload(&UploadResponse {
            job_id: job_id.to_string(),
            message: "Video uploaded successfully".to_string(),
            video_metadata: test_metadata(),
        })
    }

    #[test]
    fn test_parse_lenient_known() {
        assert_eq!(JobStatus::parse_lenient("pending", "j"), JobStatus::Pending);
        assert_eq!(
            JobStatus::parse_lenient("processing", "j"),
            JobStatus::Processing
        );
        assert_eq!(
            JobStatus::parse_lenient("completed", "j"),
            JobStatus::Completed
        );
        assert_eq!(JobStatus::parse_lenient("failed", "j"), JobStatus::Failed);
    }

    #[test]
    fn test_parse_lenient_cancelled_and_unknown() {
        assert_eq!(
            JobStatus::parse_lenient("cancelled", "j"),
            JobStatus::Failed
        );
        assert_eq!(
            JobStatus::parse_lenient("warming-up", "j"),
            JobStatus::Processing
        );
    }

    #[test]
    fn test_from_upload() {
        let job = test_job("abc");
        assert_eq!(job.job_id, "abc");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.status_origin, StatusOrigin::Remote);
        assert_eq!(job.progress, 0);
        assert!(job.prompt.is_none());
        assert!(!job.is_prepared());
        assert!(!job.is_finished());
    }

    #[test]
    fn test_prepared_sub_state() {
        let mut job = test_job("abc");
        job.apply(&JobPatch::new("abc").prompt("make it vintage"));
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.is_prepared());
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut job = test_job("abc");
        job.apply(&JobPatch::new("abc").prompt("stabilize"));
        job.apply(&JobPatch::new("abc").progress(40).message("Halfway"));

        assert_eq!(job.prompt.as_deref(), Some("stabilize"));
        assert_eq!(job.progress, 40);
        assert_eq!(job.message, "Halfway");
    }

    #[test]
    fn test_apply_enforces_exclusivity() {
        let mut job = test_job("abc");

        let mut completed = JobPatch::new("abc").status(JobStatus::Completed, StatusOrigin::Remote);
        completed.output_url = Some("/video/result/abc".to_string());
        job.apply(&completed);
        assert_eq!(job.output_url.as_deref(), Some("/video/result/abc"));
        assert!(job.error.is_none());

        // Cycling back to pending (retry) clears the stale result locator
        job.apply(&JobPatch::new("abc").status(JobStatus::Pending, StatusOrigin::Local));
        assert!(job.output_url.is_none());
    }

    #[test]
    fn test_apply_clears_error_on_retry() {
        let mut job = test_job("abc");

        let mut failed = JobPatch::new("abc").status(JobStatus::Failed, StatusOrigin::Remote);
        failed.error = Some("tool crashed".to_string());
        job.apply(&failed);
        assert_eq!(job.error.as_deref(), Some("tool crashed"));
        assert!(job.is_finished());

        job.apply(&JobPatch::new("abc").status(JobStatus::Pending, StatusOrigin::Local));
        assert!(job.error.is_none());
        assert!(!job.is_finished());
    }

    #[test]
    fn test_progress_clamped() {
        let mut job = test_job("abc");
        job.apply(&JobPatch::new("abc").progress(250));
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_patch_from_status_preserves_prompt() {
        let mut job = test_job("abc");
        job.apply(&JobPatch::new("abc").prompt("make it vintage"));

        let resp = StatusResponse {
            job_id: "abc".to_string(),
            status: "processing".to_string(),
            progress: 55,
            message: "Applying filters".to_string(),
            output_url: None,
            workflow_execution: None,
            error: None,
        };
        job.apply(&JobPatch::from_status(&resp));

        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.status_origin, StatusOrigin::Remote);
        assert_eq!(job.progress, 55);
        assert_eq!(job.prompt.as_deref(), Some("make it vintage"));
    }

    #[test]
    fn test_workflow_deserializes_wire_shape() {
        let raw = r#"{
            "workflow_id": "wf-1",
            "gemini_reasoning": "Apply a sepia filter for the vintage look",
            "planned_tools": ["color_grade", "grain"],
            "executed_tools": [{
                "tool_name": "color_grade",
                "parameters": {"preset": "sepia"},
                "execution_time": 4.2,
                "status": "success"
            }],
            "total_execution_time": 6.1,
            "success": true
        }"#;
        let workflow: WorkflowExecution = serde_json::from_str(raw).unwrap();
        assert_eq!(workflow.reasoning, "Apply a sepia filter for the vintage look");
        assert_eq!(workflow.planned_tools.len(), 2);
        assert_eq!(workflow.executed_tools[0].tool_name, "color_grade");
        assert!(workflow.success);
    }
}
