//! Wire types matching the remote job service contract.

use serde::{Deserialize, Serialize};

use crate::job::{VideoMetadata, WorkflowExecution};

/// Response of `POST /video/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub job_id: String,
    pub message: String,
    pub video_metadata: VideoMetadata,
}

/// Request body of `POST /video/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub job_id: String,
    pub prompt: String,
}

/// Shared response shape of `POST /video/process` and
/// `GET /jobs/status/{job_id}` — the authoritative job state.
///
/// `status` stays a raw string here; the domain layer parses it leniently
/// so an unknown backend state never fails deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub job_id: String,
    pub status: String,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_execution: Option<WorkflowExecution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `DELETE /video/upload/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Response of `GET /video/formats`, fetched once at session start and
/// cached to drive client-side file validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupportedFormats {
    pub supported_formats: Vec<String>,
    /// Maximum accepted upload size in bytes.
    pub max_file_size: u64,
    pub max_file_size_mb: f64,
}
