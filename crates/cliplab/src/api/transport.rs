//! The transport seam between the orchestrator and HTTP.

use std::path::Path;

use async_trait::async_trait;

use crate::api::models::{DeleteResponse, StatusResponse, SupportedFormats, UploadResponse};
use crate::error::Result;

/// Remote calls the orchestrator depends on.
///
/// Implemented by [`crate::api::http::HttpTransport`] for production and by
/// scripted fakes in tests; the orchestrator never talks to reqwest
/// directly.
#[async_trait]
pub trait JobTransport: Send + Sync {
    /// Uploads a video file with an optional description, creating a job.
    async fn upload(&self, file: &Path, description: Option<&str>) -> Result<UploadResponse>;

    /// Starts remote processing for an uploaded job.
    async fn start_processing(&self, job_id: &str, prompt: &str) -> Result<StatusResponse>;

    /// Queries the authoritative state of a job.
    async fn job_status(&self, job_id: &str) -> Result<StatusResponse>;

    /// Deletes a job and its server-side files. Best-effort from the
    /// caller's perspective; the result is awaitable.
    async fn delete_job(&self, job_id: &str) -> Result<DeleteResponse>;

    /// Issues a delete without waiting for (or reporting) the outcome.
    /// Used by session teardown, where nothing can await a response.
    fn delete_job_detached(&self, job_id: &str);

    /// Downloads the processed result into `dest`, returning bytes written.
    async fn download_result(&self, job_id: &str, dest: &Path) -> Result<u64>;

    /// Fetches the supported upload formats and size limits.
    async fn supported_formats(&self) -> Result<SupportedFormats>;
}
