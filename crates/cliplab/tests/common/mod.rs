//! Shared test utilities: a scripted transport fake and fixture builders.

// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use cliplab::api::models::{
    DeleteResponse, StatusResponse, SupportedFormats, UploadResponse,
};
use cliplab::{
    ClientConfig, ClientError, JobTransport, Orchestrator, Result, SessionStore, VideoMetadata,
};

// ─── Fixtures ───────────────────────────────────────────────────────────────

pub fn metadata(filename: &str) -> VideoMetadata {
    VideoMetadata {
        filename: filename.to_string(),
        format: "mp4".to_string(),
        size: 2048,
        duration: Some(14.0),
        width: Some(1920),
        height: Some(1080),
        fps: Some(30.0),
        bitrate: None,
    }
}

pub fn upload_response(job_id: &str) -> UploadResponse {
    UploadResponse {
        job_id: job_id.to_string(),
        message: "Video uploaded successfully".to_string(),
        video_metadata: metadata("clip.mp4"),
    }
}

pub fn status(job_id: &str, status: &str, progress: u8) -> StatusResponse {
    StatusResponse {
        job_id: job_id.to_string(),
        status: status.to_string(),
        progress,
        message: format!("Job is {}", status),
        output_url: if status == "completed" {
            Some(format!("/api/v1/video/result/{}", job_id))
        } else {
            None
        },
        workflow_execution: None,
        error: if status == "failed" {
            Some("tool execution crashed".to_string())
        } else {
            None
        },
    }
}

pub fn formats() -> SupportedFormats {
    SupportedFormats {
        supported_formats: vec![
            "mp4".to_string(),
            "avi".to_string(),
            "mov".to_string(),
            "webm".to_string(),
        ],
        max_file_size: 100 * 1024 * 1024,
        max_file_size_mb: 100.0,
    }
}

/// Writes a small throwaway video file and returns its path.
pub fn temp_video(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"not really a video").expect("write temp file");
    path
}

/// Fast-poll config pointed at nothing; the fake never touches the URL.
pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::with_base_url("http://localhost:0/api/v1");
    config.poll_interval = Duration::from_millis(25);
    config
}

// ─── FakeTransport ──────────────────────────────────────────────────────────

/// Scripted [`JobTransport`] fake.
///
/// Responses are consumed front-to-back from per-call queues; status polls
/// fall back to `status_fallback` once their queue is drained. Every call
/// is counted so tests can assert on traffic.
#[derive(Default)]
pub struct FakeTransport {
    pub upload_responses: Mutex<VecDeque<Result<UploadResponse>>>,
    pub process_responses: Mutex<VecDeque<Result<StatusResponse>>>,
    pub status_responses: Mutex<VecDeque<Result<StatusResponse>>>,
    pub status_fallback: Mutex<Option<StatusResponse>>,
    pub formats_response: Mutex<Option<SupportedFormats>>,
    pub delete_error: Mutex<Option<String>>,
    pub download_payload: Mutex<Vec<u8>>,

    pub upload_calls: AtomicUsize,
    pub process_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
    pub detached_deleted: Mutex<Vec<String>>,

    /// When closed (zero permits added), `start_processing` blocks until
    /// [`FakeTransport::release_processing`] is called.
    process_gate: Option<Semaphore>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fake whose `start_processing` blocks until released, to observe
    /// optimistic state while the dispatch call is in flight.
    pub fn with_gated_processing() -> Self {
        Self {
            process_gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn release_processing(&self) {
        if let Some(gate) = &self.process_gate {
            gate.add_permits(1);
        }
    }

    pub fn queue_upload(&self, resp: UploadResponse) {
        self.upload_responses.lock().unwrap().push_back(Ok(resp));
    }

    pub fn queue_upload_error(&self, e: ClientError) {
        self.upload_responses.lock().unwrap().push_back(Err(e));
    }

    pub fn queue_process(&self, resp: StatusResponse) {
        self.process_responses.lock().unwrap().push_back(Ok(resp));
    }

    pub fn queue_process_error(&self, e: ClientError) {
        self.process_responses.lock().unwrap().push_back(Err(e));
    }

    pub fn queue_status(&self, resp: StatusResponse) {
        self.status_responses.lock().unwrap().push_back(Ok(resp));
    }

    pub fn queue_status_error(&self, e: ClientError) {
        self.status_responses.lock().unwrap().push_back(Err(e));
    }

    pub fn set_status_fallback(&self, resp: StatusResponse) {
        *self.status_fallback.lock().unwrap() = Some(resp);
    }

    pub fn set_formats(&self, f: SupportedFormats) {
        *self.formats_response.lock().unwrap() = Some(f);
    }

    pub fn fail_deletes(&self, message: &str) {
        *self.delete_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn detached_ids(&self) -> Vec<String> {
        self.detached_deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobTransport for FakeTransport {
    async fn upload(&self, _file: &Path, _description: Option<&str>) -> Result<UploadResponse> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.upload_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Connectivity("no scripted upload".to_string())))
    }

    async fn start_processing(&self, _job_id: &str, _prompt: &str) -> Result<StatusResponse> {
        self.process_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.process_gate {
            let permit = gate.acquire().await.expect("gate closed");
            permit.forget();
        }
        self.process_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Connectivity("no scripted process".to_string())))
    }

    async fn job_status(&self, _job_id: &str) -> Result<StatusResponse> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(scripted) = self.status_responses.lock().unwrap().pop_front() {
            return scripted;
        }
        match self.status_fallback.lock().unwrap().clone() {
            Some(resp) => Ok(resp),
            None => Err(ClientError::Connectivity("no scripted status".to_string())),
        }
    }

    async fn delete_job(&self, job_id: &str) -> Result<DeleteResponse> {
        self.deleted.lock().unwrap().push(job_id.to_string());
        if let Some(message) = self.delete_error.lock().unwrap().clone() {
            return Err(ClientError::Server(message));
        }
        Ok(DeleteResponse {
            message: format!("Job {} and associated files deleted successfully", job_id),
        })
    }

    fn delete_job_detached(&self, job_id: &str) {
        self.detached_deleted.lock().unwrap().push(job_id.to_string());
    }

    async fn download_result(&self, _job_id: &str, dest: &Path) -> Result<u64> {
        let payload = self.download_payload.lock().unwrap().clone();
        std::fs::write(dest, &payload)?;
        Ok(payload.len() as u64)
    }

    async fn supported_formats(&self) -> Result<SupportedFormats> {
        self.formats_response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ClientError::Connectivity("no scripted formats".to_string()))
    }
}

// ─── Harness ────────────────────────────────────────────────────────────────

/// An orchestrator wired to a shared fake transport.
pub fn orchestrator_with(fake: Arc<FakeTransport>) -> Orchestrator {
    orchestrator_with_config(fake, test_config())
}

pub fn orchestrator_with_config(fake: Arc<FakeTransport>, config: ClientConfig) -> Orchestrator {
    let store = Arc::new(SessionStore::new(config.history_limit));
    Orchestrator::new(store, fake, config)
}

/// Polls a condition until it holds or the timeout elapses.
pub async fn wait_for<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
