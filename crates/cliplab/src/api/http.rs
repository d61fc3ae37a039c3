//! reqwest-backed implementation of [`JobTransport`].

use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode};
use tokio::io::AsyncWriteExt;

use crate::api::models::{DeleteResponse, StatusResponse, SupportedFormats, UploadResponse};
use crate::api::transport::JobTransport;
use crate::api::validate::guess_mime;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Maximum length for logged/surfaced error bodies.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Truncates an error body to keep store errors and logs readable. The
/// cut always lands on a char boundary.
fn truncate_detail(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &body[..end])
}

/// Normalizes a transport-level reqwest failure.
fn transport_error(e: reqwest::Error) -> ClientError {
    if e.is_decode() {
        ClientError::Server(format!("malformed response: {}", e))
    } else {
        // Connect failures, timeouts, and anything else that never produced
        // a usable response.
        ClientError::Connectivity(e.to_string())
    }
}

/// HTTP transport for the remote job service.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport from the session config.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Connectivity(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Extracts the backend's `detail` field from an error response,
    /// falling back to the raw body.
    async fn error_detail(resp: Response) -> String {
        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or(body);
        truncate_detail(&detail)
    }

    /// Checks the response status, mapping failures to the error taxonomy.
    async fn checked(resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let detail = Self::error_detail(resp).await;
        Err(ClientError::from_status(status.as_u16(), detail))
    }

    /// Streams a response body into `dest`, returning bytes written.
    async fn stream_to_file(resp: Response, dest: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = resp.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(transport_error)?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl JobTransport for HttpTransport {
    async fn upload(&self, file: &Path, description: Option<&str>) -> Result<UploadResponse> {
        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ClientError::Validation("upload path has no filename".to_string()))?;

        info!("Uploading {} to {}", filename, self.base_url);

        // Streamed rather than buffered; uploads run up to the backend's
        // size cap.
        let handle = tokio::fs::File::open(file).await?;
        let length = handle.metadata().await?.len();
        let part = Part::stream_with_length(Body::from(handle), length)
            .file_name(filename.clone())
            .mime_str(&guess_mime(file))
            .map_err(|e| ClientError::Validation(format!("invalid MIME type: {}", e)))?;

        let mut form = Form::new().part("file", part);
        if let Some(description) = description {
            form = form.text("description", description.to_string());
        }

        let resp = self
            .client
            .post(self.url("/video/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        Self::checked(resp)
            .await?
            .json::<UploadResponse>()
            .await
            .map_err(transport_error)
    }

    async fn start_processing(&self, job_id: &str, prompt: &str) -> Result<StatusResponse> {
        info!("Starting processing for job {}", job_id);

        let body = serde_json::json!({ "job_id": job_id, "prompt": prompt });
        let resp = self
            .client
            .post(self.url("/video/process"))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        // A 400 here means the job is not in a startable state, not that
        // the request payload was malformed.
        match Self::checked(resp).await {
            Ok(resp) => resp.json::<StatusResponse>().await.map_err(transport_error),
            Err(ClientError::Validation(detail)) => Err(ClientError::InvalidState(detail)),
            Err(e) => Err(e),
        }
    }

    async fn job_status(&self, job_id: &str) -> Result<StatusResponse> {
        let resp = self
            .client
            .get(self.url(&format!("/jobs/status/{}", job_id)))
            .send()
            .await
            .map_err(transport_error)?;

        Self::checked(resp)
            .await?
            .json::<StatusResponse>()
            .await
            .map_err(transport_error)
    }

    async fn delete_job(&self, job_id: &str) -> Result<DeleteResponse> {
        let resp = self
            .client
            .delete(self.url(&format!("/video/upload/{}", job_id)))
            .send()
            .await
            .map_err(transport_error)?;

        Self::checked(resp)
            .await?
            .json::<DeleteResponse>()
            .await
            .map_err(transport_error)
    }

    fn delete_job_detached(&self, job_id: &str) {
        // Beacon-style dispatch: spawn and forget. Must run inside a tokio
        // runtime; nothing awaits the outcome and failures are only logged.
        let client = self.client.clone();
        let url = self.url(&format!("/video/upload/{}", job_id));
        let job_id = job_id.to_string();

        tokio::spawn(async move {
            match client.delete(&url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!("Detached cleanup deleted job {}", job_id);
                }
                Ok(resp) => {
                    debug!(
                        "Detached cleanup for job {} answered {}",
                        job_id,
                        resp.status()
                    );
                }
                Err(e) => {
                    debug!("Detached cleanup for job {} failed: {}", job_id, e);
                }
            }
        });
    }

    async fn download_result(&self, job_id: &str, dest: &Path) -> Result<u64> {
        info!("Downloading result for job {} to {:?}", job_id, dest);

        let resp = self
            .client
            .get(self.url(&format!("/video/result/{}", job_id)))
            .send()
            .await
            .map_err(transport_error)?;
        let resp = Self::checked(resp).await?;

        if resp.status() == StatusCode::NO_CONTENT {
            warn!("Result download for job {} returned no content", job_id);
        }

        match Self::stream_to_file(resp, dest).await {
            Ok(written) => {
                debug!("Downloaded {} bytes for job {}", written, job_id);
                Ok(written)
            }
            Err(e) => {
                // A truncated result must not be left looking like a
                // finished download.
                let _ = tokio::fs::remove_file(dest).await;
                Err(e)
            }
        }
    }

    async fn supported_formats(&self) -> Result<SupportedFormats> {
        let resp = self
            .client
            .get(self.url("/video/formats"))
            .send()
            .await
            .map_err(transport_error)?;

        Self::checked(resp)
            .await?
            .json::<SupportedFormats>()
            .await
            .map_err(transport_error)
    }
}
