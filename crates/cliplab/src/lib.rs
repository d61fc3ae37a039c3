//! cliplab — session client for an AI-orchestrated video-processing
//! service.
//!
//! The crate tracks exactly one "current" job plus a bounded history. The
//! [`store::SessionStore`] is the single source of truth; the
//! [`orchestrator::Orchestrator`] sequences the two-phase submission
//! (local prompt commit, then optimistic dispatch), polls remote status
//! while a job is processing, derives the guided step flow, and performs
//! best-effort cleanup of abandoned jobs at teardown. Presentation layers
//! call the orchestrator's operations and render snapshots; they never
//! mutate job state directly.

pub mod api;
pub mod config;
pub mod error;
pub mod job;
pub mod logging;
pub mod orchestrator;
pub mod steps;
pub mod store;

pub use api::http::HttpTransport;
pub use api::models::{StatusResponse, SupportedFormats, UploadResponse};
pub use api::transport::JobTransport;
pub use api::validate::{format_duration, format_file_size};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use job::{Job, JobPatch, JobStatus, StatusOrigin, VideoMetadata, WorkflowExecution};
pub use orchestrator::Orchestrator;
pub use steps::{derive_steps, Step, StepState, StepView};
pub use store::{SessionSnapshot, SessionStore, StoreEvent};
