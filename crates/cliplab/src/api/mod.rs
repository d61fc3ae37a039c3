//! Transport adapter for the remote job service.
//!
//! Wire types, the `JobTransport` seam, the reqwest-backed implementation,
//! and the client-side validation that runs before any request is issued.

pub mod http;
pub mod models;
pub mod transport;
pub mod validate;

pub use http::HttpTransport;
pub use models::{
    DeleteResponse, ProcessRequest, StatusResponse, SupportedFormats, UploadResponse,
};
pub use transport::JobTransport;
pub use validate::{format_duration, format_file_size, validate_upload};
