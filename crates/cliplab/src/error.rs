use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the client.
///
/// Remote-call failures are normalized into this taxonomy before they reach
/// the session store; orchestrator operations never propagate raw transport
/// errors.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The file failed client-side validation and no request was issued.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The backend does not know the job id (stale or deleted).
    #[error("Job not found: {0}")]
    NotFound(String),

    /// The backend rejected the upload as too large.
    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    /// The operation is not valid for the job's current state
    /// (e.g. starting processing on a job that is not pending).
    #[error("Invalid job state: {0}")]
    InvalidState(String),

    /// The backend returned a server-side failure or a malformed response.
    #[error("Server error: {0}")]
    Server(String),

    /// No response: connection refused, DNS failure, or timeout.
    #[error("Connection failed: {0}")]
    Connectivity(String),

    /// A response arrived for a job that is no longer current. Never shown
    /// to the user; the caller drops the response.
    #[error("Stale response for job {0} discarded")]
    StateGuardRejected(String),

    /// Local filesystem error while reading an upload or writing a download.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Maps an HTTP status code and error detail to the client taxonomy.
    pub fn from_status(status: u16, detail: String) -> Self {
        match status {
            400 => ClientError::Validation(detail),
            404 => ClientError::NotFound(detail),
            413 => ClientError::PayloadTooLarge(detail),
            500..=599 => ClientError::Server(format!("{}: {}", status, detail)),
            other => ClientError::Server(format!("unexpected status {}: {}", other, detail)),
        }
    }

    /// Returns true if this error should be kept out of the store's
    /// user-visible error field.
    pub fn is_silent(&self) -> bool {
        matches!(self, ClientError::StateGuardRejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ClientError::from_status(400, "bad".into()),
            ClientError::Validation(_)
        ));
        assert!(matches!(
            ClientError::from_status(404, "gone".into()),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            ClientError::from_status(413, "big".into()),
            ClientError::PayloadTooLarge(_)
        ));
        assert!(matches!(
            ClientError::from_status(500, "boom".into()),
            ClientError::Server(_)
        ));
        assert!(matches!(
            ClientError::from_status(503, "busy".into()),
            ClientError::Server(_)
        ));
    }

    #[test]
    fn test_guard_rejections_are_silent() {
        assert!(ClientError::StateGuardRejected("abc".into()).is_silent());
        assert!(!ClientError::Server("oops".into()).is_silent());
    }
}
