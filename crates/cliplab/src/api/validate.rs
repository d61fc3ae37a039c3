//! Client-side file validation and display helpers.
//!
//! Validation mirrors the backend's upload rules (extension allow-list,
//! size cap) so obviously bad files are rejected before any network call.

use std::path::Path;

use crate::api::models::SupportedFormats;
use crate::error::{ClientError, Result};

/// Returns the lowercased extension of a path, without the dot.
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Guesses a MIME type for the multipart upload part.
pub fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Validates a candidate upload against the cached format list.
///
/// Returns a [`ClientError::Validation`] describing the first failed check;
/// these never reach the session store's error field.
pub fn validate_upload(path: &Path, size: u64, formats: &SupportedFormats) -> Result<()> {
    let extension = file_extension(path).ok_or_else(|| {
        ClientError::Validation(format!("File {:?} has no extension", path.file_name()))
    })?;

    if !formats
        .supported_formats
        .iter()
        .any(|f| f.eq_ignore_ascii_case(&extension))
    {
        return Err(ClientError::Validation(format!(
            "Unsupported video format '{}'. Allowed: {}",
            extension,
            formats.supported_formats.join(", ")
        )));
    }

    if size > formats.max_file_size {
        return Err(ClientError::Validation(format!(
            "File too large ({}). Maximum size: {}",
            format_file_size(size),
            format_file_size(formats.max_file_size)
        )));
    }

    Ok(())
}

/// Validates a processing prompt the way the backend does: non-blank,
/// at most 1000 characters. Returns the trimmed prompt.
pub fn validate_prompt(prompt: &str) -> Result<String> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Validation(
            "Prompt cannot be empty or just whitespace".to_string(),
        ));
    }
    if trimmed.chars().count() > 1000 {
        return Err(ClientError::Validation(
            "Prompt is longer than 1000 characters".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Formats a byte count for display, e.g. `12.4 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;

    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes / KB)
    } else {
        format!("{} B", bytes as u64)
    }
}

/// Formats a duration in seconds as `m:ss` (or `h:mm:ss` past an hour).
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
