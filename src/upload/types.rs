//! Upload types for the session tracker

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Progress reported while the endpoint call is in flight
pub const PROGRESS_UPLOADING: u8 = 50;

/// Progress of a successful upload
pub const PROGRESS_COMPLETE: u8 = 100;

/// Largest file the picker accepts: 10MB
pub const MAX_ACCEPTED_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// File extensions the picker accepts
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Message shown when the endpoint rejects an upload
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed. Please try again.";

/// Status string carried by a successful receipt
pub const UPLOAD_SUCCESS_STATUS: &str = "Success";

// ============================================================================
// File Handle
// ============================================================================

/// Opaque, read-only handle to a file payload
///
/// Cloning shares the underlying bytes.
#[derive(Clone)]
pub struct FileRef {
    inner: Arc<FileData>,
}

struct FileData {
    name: String,
    content: Vec<u8>,
}

impl FileRef {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(FileData {
                name: name.into(),
                content,
            }),
        }
    }

    /// Read a file from disk
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, content))
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn size(&self) -> u64 {
        self.inner.content.len() as u64
    }

    pub fn content(&self) -> &[u8] {
        &self.inner.content
    }

    /// Guess the MIME type from the file extension
    pub fn mime_type(&self) -> String {
        mime_guess::from_path(self.name())
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

impl fmt::Debug for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRef")
            .field("name", &self.name())
            .field("size", &self.size())
            .finish()
    }
}

/// Whether the upload picker would offer this file
pub fn is_accepted_file(name: &str, size: u64) -> bool {
    let extension = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());

    match extension {
        Some(ext) => ACCEPTED_EXTENSIONS.contains(&ext.as_str()) && size <= MAX_ACCEPTED_FILE_SIZE,
        None => false,
    }
}

// ============================================================================
// Entry Types
// ============================================================================

static NEXT_ENTRY_SEQ: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of an upload entry
///
/// A process-wide counter plus a random suffix; never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn generate() -> Self {
        let seq = NEXT_ENTRY_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("file-{}-{}", seq, Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upload entry status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    /// Created, request not yet started
    Pending,
    /// Endpoint call in flight
    Uploading,
    /// Endpoint accepted the file
    Success,
    /// Endpoint rejected the file or the call failed
    Error,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Uploading => "Uploading",
            Self::Success => "Success",
            Self::Error => "Error",
        }
    }

    /// Text color used for the status label
    pub fn color_class(self) -> &'static str {
        match self {
            Self::Pending => "text-gray-600",
            Self::Uploading => "text-blue-600",
            Self::Success => "text-green-600",
            Self::Error => "text-red-600",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked file submission
#[derive(Debug, Clone, Serialize)]
pub struct UploadEntry {
    pub id: EntryId,

    #[serde(skip)]
    pub file: FileRef,

    /// File name captured at submission
    pub name: String,

    /// File size captured at submission
    pub size: u64,

    pub status: UploadStatus,

    /// Coarse progress, 0..=100
    pub progress: u8,

    /// Endpoint calls made so far
    pub attempts: u32,

    /// Failure message once in `Error`
    pub error: Option<String>,

    /// Endpoint record once in `Success`
    pub receipt: Option<UploadReceipt>,
}

impl UploadEntry {
    pub fn new(file: FileRef) -> Self {
        Self {
            id: EntryId::generate(),
            name: file.name().to_string(),
            size: file.size(),
            file,
            status: UploadStatus::Pending,
            progress: 0,
            attempts: 0,
            error: None,
            receipt: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Success record returned by the upload endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub status: String,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadReceipt {
    pub fn for_file(file: &FileRef) -> Self {
        let now = Utc::now();
        Self {
            id: format!("file-{}", now.timestamp_millis()),
            name: file.name().to_string(),
            size: file.size(),
            status: UPLOAD_SUCCESS_STATUS.to_string(),
            uploaded_at: now,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Upload error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    Rejected(String),

    #[error("Upload endpoint unreachable: {0}")]
    Transport(String),

    #[error("Upload timed out after {0:?}")]
    Timeout(Duration),

    #[error("Upload task failed: {0}")]
    TaskFailed(String),

    #[error("Upload entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("Upload entry {id} is still {status}")]
    NotTerminal { id: EntryId, status: UploadStatus },
}

impl UploadError {
    /// Whether this failure came from an unexpected fault rather than the endpoint's answer
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::TaskFailed(_))
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Human-readable file size, base 1024
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_captures_metadata() {
        let file = FileRef::new("lease.pdf", vec![0u8; 2048]);
        let entry = UploadEntry::new(file);

        assert_eq!(entry.name, "lease.pdf");
        assert_eq!(entry.size, 2048);
        assert_eq!(entry.status, UploadStatus::Pending);
        assert_eq!(entry.progress, 0);
        assert!(entry.id.as_str().starts_with("file-"));
    }

    #[test]
    fn test_entry_ids_are_unique() {
        let file = FileRef::new("a.pdf", Vec::new());
        let first = UploadEntry::new(file.clone());
        let second = UploadEntry::new(file);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_accepted_files() {
        assert!(is_accepted_file("msa.pdf", 1024));
        assert!(is_accepted_file("NDA.DOCX", 1024));
        assert!(is_accepted_file("terms.doc", MAX_ACCEPTED_FILE_SIZE));
        assert!(!is_accepted_file("terms.doc", MAX_ACCEPTED_FILE_SIZE + 1));
        assert!(!is_accepted_file("notes.txt", 10));
        assert!(!is_accepted_file("README", 10));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(FileRef::new("a.pdf", Vec::new()).mime_type(), "application/pdf");
        assert_eq!(
            FileRef::new("blob", Vec::new()).mime_type(),
            "application/octet-stream"
        );
    }
}
