//! Typed merge request.
//!
//! A merge request is an ordered snapshot of PDF byte buffers together with
//! the number of files the sender claims to have sent. It is validated once,
//! at construction, so the orchestrator never sees a malformed request.

use bytes::Bytes;

use crate::error::{Error, Result};

/// Multipart field carrying the ordered PDF entries.
pub const PAYLOAD_FIELD: &str = "pdfs";

/// Multipart field carrying the declared number of PDF entries.
pub const COUNT_FIELD: &str = "count";

/// An ordered, validated sequence of PDF byte buffers to merge.
///
/// Position is the only identity a file has here. Buffers are shared
/// (`Bytes`), so building a request from a selection does not copy file
/// contents.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    files: Vec<Bytes>,
}

impl MergeRequest {
    /// Build a request, checking the declared count against the payload.
    pub fn new(count: usize, files: Vec<Bytes>) -> Result<Self> {
        if count != files.len() {
            return Err(Error::InvalidRequest(format!(
                "declared {count} files but received {}",
                files.len()
            )));
        }
        Self::from_files(files)
    }

    /// Build a request whose count is implied by the payload.
    pub fn from_files(files: Vec<Bytes>) -> Result<Self> {
        if files.is_empty() {
            return Err(Error::InvalidRequest("no files to merge".to_string()));
        }

        if let Some(index) = files.iter().position(Bytes::is_empty) {
            return Err(Error::InvalidRequest(format!("file #{index} is empty")));
        }

        Ok(Self { files })
    }

    /// Number of files in the request (always at least 1).
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Never true for a constructed request.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files in merge order.
    pub fn files(&self) -> &[Bytes] {
        &self.files
    }

    /// Total payload size in bytes.
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(Bytes::len).sum()
    }
}
