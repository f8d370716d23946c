//! File selection and ordering.
//!
//! A [`SelectionStore`] is the user's ordered working set of PDF files. List
//! order is merge order. The store also tracks whether a merge is in flight,
//! which together with the file count gives the [`SelectionPhase`] the UI
//! renders from.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::request::MergeRequest;
use crate::util::{unix_millis, url_safe};

/// The only content type accepted into a selection.
pub const PDF_MIME: &str = "application/pdf";

/// Minimum number of files before a merge can be started.
pub const MIN_MERGE_FILES: usize = 2;

/// Opaque identifier of a selected file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A file offered for selection (one dropped or picked file).
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    /// Declared content type, as reported by the browser
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Whether the declared content type is exactly `application/pdf`.
    pub fn is_pdf(&self) -> bool {
        self.content_type.as_deref() == Some(PDF_MIME)
    }
}

/// A file in the selection.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    id: FileId,
    display_name: String,
    bytes: Bytes,
}

impl SelectedFile {
    pub const fn id(&self) -> &FileId {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Raw file contents (O(1) clone).
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Where the selection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPhase {
    /// No files
    Idle,
    /// At least one file, not enough to merge
    HasFiles,
    /// Enough files to merge
    Ready,
    /// A merge request is in flight
    Merging,
}

impl SelectionPhase {
    pub const fn from_state(count: usize, merging: bool) -> Self {
        if merging {
            Self::Merging
        } else if count >= MIN_MERGE_FILES {
            Self::Ready
        } else if count > 0 {
            Self::HasFiles
        } else {
            Self::Idle
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::HasFiles => "has_files",
            Self::Ready => "ready",
            Self::Merging => "merging",
        }
    }
}

/// Ordered working set of PDF files for one user.
#[derive(Debug, Default)]
pub struct SelectionStore {
    files: Vec<SelectedFile>,
    /// Disambiguates ids of files selected in the same millisecond
    next_seq: u64,
    merging: bool,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the PDF candidates to the end of the list.
    ///
    /// Candidates whose declared content type is not `application/pdf`, or
    /// that have no bytes, are dropped without error. Returns how many files
    /// were accepted.
    pub fn add(&mut self, candidates: impl IntoIterator<Item = CandidateFile>) -> usize {
        let before = self.files.len();
        let millis = unix_millis();

        for candidate in candidates {
            if !candidate.is_pdf() {
                tracing::debug!(
                    "Dropping non-PDF file {} ({})",
                    candidate.name,
                    candidate.content_type.as_deref().unwrap_or("no content type")
                );
                continue;
            }
            if candidate.bytes.is_empty() {
                tracing::debug!("Dropping empty file {}", candidate.name);
                continue;
            }

            let id = FileId(format!(
                "{}-{}-{}",
                url_safe(&candidate.name),
                millis,
                self.next_seq
            ));
            self.next_seq += 1;

            self.files.push(SelectedFile {
                id,
                display_name: candidate.name,
                bytes: candidate.bytes,
            });
        }

        self.files.len() - before
    }

    /// Remove the file with the given id. Unknown ids are ignored.
    ///
    /// Returns whether anything was removed.
    pub fn remove(&mut self, id: &FileId) -> bool {
        let before = self.files.len();
        self.files.retain(|f| &f.id != id);
        self.files.len() != before
    }

    /// Replace the list with the given ordering of ids.
    ///
    /// The ordering is trusted to be a permutation of the current ids and is
    /// not validated: unknown ids are skipped, omitted ids are dropped and
    /// repeated ids repeat their file.
    pub fn reorder(&mut self, new_order: &[FileId]) {
        let by_id: HashMap<&FileId, &SelectedFile> =
            self.files.iter().map(|f| (&f.id, f)).collect();

        let reordered: Vec<SelectedFile> = new_order
            .iter()
            .filter_map(|id| by_id.get(id).map(|f| (*f).clone()))
            .collect();

        self.files = reordered;
    }

    /// Files in merge order.
    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn get(&self, id: &FileId) -> Option<&SelectedFile> {
        self.files.iter().find(|f| &f.id == id)
    }

    /// Current ids in merge order.
    pub fn ids(&self) -> Vec<FileId> {
        self.files.iter().map(|f| f.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(SelectedFile::size).sum()
    }

    pub const fn is_merging(&self) -> bool {
        self.merging
    }

    pub fn phase(&self) -> SelectionPhase {
        SelectionPhase::from_state(self.files.len(), self.merging)
    }

    pub fn can_merge(&self) -> bool {
        self.phase() == SelectionPhase::Ready
    }

    /// Enter the merging phase and snapshot the current order.
    ///
    /// Fails with `NotReady` below [`MIN_MERGE_FILES`] files and with
    /// `MergeInProgress` if a merge is already running. Later changes to the
    /// store do not affect the returned request.
    pub fn begin_merge(&mut self) -> Result<MergeRequest> {
        if self.merging {
            return Err(Error::MergeInProgress);
        }
        if self.files.len() < MIN_MERGE_FILES {
            return Err(Error::NotReady {
                count: self.files.len(),
            });
        }

        let request = MergeRequest::from_files(self.files.iter().map(SelectedFile::bytes).collect())?;
        self.merging = true;
        Ok(request)
    }

    /// Leave the merging phase, whatever the merge outcome.
    ///
    /// The selection itself is left as it was.
    pub fn finish_merge(&mut self) {
        self.merging = false;
    }
}
