//! PDF Joiner Core Library
//!
//! This library provides the core functionality for joining PDF documents:
//! - An ordered file selection with a merge-readiness state machine
//! - A typed, validated merge request
//! - A page-copy capability trait and its `lopdf` implementation
//! - The merge orchestrator that concatenates pages in request order

pub mod config;
pub mod error;
pub mod merge;
pub mod pdf;
pub mod request;
pub mod selection;
pub mod util;

pub use config::{AppConfig, MergeConfig, ServerConfig, SessionConfig};
pub use error::{Error, MergeFailed, Result};
pub use merge::{MergeOptions, MergeOrchestrator};
pub use pdf::{LopdfBackend, PdfBackend};
pub use request::{COUNT_FIELD, MergeRequest, PAYLOAD_FIELD};
pub use selection::{
    CandidateFile, FileId, MIN_MERGE_FILES, PDF_MIME, SelectedFile, SelectionPhase,
    SelectionStore,
};

/// File name of the merged document offered for download
pub const MERGED_FILENAME: &str = "merged.pdf";

/// Convenience function to merge a request with default options
pub fn merge_pdfs(request: &MergeRequest) -> std::result::Result<Vec<u8>, MergeFailed> {
    MergeOrchestrator::default().merge(request)
}
