use thiserror::Error;

/// Unified error type for pdf-joiner-core
///
/// This enum encompasses the internal failure causes of the library:
/// - PDF operations (decoding an input, copying pages, saving the output)
/// - Merge request validation at the boundary
/// - Selection state guards (not enough files, merge already running)
/// - Configuration loading
/// - General I/O operations
///
/// PDF failures never leave the merge orchestrator as-is: they are logged and
/// collapsed into [`MergeFailed`].
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Failed to decode one of the input documents
    #[error("failed to decode PDF #{index}: {reason}")]
    PdfDecode { index: usize, reason: String },

    /// Failed to copy pages into the output document
    #[error("failed to copy pages: {0}")]
    PdfCopy(String),

    /// Failed to serialize the output document
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    /// Error from the lopdf library
    #[error("lopdf error: {0}")]
    Lopdf(String),

    // ==========================================================================
    // Request Errors
    // ==========================================================================
    /// The merge request failed boundary validation
    #[error("invalid merge request: {0}")]
    InvalidRequest(String),

    // ==========================================================================
    // Selection Errors
    // ==========================================================================
    /// Merge was requested with fewer files than required
    #[error("at least 2 files are required to merge (have {count})")]
    NotReady { count: usize },

    /// A merge is already in flight for this selection
    #[error("a merge is already in progress")]
    MergeInProgress,

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The only failure a merge reports to its caller.
///
/// Which input failed, and why, is only logged server-side.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("failed to merge PDFs")]
pub struct MergeFailed;
