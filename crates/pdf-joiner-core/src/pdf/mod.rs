mod backend;
mod lopdf_backend;

pub use backend::PdfBackend;
pub use lopdf_backend::{CopiedPage, LopdfBackend, OutputDocument, SourceDocument, page_count};
