//! Merge orchestration.
//!
//! The orchestrator walks a [`MergeRequest`] strictly in order: decode a
//! file, copy all of its pages in document order, append them, move on to
//! the next file. Page order in the output is therefore the concatenation of
//! each input's pages, inputs taken in request order.
//!
//! Every internal failure is logged with its detail and reported to the
//! caller as the opaque [`MergeFailed`].

use tracing::{debug, error, info};

use crate::config::{DEFAULT_PDF_VERSION, MergeConfig};
use crate::error::{Error, MergeFailed, Result};
use crate::pdf::{LopdfBackend, PdfBackend};
use crate::request::MergeRequest;
use crate::util::format_size;

/// Output options for a merge.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Compress content streams of the output
    pub compress: bool,
    /// PDF header version of the output
    pub pdf_version: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            compress: true,
            pdf_version: DEFAULT_PDF_VERSION.to_string(),
        }
    }
}

impl From<&MergeConfig> for MergeOptions {
    fn from(config: &MergeConfig) -> Self {
        Self {
            compress: config.compress,
            pdf_version: config.pdf_version.clone(),
        }
    }
}

/// Merged document together with what went into it.
#[derive(Debug)]
struct Merged {
    bytes: Vec<u8>,
    pages: usize,
}

/// Concatenates PDFs through a [`PdfBackend`].
///
/// Holds no per-request state; one instance can serve any number of
/// concurrent merges.
#[derive(Debug, Clone)]
pub struct MergeOrchestrator<B = LopdfBackend> {
    backend: B,
}

impl MergeOrchestrator<LopdfBackend> {
    /// Orchestrator over the `lopdf` backend.
    pub fn new(options: &MergeOptions) -> Self {
        Self::with_backend(LopdfBackend::new(
            options.pdf_version.clone(),
            options.compress,
        ))
    }
}

impl Default for MergeOrchestrator<LopdfBackend> {
    fn default() -> Self {
        Self::new(&MergeOptions::default())
    }
}

impl<B: PdfBackend> MergeOrchestrator<B> {
    pub const fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Merge the request's files into one PDF.
    ///
    /// Fails as a whole: if any file cannot be decoded or copied, or the
    /// result cannot be serialized, no output is produced.
    pub fn merge(&self, request: &MergeRequest) -> std::result::Result<Vec<u8>, MergeFailed> {
        match self.try_merge(request) {
            Ok(merged) => {
                info!(
                    "Merged {} files into {} pages ({})",
                    request.len(),
                    merged.pages,
                    format_size(merged.bytes.len())
                );
                Ok(merged.bytes)
            }
            Err(e) => {
                error!("Error merging PDFs: {}", e);
                Err(MergeFailed)
            }
        }
    }

    fn try_merge(&self, request: &MergeRequest) -> Result<Merged> {
        let mut output = self.backend.create();
        let mut pages = 0;

        for (index, bytes) in request.files().iter().enumerate() {
            let source = self.backend.decode(bytes).map_err(|e| Error::PdfDecode {
                index,
                reason: e.to_string(),
            })?;

            let indices = self.backend.page_indices(&source);
            let copied = self.backend.copy_pages(&mut output, &source, &indices)?;
            debug!("Copied {} pages from file #{}", copied.len(), index);

            for page in copied {
                self.backend.append_page(&mut output, page)?;
                pages += 1;
            }
        }

        let bytes = self.backend.serialize(output)?;
        Ok(Merged { bytes, pages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::cell::RefCell;

    /// Backend over a toy text format: "A:3" is a document named A with three
    /// pages. Output serializes to page labels joined by commas.
    #[derive(Default)]
    struct LabelBackend {
        /// Decode calls, in order
        decoded: RefCell<Vec<String>>,
        fail_serialize: bool,
    }

    impl PdfBackend for LabelBackend {
        type Source = (String, usize);
        type Output = Vec<String>;
        type Page = String;

        fn create(&self) -> Vec<String> {
            Vec::new()
        }

        fn decode(&self, bytes: &[u8]) -> Result<(String, usize)> {
            let text = std::str::from_utf8(bytes).map_err(|e| Error::Lopdf(e.to_string()))?;
            let (name, pages) = text
                .split_once(':')
                .ok_or_else(|| Error::Lopdf(format!("not a document: {text}")))?;
            let pages = pages.parse().map_err(|_| Error::Lopdf("bad page count".to_string()))?;
            self.decoded.borrow_mut().push(name.to_string());
            Ok((name.to_string(), pages))
        }

        fn page_indices(&self, doc: &(String, usize)) -> Vec<usize> {
            (0..doc.1).collect()
        }

        fn copy_pages(
            &self,
            _dest: &mut Vec<String>,
            src: &(String, usize),
            indices: &[usize],
        ) -> Result<Vec<String>> {
            Ok(indices.iter().map(|i| format!("{}{}", src.0, i + 1)).collect())
        }

        fn append_page(&self, dest: &mut Vec<String>, page: String) -> Result<()> {
            dest.push(page);
            Ok(())
        }

        fn serialize(&self, doc: Vec<String>) -> Result<Vec<u8>> {
            if self.fail_serialize {
                return Err(Error::PdfSave("disk full".to_string()));
            }
            Ok(doc.join(",").into_bytes())
        }
    }

    fn request(docs: &[&'static str]) -> MergeRequest {
        MergeRequest::from_files(docs.iter().map(|d| Bytes::from_static(d.as_bytes())).collect())
            .unwrap()
    }

    #[test]
    fn test_pages_concatenated_in_request_order() {
        let orchestrator = MergeOrchestrator::with_backend(LabelBackend::default());

        let out = orchestrator.merge(&request(&["A:2", "B:3"])).unwrap();
        assert_eq!(out, b"A1,A2,B1,B2,B3");

        let out = orchestrator.merge(&request(&["B:3", "A:2"])).unwrap();
        assert_eq!(out, b"B1,B2,B3,A1,A2");
    }

    #[test]
    fn test_single_input() {
        let orchestrator = MergeOrchestrator::with_backend(LabelBackend::default());
        let out = orchestrator.merge(&request(&["Solo:2"])).unwrap();
        assert_eq!(out, b"Solo1,Solo2");
    }

    #[test]
    fn test_files_processed_sequentially() {
        let orchestrator = MergeOrchestrator::with_backend(LabelBackend::default());
        orchestrator.merge(&request(&["C:1", "A:1", "B:1"])).unwrap();
        assert_eq!(*orchestrator.backend().decoded.borrow(), ["C", "A", "B"]);
    }

    #[test]
    fn test_corrupt_input_fails_whole_merge() {
        let orchestrator = MergeOrchestrator::with_backend(LabelBackend::default());
        let result = orchestrator.merge(&request(&["A:2", "garbage", "B:1"]));
        assert_eq!(result, Err(MergeFailed));

        // Nothing after the corrupt file was touched
        assert_eq!(*orchestrator.backend().decoded.borrow(), ["A"]);
    }

    #[test]
    fn test_serialize_failure_is_opaque() {
        let orchestrator = MergeOrchestrator::with_backend(LabelBackend {
            fail_serialize: true,
            ..Default::default()
        });
        let err = orchestrator.merge(&request(&["A:1", "B:1"])).unwrap_err();
        assert_eq!(err.to_string(), "failed to merge PDFs");
    }

    #[test]
    fn test_decode_error_names_file() {
        let orchestrator = MergeOrchestrator::with_backend(LabelBackend::default());
        let err = orchestrator.try_merge(&request(&["A:1", "nope"])).unwrap_err();
        assert!(matches!(err, Error::PdfDecode { index: 1, .. }));
    }

    #[test]
    fn test_options_from_config() {
        let config = MergeConfig {
            compress: false,
            pdf_version: "1.7".to_string(),
        };
        let options = MergeOptions::from(&config);
        assert!(!options.compress);
        assert_eq!(options.pdf_version, "1.7");
    }
}
