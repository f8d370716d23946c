use crate::error::Result;

/// Page-copying capability of a PDF library.
///
/// This is everything the merge orchestrator needs from a PDF library:
/// decode a document, enumerate its pages, copy pages into an output
/// document, append them, and serialize the output.
///
/// Decoded inputs and the output under construction are separate types:
/// only the output carries a page sequence being built.
pub trait PdfBackend {
    /// A decoded input document
    type Source;
    /// An output document being assembled
    type Output;
    /// A page copied into an output, not yet appended
    type Page;

    /// Create an empty output document.
    fn create(&self) -> Self::Output;

    /// Decode raw bytes into a document.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Source>;

    /// Zero-based page indices of `doc`, in document order.
    fn page_indices(&self, doc: &Self::Source) -> Vec<usize>;

    /// Copy the given pages of `src` into `dest`, in the order given.
    ///
    /// Copied pages are owned by `dest` but not part of its page sequence
    /// until appended.
    fn copy_pages(
        &self,
        dest: &mut Self::Output,
        src: &Self::Source,
        indices: &[usize],
    ) -> Result<Vec<Self::Page>>;

    /// Append a copied page to the end of the output's page sequence.
    fn append_page(&self, dest: &mut Self::Output, page: Self::Page) -> Result<()>;

    /// Serialize the output document.
    fn serialize(&self, doc: Self::Output) -> Result<Vec<u8>>;
}
