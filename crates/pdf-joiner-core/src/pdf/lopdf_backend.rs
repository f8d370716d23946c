//! [`PdfBackend`] implementation on top of `lopdf`.
//!
//! ## Copying pages between documents
//!
//! `lopdf` has no page-import API, so copying is done at the object level:
//!
//! 1. The source is cloned and renumbered so its object ids start above the
//!    output's current maximum id (no collisions, every copy gets fresh ids).
//! 2. Every object except document-level structure (catalog, page-tree
//!    nodes, outlines) is moved into the output.
//! 3. Each requested page dictionary is detached from its old page tree.
//!    Attributes it inherited from that tree are copied onto the page first.
//!
//! Pages are resolved through the source page tree (`get_pages`), never by
//! object id order, so a source whose pages were created out of order keeps
//! its visual order.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

use super::backend::PdfBackend;
use crate::config::DEFAULT_PDF_VERSION;
use crate::error::{Error, Result};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// A decoded input document.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    doc: Document,
    /// Page object ids in page order
    page_ids: Vec<ObjectId>,
}

impl SourceDocument {
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }
}

/// An output document under construction.
#[derive(Debug)]
pub struct OutputDocument {
    doc: Document,
    /// Reserved id of the output page tree root
    pages_id: ObjectId,
    /// Appended pages, in order
    kids: Vec<ObjectId>,
}

impl OutputDocument {
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }
}

/// A page dictionary copied into an output document.
#[derive(Debug, Clone)]
pub struct CopiedPage {
    id: ObjectId,
    dict: Dictionary,
}

/// `lopdf`-backed page copier.
#[derive(Debug, Clone)]
pub struct LopdfBackend {
    pdf_version: String,
    compress: bool,
}

impl Default for LopdfBackend {
    fn default() -> Self {
        Self::new(DEFAULT_PDF_VERSION, true)
    }
}

impl LopdfBackend {
    pub fn new(pdf_version: impl Into<String>, compress: bool) -> Self {
        Self {
            pdf_version: pdf_version.into(),
            compress,
        }
    }
}

impl PdfBackend for LopdfBackend {
    type Source = SourceDocument;
    type Output = OutputDocument;
    type Page = CopiedPage;

    fn create(&self) -> OutputDocument {
        let mut doc = Document::with_version(self.pdf_version.clone());
        let pages_id = doc.new_object_id();
        OutputDocument {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<SourceDocument> {
        let doc = Document::load_mem(bytes).map_err(|e| Error::Lopdf(e.to_string()))?;
        let page_ids = doc.get_pages().into_values().collect();
        Ok(SourceDocument { doc, page_ids })
    }

    fn page_indices(&self, doc: &SourceDocument) -> Vec<usize> {
        (0..doc.page_ids.len()).collect()
    }

    fn copy_pages(
        &self,
        dest: &mut OutputDocument,
        src: &SourceDocument,
        indices: &[usize],
    ) -> Result<Vec<CopiedPage>> {
        let page_count = src.page_ids.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= page_count) {
            return Err(Error::PdfCopy(format!(
                "page index {bad} out of range (0..{page_count})"
            )));
        }

        // Renumbering rewrites ids in place; pages are re-resolved afterwards
        let mut source = src.doc.clone();
        source.renumber_objects_with(dest.doc.max_id + 1);
        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        if page_ids.len() != page_count {
            return Err(Error::PdfCopy(format!(
                "page tree changed while renumbering ({page_count} -> {} pages)",
                page_ids.len()
            )));
        }

        // Flatten inherited attributes before the page tree is dropped
        let mut dicts = Vec::with_capacity(indices.len());
        for &index in indices {
            let page_id = page_ids[index];
            let mut dict = source
                .get_object(page_id)
                .and_then(Object::as_dict)
                .map_err(|e| Error::PdfCopy(format!("page {index} is not a dictionary: {e}")))?
                .clone();

            for key in INHERITABLE_KEYS {
                if !dict.has(key)
                    && let Some(value) = inherited_attribute(&source, &dict, key)
                {
                    dict.set(key, value);
                }
            }
            dict.remove(b"Parent");
            dicts.push((page_id, dict));
        }

        // Move shared objects (content streams, fonts, images...) over
        let all_pages: HashSet<ObjectId> = page_ids.iter().copied().collect();
        let source_max_id = source.max_id;
        for (id, object) in source.objects {
            if all_pages.contains(&id) {
                continue;
            }
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Outlines" | b"Outline" => {}
                _ => {
                    dest.doc.objects.insert(id, object);
                }
            }
        }
        dest.doc.max_id = dest.doc.max_id.max(source_max_id);

        // A page requested twice needs its own object id the second time
        let mut seen = HashSet::with_capacity(dicts.len());
        let copied = dicts
            .into_iter()
            .map(|(page_id, dict)| {
                let id = if seen.insert(page_id) {
                    page_id
                } else {
                    dest.doc.new_object_id()
                };
                CopiedPage { id, dict }
            })
            .collect();

        Ok(copied)
    }

    fn append_page(&self, dest: &mut OutputDocument, page: CopiedPage) -> Result<()> {
        if dest.kids.contains(&page.id) {
            return Err(Error::PdfCopy(format!(
                "page object {} {} R already appended",
                page.id.0, page.id.1
            )));
        }

        let mut dict = page.dict;
        dict.set("Parent", Object::Reference(dest.pages_id));
        dest.doc.objects.insert(page.id, Object::Dictionary(dict));
        dest.kids.push(page.id);
        Ok(())
    }

    fn serialize(&self, output: OutputDocument) -> Result<Vec<u8>> {
        let OutputDocument {
            mut doc,
            pages_id,
            kids,
        } = output;

        let count = i64::try_from(kids.len())
            .map_err(|_| Error::PdfSave("too many pages".to_string()))?;

        let pages_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            (
                "Kids",
                Object::Array(kids.into_iter().map(Object::Reference).collect()),
            ),
            ("Count", Object::Integer(count)),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        if self.compress {
            doc.compress();
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| Error::PdfSave(e.to_string()))?;
        Ok(buffer)
    }
}

/// Look up `key` on the ancestors of a page, nearest first.
fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_object(parent?).and_then(Object::as_dict).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}

/// Number of pages in a PDF.
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    let doc = Document::load_mem(bytes).map_err(|e| Error::Lopdf(e.to_string()))?;
    Ok(doc.get_pages().len())
}
