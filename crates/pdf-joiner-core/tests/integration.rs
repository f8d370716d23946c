//! Integration tests for pdf-joiner-core
//!
//! These tests verify the end-to-end workflow:
//! - Selecting, reordering and removing files
//! - Snapshotting the selection into a merge request
//! - Merging real PDFs through the lopdf backend
//! - Whole-merge failure on corrupt input

use bytes::Bytes;
use lopdf::{Dictionary, Document, Object, Stream};
use pdf_joiner_core::{
    CandidateFile, FileId, MergeFailed, MergeOptions, MergeOrchestrator, MergeRequest, PDF_MIME,
    SelectionStore, merge_pdfs, pdf::page_count,
};

// =============================================================================
// Test Fixtures
// =============================================================================

/// Create a PDF with `pages` pages, page n showing "{label}-{n}".
fn labelled_pdf(label: &str, pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
    )]));

    let kids: Vec<Object> = (1..=pages)
        .map(|n| {
            let content = format!("BT /F1 24 Tf 72 720 Td ({label}-{n}) Tj ET");
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
            let page_id = doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
                (
                    "MediaBox",
                    Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
                ),
            ]));
            Object::Reference(page_id)
        })
        .collect();

    let count = i64::try_from(pages).unwrap();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
            ("Resources", Object::Reference(resources_id)),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Labels of every page in a merged document, in page order.
fn page_labels(pdf: &[u8]) -> Vec<String> {
    let mut doc = Document::load_mem(pdf).unwrap();
    doc.decompress();
    doc.get_pages()
        .into_values()
        .map(|id| {
            let content = String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned();
            let start = content.find('(').unwrap() + 1;
            let end = content[start..].find(')').unwrap() + start;
            content[start..end].to_string()
        })
        .collect()
}

fn candidate(name: &str, pdf: Vec<u8>) -> CandidateFile {
    CandidateFile::new(name, Some(PDF_MIME.to_string()), pdf)
}

fn merge_store(store: &mut SelectionStore) -> Vec<u8> {
    let request = store.begin_merge().unwrap();
    let result = merge_pdfs(&request);
    store.finish_merge();
    result.unwrap()
}

fn labels(expected: &[&str]) -> Vec<String> {
    expected.iter().map(ToString::to_string).collect()
}

// =============================================================================
// Page Order Tests
// =============================================================================

#[test]
fn test_two_then_three_pages() {
    let request = MergeRequest::new(
        2,
        vec![
            Bytes::from(labelled_pdf("A", 2)),
            Bytes::from(labelled_pdf("B", 3)),
        ],
    )
    .unwrap();

    let merged = merge_pdfs(&request).unwrap();
    assert_eq!(page_count(&merged).unwrap(), 5);
    assert_eq!(page_labels(&merged), labels(&["A-1", "A-2", "B-1", "B-2", "B-3"]));
}

#[test]
fn test_reversed_order() {
    let request = MergeRequest::new(
        2,
        vec![
            Bytes::from(labelled_pdf("B", 3)),
            Bytes::from(labelled_pdf("A", 2)),
        ],
    )
    .unwrap();

    let merged = merge_pdfs(&request).unwrap();
    assert_eq!(page_labels(&merged), labels(&["B-1", "B-2", "B-3", "A-1", "A-2"]));
}

#[test]
fn test_page_positions_for_many_inputs() {
    let counts = [1_usize, 4, 2, 3];
    let names = ["P", "Q", "R", "S"];
    let files = names
        .iter()
        .zip(counts)
        .map(|(name, count)| Bytes::from(labelled_pdf(name, count)))
        .collect();

    let merged = merge_pdfs(&MergeRequest::from_files(files).unwrap()).unwrap();
    let actual = page_labels(&merged);
    assert_eq!(actual.len(), counts.iter().sum::<usize>());

    // Page i of input k sits at p1 + ... + p(k-1) + i
    let mut offset = 0;
    for (name, count) in names.iter().zip(counts) {
        for i in 1..=count {
            assert_eq!(actual[offset + i - 1], format!("{name}-{i}"));
        }
        offset += count;
    }
}

#[test]
fn test_single_file_keeps_pages() {
    let request = MergeRequest::from_files(vec![Bytes::from(labelled_pdf("Solo", 3))]).unwrap();
    let merged = merge_pdfs(&request).unwrap();
    assert_eq!(page_labels(&merged), labels(&["Solo-1", "Solo-2", "Solo-3"]));
}

#[test]
fn test_same_file_twice() {
    let pdf = Bytes::from(labelled_pdf("Twin", 2));
    let request = MergeRequest::from_files(vec![pdf.clone(), pdf]).unwrap();
    let merged = merge_pdfs(&request).unwrap();
    assert_eq!(
        page_labels(&merged),
        labels(&["Twin-1", "Twin-2", "Twin-1", "Twin-2"])
    );
}

#[test]
fn test_uncompressed_output_option() {
    let orchestrator = MergeOrchestrator::new(&MergeOptions {
        compress: false,
        pdf_version: "1.7".to_string(),
    });
    let request = MergeRequest::from_files(vec![
        Bytes::from(labelled_pdf("A", 1)),
        Bytes::from(labelled_pdf("B", 1)),
    ])
    .unwrap();

    let merged = orchestrator.merge(&request).unwrap();
    assert!(merged.starts_with(b"%PDF-1.7"));
    assert_eq!(page_labels(&merged), labels(&["A-1", "B-1"]));
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_corrupt_file_fails_whole_merge() {
    let request = MergeRequest::from_files(vec![
        Bytes::from(labelled_pdf("A", 2)),
        Bytes::from_static(b"this is not a PDF at all"),
        Bytes::from(labelled_pdf("B", 1)),
    ])
    .unwrap();

    assert_eq!(merge_pdfs(&request), Err(MergeFailed));
}

// =============================================================================
// Selection → Merge Tests
// =============================================================================

#[test]
fn test_reorder_changes_block_order_only() {
    let mut store = SelectionStore::new();
    store.add([candidate("a.pdf", labelled_pdf("A", 2)), candidate("b.pdf", labelled_pdf("B", 3))]);

    let merged = merge_store(&mut store);
    assert_eq!(page_labels(&merged), labels(&["A-1", "A-2", "B-1", "B-2", "B-3"]));

    let ids = store.ids();
    store.reorder(&[ids[1].clone(), ids[0].clone()]);

    let merged = merge_store(&mut store);
    assert_eq!(page_labels(&merged), labels(&["B-1", "B-2", "B-3", "A-1", "A-2"]));
}

#[test]
fn test_remove_excludes_pages() {
    let mut store = SelectionStore::new();
    store.add([
        candidate("a.pdf", labelled_pdf("A", 1)),
        candidate("b.pdf", labelled_pdf("B", 2)),
        candidate("c.pdf", labelled_pdf("C", 1)),
    ]);

    let b: FileId = store.ids()[1].clone();
    store.remove(&b);

    let merged = merge_store(&mut store);
    assert_eq!(page_labels(&merged), labels(&["A-1", "C-1"]));
}

#[test]
fn test_non_pdf_never_reaches_merge() {
    let mut store = SelectionStore::new();
    store.add([
        candidate("a.pdf", labelled_pdf("A", 1)),
        CandidateFile::new("evil.pdf", Some("text/plain".to_string()), b"not a pdf".to_vec()),
        candidate("b.pdf", labelled_pdf("B", 1)),
    ]);
    assert_eq!(store.len(), 2);

    let merged = merge_store(&mut store);
    assert_eq!(page_labels(&merged), labels(&["A-1", "B-1"]));
}

#[test]
fn test_selection_survives_merge() {
    let mut store = SelectionStore::new();
    store.add([candidate("a.pdf", labelled_pdf("A", 1)), candidate("b.pdf", labelled_pdf("B", 1))]);

    let first = merge_store(&mut store);
    assert_eq!(store.len(), 2);
    assert!(store.can_merge());

    let second = merge_store(&mut store);
    assert_eq!(page_labels(&first), page_labels(&second));
}
