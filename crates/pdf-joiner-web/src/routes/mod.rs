//! HTTP route handlers for the PDF joiner web application.
//!
//! Selection routes return HTML fragments (for HTMX consumption) or a JSON
//! summary; merge routes return the merged PDF as an attachment.

mod files;
mod merge;
mod pages;

pub use files::{add_files, file_list, list_files, remove_file, reorder_files, start_session};
pub use merge::{merge_request, merge_session};
pub use pages::{index, join_page};

use axum_extra::extract::Multipart;
use pdf_joiner_core::CandidateFile;
use serde::Deserialize as SerdeDeserialize;

use crate::helpers::{ResultExt, RouteResult};

/// Reorder form: one `order` field per file id, in the new order.
#[derive(SerdeDeserialize, Default)]
pub struct ReorderForm {
    #[serde(default)]
    pub order: Vec<String>,
}

/// Collect every file uploaded under `field_name`, in submission order.
///
/// Other fields are skipped. Content types are taken as the browser sent them;
/// filtering happens in the selection.
pub async fn read_files(
    multipart: &mut Multipart,
    field_name: &str,
) -> RouteResult<Vec<CandidateFile>> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.or_bad_request()? {
        if field.name() != Some(field_name) {
            continue;
        }
        let name = field.file_name().unwrap_or("document.pdf").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.or_bad_request()?;
        files.push(CandidateFile::new(name, content_type, data));
    }

    Ok(files)
}
