//! Askama templates for HTMX responses.
//!
//! ## Template Structure
//!
//! - `base.html` - Common layout with CSS/JS
//! - `index.html` - Landing page with the first upload form
//! - `app.html` - Dropzone plus the selection for one session
//! - `partials/file_list.html` - Ordered file list and merge button; swapped
//!   into `#file-list` after every add, remove and reorder, and after a merge
//!
//! The merge button lives inside the file list so its enabled state is
//! always rendered from the same selection snapshot as the list itself.

use askama::Template;
use askama_web::WebTemplate;
use pdf_joiner_core::{MERGED_FILENAME, SelectedFile, SelectionStore, util::format_size};

/// One row of the file list.
pub struct FileRow {
    pub id: String,
    pub name: String,
    pub size: String,
}

impl From<&SelectedFile> for FileRow {
    fn from(file: &SelectedFile) -> Self {
        Self {
            id: file.id().to_string(),
            name: file.display_name().to_string(),
            size: format_size(file.size()),
        }
    }
}

/// Everything the file list partial renders.
pub struct FileListView {
    pub session_id: String,
    pub files: Vec<FileRow>,
    pub can_merge: bool,
    pub merging: bool,
    /// `SelectionPhase` as a string, exposed as `data-phase` for the client script
    pub phase: &'static str,
    pub total_size: String,
    pub download_name: &'static str,
}

impl FileListView {
    pub fn from_selection(session_id: String, selection: &SelectionStore) -> Self {
        Self {
            session_id,
            files: selection.files().iter().map(FileRow::from).collect(),
            can_merge: selection.can_merge(),
            merging: selection.is_merging(),
            phase: selection.phase().as_str(),
            total_size: format_size(selection.total_bytes()),
            download_name: MERGED_FILENAME,
        }
    }

    /// "1 file" / "3 files"
    pub fn count_label(&self) -> String {
        match self.files.len() {
            1 => "1 file".to_string(),
            n => format!("{n} files"),
        }
    }
}

// =============================================================================
// Full Page Templates
// =============================================================================

/// Landing page with upload form.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate;

/// Main page for a session: dropzone, file list, merge button.
#[derive(Template, WebTemplate)]
#[template(path = "app.html")]
pub struct AppTemplate {
    pub list: FileListView,
}

// =============================================================================
// Fragment Templates (HTMX partial responses)
// =============================================================================

/// File list fragment returned by add, remove and reorder, and reloaded
/// once a merge settles.
#[derive(Template, WebTemplate)]
#[template(path = "partials/file_list.html")]
pub struct FileListTemplate {
    pub list: FileListView,
}
