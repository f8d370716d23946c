//! Page routes - full HTML page renders.

use axum::extract::{Path, State};
use std::sync::Arc;

use crate::helpers::{OptionExt, RouteResult};
use crate::state::AppState;
use crate::templates::{AppTemplate, FileListView, IndexTemplate};

/// Landing page with the first upload form.
///
/// No session exists until files are uploaded.
pub async fn index() -> IndexTemplate {
    IndexTemplate
}

/// Main page for an existing selection (direct URL access and reloads).
pub async fn join_page(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<AppTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let list = session
        .with_session_mut(|s| FileListView::from_selection(session_id.clone(), &s.selection))
        .await
        .or_not_found("Session not found")?;

    Ok(AppTemplate { list })
}
