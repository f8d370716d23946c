//! Selection routes - add, remove, reorder and inspect the files of a session.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use axum_extra::extract::{Form, Multipart};
use pdf_joiner_core::{FileId, PAYLOAD_FIELD, SelectionPhase, SelectionStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::{ReorderForm, read_files};
use crate::helpers::{OptionExt, ResultExt, RouteResult};
use crate::state::AppState;
use crate::templates::{FileListTemplate, FileListView};

/// Start a session from the first upload and redirect to its page
/// (POST-Redirect-GET).
///
/// Supports both HTMX requests (HX-Redirect header) and standard form
/// submissions (303 See Other). Nothing is stored when no PDF is accepted.
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    let candidates = read_files(&mut multipart, PAYLOAD_FIELD).await?;
    let offered = candidates.len();

    let mut selection = SelectionStore::new();
    let added = selection.add(candidates);
    if added == 0 {
        return Err((StatusCode::BAD_REQUEST, "No PDF files uploaded".to_string()));
    }

    let session_id = state.create_session_with(selection).await;
    info!(
        "Created session {} with {} of {} files",
        session_id, added, offered
    );

    let redirect_url = format!("/join/{session_id}");

    if headers.get("HX-Request").is_some() {
        // HX-Redirect tells HTMX to do a full page navigation
        Response::builder()
            .status(StatusCode::OK)
            .header("HX-Redirect", redirect_url)
            .body(Body::empty())
            .or_internal_error()
    } else {
        Response::builder()
            .status(StatusCode::SEE_OTHER)
            .header(header::LOCATION, redirect_url)
            .body(Body::empty())
            .or_internal_error()
    }
}

/// Add uploaded files to the end of the selection.
///
/// Files whose content type is not `application/pdf` are dropped without
/// an error; the returned list shows what was kept.
pub async fn add_files(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> RouteResult<FileListTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    // Read the whole upload before taking the lock
    let candidates = read_files(&mut multipart, PAYLOAD_FIELD).await?;
    let offered = candidates.len();

    let (added, list) = session
        .with_session_mut(|s| {
            let added = s.selection.add(candidates);
            (added, FileListView::from_selection(session_id.clone(), &s.selection))
        })
        .await
        .or_not_found("Session not found")?;

    info!(
        "Session {}: added {} of {} files ({} selected)",
        session_id,
        added,
        offered,
        list.files.len()
    );

    Ok(FileListTemplate { list })
}

/// Remove one file from the selection. Unknown ids leave it unchanged.
pub async fn remove_file(
    State(state): State<Arc<AppState>>,
    Path((session_id, file_id)): Path<(String, String)>,
) -> RouteResult<FileListTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let file_id = FileId::new(file_id);
    let (removed, list) = session
        .with_session_mut(|s| {
            let removed = s.selection.remove(&file_id);
            (removed, FileListView::from_selection(session_id.clone(), &s.selection))
        })
        .await
        .or_not_found("Session not found")?;

    if removed {
        debug!("Session {}: removed {}", session_id, file_id);
    } else {
        debug!("Session {}: no file {} to remove", session_id, file_id);
    }

    Ok(FileListTemplate { list })
}

/// Replace the selection order with the submitted `order` fields.
///
/// The order is taken as given: unknown ids are skipped and ids left out
/// are dropped from the selection.
pub async fn reorder_files(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Form(form): Form<ReorderForm>,
) -> RouteResult<FileListTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let order: Vec<FileId> = form.order.into_iter().map(FileId::new).collect();
    let list = session
        .with_session_mut(|s| {
            s.selection.reorder(&order);
            FileListView::from_selection(session_id.clone(), &s.selection)
        })
        .await
        .or_not_found("Session not found")?;

    debug!("Session {}: reordered to {} files", session_id, list.files.len());

    Ok(FileListTemplate { list })
}

/// Current file list fragment.
///
/// The client reloads it when a merge settles, since the list may have been
/// swapped while the merge was running.
pub async fn file_list(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<FileListTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let list = session
        .with_session(|s| FileListView::from_selection(session_id.clone(), &s.selection))
        .await
        .or_not_found("Session not found")?;

    Ok(FileListTemplate { list })
}

/// One selected file in the JSON summary.
#[derive(Serialize)]
pub struct FileSummary {
    pub id: FileId,
    pub name: String,
    pub size: usize,
}

/// JSON view of a selection.
#[derive(Serialize)]
pub struct SelectionSummary {
    pub session_id: String,
    pub phase: SelectionPhase,
    pub can_merge: bool,
    pub total_bytes: usize,
    pub files: Vec<FileSummary>,
}

/// Current selection as JSON (for scripts and tests).
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<Json<SelectionSummary>> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let summary = session
        .with_session(|s| SelectionSummary {
            session_id: session_id.clone(),
            phase: s.selection.phase(),
            can_merge: s.selection.can_merge(),
            total_bytes: s.selection.total_bytes(),
            files: s
                .selection
                .files()
                .iter()
                .map(|file| FileSummary {
                    id: file.id().clone(),
                    name: file.display_name().to_string(),
                    size: file.size(),
                })
                .collect(),
        })
        .await
        .or_not_found("Session not found")?;

    Ok(Json(summary))
}
