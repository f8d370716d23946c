//! Merge routes - run the orchestrator and return `merged.pdf`.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use axum_extra::extract::Multipart;
use bytes::Bytes;
use pdf_joiner_core::{COUNT_FIELD, Error, MERGED_FILENAME, MergeRequest, PAYLOAD_FIELD, PDF_MIME};
use std::sync::Arc;
use tracing::{error, info};

use crate::helpers::{OptionExt, ResultExt, RouteResult, rejection};
use crate::state::AppState;

const MERGE_FAILED: &str = "Failed to merge PDFs";

/// Merge the session's selection in its current order.
///
/// The selection is flagged as merging for the duration, so a second
/// request while one is running gets 409. The selection is left intact
/// afterwards, whether or not the merge succeeded.
pub async fn merge_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let request = session
        .with_session_mut(|s| s.selection.begin_merge())
        .await
        .or_not_found("Session not found")?
        .map_err(|e| rejection(&e))?;

    info!(
        "Session {}: merging {} files ({} bytes)",
        session_id,
        request.len(),
        request.total_bytes()
    );

    // Spawned so finish_merge still runs if the client disconnects mid-merge
    let task_state = Arc::clone(&state);
    let merged = tokio::spawn(async move {
        let result = run_merge(&task_state, request).await;
        if let Some(session) = task_state.get_session(&session_id).await {
            session.with_session_mut(|s| s.selection.finish_merge()).await;
        }
        result
    })
    .await
    .map_err(|e| {
        error!("Merge task failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, MERGE_FAILED.to_string())
    })??;

    pdf_attachment(merged)
}

/// Merge an uploaded request without touching any session.
///
/// Expects a `count` field plus one `pdfs` field per document, in order.
pub async fn merge_request(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    let mut count: Option<usize> = None;
    let mut files: Vec<Bytes> = Vec::new();

    while let Some(field) = multipart.next_field().await.or_bad_request()? {
        match field.name() {
            Some(COUNT_FIELD) => {
                let text = field.text().await.or_bad_request()?;
                let parsed = text.trim().parse::<usize>().map_err(|_| {
                    rejection(&Error::InvalidRequest(format!("count is not a number: {text}")))
                })?;
                count = Some(parsed);
            }
            Some(PAYLOAD_FIELD) => files.push(field.bytes().await.or_bad_request()?),
            _ => {}
        }
    }

    let count = count
        .ok_or_else(|| rejection(&Error::InvalidRequest(format!("missing {COUNT_FIELD} field"))))?;
    let request = MergeRequest::new(count, files).map_err(|e| rejection(&e))?;

    info!(
        "Merging {} uploaded files ({} bytes)",
        request.len(),
        request.total_bytes()
    );

    let merged = run_merge(&state, request).await?;
    pdf_attachment(merged)
}

/// Run the orchestrator on the blocking pool.
async fn run_merge(state: &Arc<AppState>, request: MergeRequest) -> RouteResult<Vec<u8>> {
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || state.orchestrator.merge(&request))
        .await
        .map_err(|e| {
            error!("Merge task panicked: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, MERGE_FAILED.to_string())
        })?
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, MERGE_FAILED.to_string()))
}

fn pdf_attachment(pdf: Vec<u8>) -> RouteResult<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PDF_MIME)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{MERGED_FILENAME}\""),
        )
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(pdf))
        .or_internal_error()
}
