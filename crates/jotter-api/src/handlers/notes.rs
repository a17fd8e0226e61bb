//! Note CRUD endpoints.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use jotter_core::{filter_notes, NoteDraft, Tab};

use crate::auth;
use crate::handlers::{ack_response, data_response};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Tab filter: all, recent, files, images, links. Unknown values fall
    /// back to `all`.
    #[serde(default)]
    tab: Option<String>,
    /// Case-insensitive search over title and content.
    #[serde(default)]
    q: Option<String>,
}

/// GET /api/notes — the owner's notes, newest first, filtered read-side.
pub async fn list_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response {
    let user = auth::current_user(&state, &headers).await;
    let tab = Tab::parse(params.tab.as_deref().unwrap_or(""));
    let query = params.q.unwrap_or_default();

    let result = state.notes.list(user).await.map(|notes| {
        filter_notes(&notes, tab, &query)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>()
    });
    data_response(result)
}

/// GET /api/notes/{id}
pub async fn get_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let user = auth::current_user(&state, &headers).await;
    data_response(state.notes.get(user, id).await)
}

/// POST /api/notes — create a note from a draft.
pub async fn create_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<NoteDraft>,
) -> Response {
    let user = auth::current_user(&state, &headers).await;
    data_response(state.notes.create(user, draft).await)
}

/// PUT /api/notes/{id} — re-derive and replace a note from a draft.
pub async fn update_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(draft): Json<NoteDraft>,
) -> Response {
    let user = auth::current_user(&state, &headers).await;
    data_response(state.notes.update(user, id, draft).await)
}

/// DELETE /api/notes/{id} — blobs first, then the record.
pub async fn delete_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let user = auth::current_user(&state, &headers).await;
    ack_response(state.notes.delete(user, id).await)
}
