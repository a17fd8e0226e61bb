//! Public blob serving.
//!
//! This route is what makes `publicUrl` resolvable when the filesystem blob
//! store is configured. No authentication: keys are owner-namespaced UUIDs,
//! un-guessable by construction, and the store re-validates every key
//! against traversal before touching the disk.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use jotter_core::{detect_content_type, Error};

use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ServeParams {
    /// `?download=1` forces a file download instead of inline display.
    #[serde(default)]
    download: Option<String>,
}

/// GET /files/{key} — raw blob bytes with a detected Content-Type.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<ServeParams>,
) -> Response {
    let bytes = match state.blobs.get(&key).await {
        Ok(bytes) => bytes,
        Err(Error::NotFoundOrForbidden) | Err(Error::InvalidInput(_)) => {
            return StatusCode::NOT_FOUND.into_response()
        }
        Err(_) => return StatusCode::BAD_GATEWAY.into_response(),
    };

    let name = key.rsplit('/').next().unwrap_or(key.as_str());
    let content_type = detect_content_type(name, &bytes, "application/octet-stream");

    let mut response_headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        response_headers.insert(header::CONTENT_TYPE, value);
    }
    if params.download.as_deref() == Some("1") {
        let disposition = format!("attachment; filename=\"{name}\"");
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            response_headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }

    (StatusCode::OK, response_headers, bytes).into_response()
}
