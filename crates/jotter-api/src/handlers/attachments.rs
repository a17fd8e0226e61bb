//! Attachment endpoints: upload, blob delete, text overwrite, read-back.
//!
//! These operate on blobs only. After an upload or delete the client saves
//! the note with the adjusted attachment list; the note record is never
//! written from here.

use axum::extract::{Multipart, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use jotter_core::{detect_content_type, Attachment, Error, Result};

use crate::auth;
use crate::handlers::{ack_response, data_response};
use crate::AppState;

/// POST /api/attachments — multipart upload of one `file` field.
pub async fn upload_attachment(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    data_response(upload_inner(&state, &headers, multipart).await)
}

async fn upload_inner(
    state: &AppState,
    headers: &HeaderMap,
    mut multipart: Multipart,
) -> Result<Attachment> {
    let owner = auth::current_user(state, headers)
        .await
        .ok_or(Error::Unauthenticated)?;

    let mut file: Option<(String, String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Failed to read upload: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("unnamed_file").to_string();
            let claimed = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::InvalidInput(format!("Failed to read file data: {e}")))?;
            file = Some((filename, claimed, bytes.to_vec()));
            break;
        }
    }

    let (filename, claimed, bytes) = file.ok_or_else(|| {
        Error::InvalidInput("No file uploaded. Use field name 'file'.".to_string())
    })?;

    // Browsers occasionally send no MIME type; fill it in from the bytes.
    let content_type = if claimed.is_empty() {
        detect_content_type(&filename, &bytes, "")
    } else {
        claimed
    };

    state
        .attachments
        .upload(owner, &filename, &content_type, &bytes)
        .await
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    file_path: String,
}

/// DELETE /api/attachments?file_path= — remove a blob. The caller then
/// saves the note without that attachment.
pub async fn delete_attachment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DeleteParams>,
) -> Response {
    let result = match auth::current_user(&state, &headers).await {
        Some(_) => state.attachments.delete(&params.file_path).await,
        None => Err(Error::Unauthenticated),
    };
    ack_response(result)
}

#[derive(Debug, Deserialize)]
pub struct OverwriteTextRequest {
    file_path: String,
    content: String,
    mime_type: String,
}

/// PUT /api/attachments/text — re-upload text content to an existing key,
/// keeping the attachment's URL stable.
pub async fn overwrite_text_attachment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OverwriteTextRequest>,
) -> Response {
    let result = match auth::current_user(&state, &headers).await {
        Some(_) => {
            state
                .attachments
                .overwrite_text(&req.file_path, &req.content, &req.mime_type)
                .await
        }
        None => Err(Error::Unauthenticated),
    };
    ack_response(result)
}

#[derive(Debug, Deserialize)]
pub struct ReadTextParams {
    url: String,
}

/// GET /api/attachments/text?url= — fetch a text attachment's current
/// content, bypassing stale caches.
pub async fn read_text_attachment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ReadTextParams>,
) -> Response {
    let result = match auth::current_user(&state, &headers).await {
        Some(_) => state.attachments.read_text(&params.url).await,
        None => Err(Error::Unauthenticated),
    };
    data_response(result)
}
