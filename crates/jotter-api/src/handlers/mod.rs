//! HTTP handlers and the response envelope.
//!
//! Every JSON endpoint answers with one of two envelopes: `{data, error}`
//! for endpoints that return a value, `{success, error}` for endpoints that
//! acknowledge an action. Status codes restate the error class; the body is
//! the contract.

pub mod attachments;
pub mod files;
pub mod notes;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use jotter_core::Error;

/// Envelope for endpoints that return a value.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Envelope for endpoints that acknowledge an action.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
    pub error: Option<String>,
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Unauthenticated => StatusCode::UNAUTHORIZED,
        Error::NotFoundOrForbidden => StatusCode::NOT_FOUND,
        Error::EmptyNote | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::Store(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Envelope a result as `{data, error}`.
pub fn data_response<T: Serialize>(result: jotter_core::Result<T>) -> Response {
    match result {
        Ok(value) => Json(Data {
            data: Some(value),
            error: None,
        })
        .into_response(),
        Err(error) => (
            status_for(&error),
            Json(Data::<T> {
                data: None,
                error: Some(error.to_string()),
            }),
        )
            .into_response(),
    }
}

/// Envelope a result as `{success, error}`.
pub fn ack_response(result: jotter_core::Result<()>) -> Response {
    match result {
        Ok(()) => Json(Ack {
            success: true,
            error: None,
        })
        .into_response(),
        Err(error) => (
            status_for(&error),
            Json(Ack {
                success: false,
                error: Some(error.to_string()),
            }),
        )
            .into_response(),
    }
}

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
