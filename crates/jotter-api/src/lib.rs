//! # jotter-api
//!
//! HTTP server over the note consistency core: note CRUD, the attachment
//! lifecycle, and public blob serving.
//!
//! The router is state-generic over the storage collaborators, so tests run
//! the full production middleware stack against in-memory stores.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use jotter_core::{AttachmentManager, BlobStore, Identity, NoteService, NoteStore};

/// Request body cap. Uploads beyond this are rejected before buffering.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Note transitions (create/update/delete/get/list).
    pub notes: NoteService,
    /// Attachment blob lifecycle.
    pub attachments: AttachmentManager,
    /// Blob store, used directly by the public file route.
    pub blobs: Arc<dyn BlobStore>,
    /// Credential resolution.
    pub identity: Arc<dyn Identity>,
}

impl AppState {
    /// Wire the state from its storage collaborators.
    pub fn new(
        records: Arc<dyn NoteStore>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn Identity>,
    ) -> Self {
        let attachments = AttachmentManager::new(blobs.clone());
        Self {
            notes: NoteService::new(records, attachments.clone()),
            attachments,
            blobs,
            identity,
        }
    }
}

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Parse CORS origins from the ALLOWED_ORIGINS environment variable
/// (comma-separated), defaulting to the local web client.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str =
        std::env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string());

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

/// Build the application router with the full middleware stack.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Notes CRUD
        .route(
            "/api/notes",
            get(handlers::notes::list_notes).post(handlers::notes::create_note),
        )
        .route(
            "/api/notes/:id",
            get(handlers::notes::get_note)
                .put(handlers::notes::update_note)
                .delete(handlers::notes::delete_note),
        )
        // Attachments
        .route(
            "/api/attachments",
            post(handlers::attachments::upload_attachment)
                .delete(handlers::attachments::delete_attachment),
        )
        .route(
            "/api/attachments/text",
            put(handlers::attachments::overwrite_text_attachment)
                .get(handlers::attachments::read_text_attachment),
        )
        // Public blob serving
        .route("/files/*key", get(handlers::files::serve_file))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer({
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parse_allowed_origins()))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600))
        })
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .with_state(state)
}
