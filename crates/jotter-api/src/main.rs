//! jotter-api server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

use jotter_api::auth::StaticTokenIdentity;
use jotter_api::{build_router, AppState};
use jotter_core::{BlobStore, NoteStore};
use jotter_db::{Database, FsBlobStore, MemoryBlobStore, MemoryNoteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "jotter_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "jotter_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        let mut layer = tracing_subscriber::fmt::layer();
        if let Some(ansi) = log_ansi {
            layer = layer.with_ansi(ansi);
        }
        registry.with(layer).init();
    }

    info!(log_format = %log_format, "Logging initialized");

    // Get configuration from environment
    let host = std::env::var("JOTTER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("JOTTER_PORT")
        .unwrap_or_else(|_| "3700".to_string())
        .parse()
        .unwrap_or(3700);
    let public_base = std::env::var("PUBLIC_BASE_URL")
        .unwrap_or_else(|_| format!("http://{}:{}", host, port));
    let files_base = format!("{}/files", public_base.trim_end_matches('/'));

    // Note records: Postgres when DATABASE_URL is set, otherwise an
    // in-memory scratch store that forgets everything on restart.
    let records: Arc<dyn NoteStore> = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            // Connect to database
            info!("Connecting to database...");
            let db = Database::connect(&database_url).await?;
            info!("Database connected");

            // Run pending database migrations on startup
            info!("Running database migrations...");
            db.migrate().await?;
            info!("Database migrations complete");

            Arc::new(db.notes)
        }
        Err(_) => {
            info!("DATABASE_URL not set; using in-memory note store (scratch mode)");
            Arc::new(MemoryNoteStore::new())
        }
    };

    // Blob storage: filesystem when FILE_STORAGE_PATH is set, otherwise
    // in-memory. The filesystem store is health-checked with a write/read
    // round-trip before the server accepts traffic.
    let blobs: Arc<dyn BlobStore> = match std::env::var("FILE_STORAGE_PATH") {
        Ok(file_storage_path) => {
            let storage = FsBlobStore::new(&file_storage_path, &files_base);
            storage
                .validate()
                .await
                .map_err(|e| anyhow::anyhow!("File storage validation failed: {}", e))?;
            info!("File storage initialized at {}", file_storage_path);
            Arc::new(storage)
        }
        Err(_) => {
            info!("FILE_STORAGE_PATH not set; using in-memory blob store");
            Arc::new(MemoryBlobStore::new(&files_base))
        }
    };

    // Single-user identity. The owner id anchors record scoping and blob
    // key namespacing, so it must stay stable across restarts when notes
    // are persisted; the nil UUID is the documented default.
    let owner: Uuid = match std::env::var("JOTTER_OWNER_ID") {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("JOTTER_OWNER_ID is not a valid UUID: {}", e))?,
        Err(_) => Uuid::nil(),
    };
    let token = std::env::var("JOTTER_API_TOKEN").unwrap_or_else(|_| {
        let generated = Uuid::new_v4().to_string();
        info!(
            token = %generated,
            "JOTTER_API_TOKEN not set; generated a token for this run"
        );
        generated
    });
    let identity = Arc::new(StaticTokenIdentity::new(token, owner));

    let state = AppState::new(records, blobs, identity);
    let app = build_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
