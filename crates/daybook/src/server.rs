//! Journal HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/entries` | Create an entry from a multipart form |
//! | `GET`  | `/entries` | List every entry in store order |
//! | `GET`  | `/entries/{id}` | Fetch one entry |
//! | `GET`  | `/recaps/latest` | Newest recap video reference |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # `POST /entries`
//!
//! Multipart fields: `text`, `latitude`, `longitude` (decimal strings), and
//! zero or more `media` files. Unknown fields are ignored. Coordinates that
//! do not both parse produce an entry without a location.
//!
//! ```json
//! { "message": "Journal entry created successfully", "entryId": "…" }
//! ```
//!
//! # Error Contract
//!
//! Failures are deliberately opaque; the cause is logged, not returned:
//!
//! ```json
//! { "error": "Failed to create journal entry" }
//! ```
//!
//! Status codes: `404` for an unknown entry or no recap yet, `500` for
//! everything else (store errors and malformed request bodies alike).
//!
//! # Lifecycle
//!
//! The server owns one store handle, shared with handlers through
//! [`AppState`]. On Ctrl+C or SIGTERM it stops accepting connections,
//! drains in-flight requests, and closes the store.

use axum::{
    extract::{
        multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};

use daybook_core::ingest::{ingest_entry, EntrySubmission, MediaUpload};
use daybook_core::models::{Entry, RecapRecord};
use daybook_core::services::BlobStore;
use daybook_core::store::EntryStore;

use crate::config::Config;
use crate::db;
use crate::placeholders::PlaceholderBlobStore;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntryStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntryStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }
}

/// Starts the journal server against the configured SQLite database.
///
/// Runs until Ctrl+C / SIGTERM, then closes the database pool.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let state = AppState::new(
        Arc::new(SqliteStore::new(pool)),
        Arc::new(PlaceholderBlobStore::from_config(config)),
    );

    let listener = TcpListener::bind(&config.server.bind).await?;
    info!("Journal server listening on http://{}", config.server.bind);

    serve(listener, state, config.server.max_upload_bytes).await
}

/// Serves `state` on an already bound listener until Ctrl+C / SIGTERM,
/// then closes the store.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    max_upload_bytes: usize,
) -> anyhow::Result<()> {
    serve_with_shutdown(listener, state, max_upload_bytes, shutdown_signal()).await
}

/// Like [`serve`], but stops when `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: AppState,
    max_upload_bytes: usize,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = state.store.clone();
    let app = router(state, max_upload_bytes);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    store.close().await;
    info!("Store closed, server stopped");

    served?;
    Ok(())
}

/// Builds the router with CORS and the upload size limit applied.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/entries", get(handle_list_entries).post(handle_create_entry))
        .route("/entries/{id}", get(handle_get_entry))
        .route("/recaps/latest", get(handle_latest_recap))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Handler failure, rendered as `{ "error": "…" }`.
#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    fn internal(message: &'static str) -> impl FnOnce(anyhow::Error) -> AppError {
        move |source| AppError::Internal { message, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal { message, source } => {
                error!("{}: {:#}", message, source);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /entries ============

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedResponse {
    message: String,
    entry_id: String,
}

/// Handler for `POST /entries`.
///
/// The timestamp is taken here, from the server clock. A body that is not
/// valid multipart is reported as a 500 like any other failure.
async fn handle_create_entry(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    const FAILED: &str = "Failed to create journal entry";

    let received_at = Utc::now();
    let multipart = multipart.map_err(|e| AppError::internal(FAILED)(e.into()))?;
    let submission = read_submission(multipart)
        .await
        .map_err(AppError::internal(FAILED))?;

    let id = ingest_entry(
        state.store.as_ref(),
        state.blobs.as_ref(),
        submission,
        received_at,
    )
    .await
    .map_err(AppError::internal(FAILED))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Journal entry created successfully".to_string(),
            entry_id: id,
        }),
    ))
}

/// Buffer a multipart form into a submission.
async fn read_submission(mut multipart: Multipart) -> anyhow::Result<EntrySubmission> {
    let mut submission = EntrySubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => submission.text = Some(field.text().await?),
            "latitude" => submission.latitude = Some(field.text().await?),
            "longitude" => submission.longitude = Some(field.text().await?),
            "media" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await?;
                submission.media.push(MediaUpload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            other => debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    Ok(submission)
}

// ============ GET /entries ============

async fn handle_list_entries(State(state): State<AppState>) -> Result<Json<Vec<Entry>>, AppError> {
    let entries = state
        .store
        .list_entries()
        .await
        .map_err(AppError::internal("Failed to retrieve journal entries"))?;
    Ok(Json(entries))
}

// ============ GET /entries/{id} ============

async fn handle_get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Entry>, AppError> {
    state
        .store
        .get_entry(&id)
        .await
        .map_err(AppError::internal("Failed to retrieve journal entry"))?
        .map(Json)
        .ok_or(AppError::NotFound("Journal entry not found"))
}

// ============ GET /recaps/latest ============

async fn handle_latest_recap(
    State(state): State<AppState>,
) -> Result<Json<RecapRecord>, AppError> {
    state
        .store
        .latest_recap()
        .await
        .map_err(AppError::internal("Failed to retrieve recap"))?
        .map(Json)
        .ok_or(AppError::NotFound("No recap has been generated yet"))
}
