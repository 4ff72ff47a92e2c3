//! HTTP server exposing the pipeline.
//!
//! # API Endpoints
//!
//! | Method | Path             | Description                              |
//! |--------|------------------|------------------------------------------|
//! | GET    | `/health`        | Health check                             |
//! | POST   | `/api/upload`    | Upload a CSV/workbook for parsing        |
//! | POST   | `/api/transform` | Explode or split the current file        |
//! | GET    | `/api/state`     | Current file snapshot                    |
//! | GET    | `/api/logs`      | SSE stream for real-time logs            |

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Sse},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use futures::stream::Stream;
use serde_json::Value;
use std::{convert::Infallible, net::SocketAddr, sync::Arc, sync::Mutex, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_warning, LOG_BROADCASTER};
use super::types::{error_response, StateResponse, TransformRequest, UploadResponse};
use crate::cache::RecentFileStore;
use crate::error::{PipelineError, TransformError};
use crate::models::TransformSpec;
use crate::parser::parse_auto;
use crate::sink::sanitize_filename;
use crate::state::{FileBus, FileSnapshot};
use crate::transform::pipeline::{explode_file, split_file, PipelineOptions};

/// The uploaded file the transform endpoint operates on.
struct CurrentFile {
    name: String,
    bytes: Vec<u8>,
    sheet: Option<String>,
}

/// Shared server state; the composition root owns the bus and the store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    bus: FileBus,
    store: RecentFileStore,
    current: Mutex<Option<CurrentFile>>,
}

impl AppState {
    pub fn new(store: RecentFileStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                bus: FileBus::new(),
                store,
                current: Mutex::new(None),
            }),
        }
    }
}

/// Build the router; split out so tests and `start_server` share it.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/transform", post(transform))
        .route("/api/state", get(current_state))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server.
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(RecentFileStore::new());
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("shelfload server running on http://localhost:{}", port);
    println!("   POST /api/upload    - Upload a file");
    println!("   POST /api/transform - Explode or split the current file");
    println!("   GET  /api/state     - Current file snapshot");
    println!("   GET  /api/logs     - SSE log stream");
    println!("   GET  /health       - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "shelfload",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "transform": "POST /api/transform",
            "state": "GET /api/state",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming.
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: parse the file, publish it on the bus, cache the raw
/// bytes by date.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<Value>)> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut sheet: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        bad_request(format!("Multipart error: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| bad_request(format!("Read error: {}", e)))?
                        .to_vec(),
                );
            }
            "sheet" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Read error: {}", e)))?;
                if !value.trim().is_empty() {
                    sheet = Some(value);
                }
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| bad_request("No file provided".to_string()))?;
    let name = file_name.unwrap_or_else(|| "upload.csv".to_string());

    let parsed = parse_auto(&name, &bytes, sheet.as_deref()).map_err(|e| {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(error_response(&e.to_string())))
    })?;

    state.inner.bus.publish(FileSnapshot {
        file_name: name.clone(),
        columns: parsed.table.columns().to_vec(),
        row_count: parsed.table.row_count(),
    });

    let cached = match state.inner.store.record(Utc::now().date_naive(), &name, &bytes) {
        Ok(_) => true,
        Err(e) => {
            log_warning(format!("Recent-file store write failed: {}", e));
            false
        }
    };

    let response = UploadResponse::new(&name, &parsed, cached);

    let mut current = state.inner.current.lock().unwrap_or_else(|e| e.into_inner());
    *current = Some(CurrentFile { name, bytes, sheet });

    Ok(Json(response))
}

/// Transform endpoint: run a [`TransformSpec`] against the current file
/// and answer with the serialized output as a download.
async fn transform(
    State(state): State<AppState>,
    Json(request): Json<TransformRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let (name, bytes, sheet) = {
        let current = state.inner.current.lock().unwrap_or_else(|e| e.into_inner());
        let file = current
            .as_ref()
            .ok_or_else(|| bad_request("No file uploaded yet".to_string()))?;
        (file.name.clone(), file.bytes.clone(), file.sheet.clone())
    };

    let options = PipelineOptions { sheet, ..Default::default() };

    let export = match request.spec {
        TransformSpec::Explode { column, delimiter } => {
            let output = explode_file(&name, &bytes, &column, &delimiter, &request.output_name, &options)
                .map_err(pipeline_error)?;
            match output {
                Some(out) => out.export,
                None => {
                    return Err((
                        StatusCode::UNPROCESSABLE_ENTITY,
                        Json(error_response("No data to output after explode")),
                    ))
                }
            }
        }
        TransformSpec::GroupBy { column } => {
            split_file(&name, &bytes, &column, &request.suffix, request.confirm, &options)
                .map_err(pipeline_error)?
                .export
        }
    };

    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_filename(&export.file_name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.bytes,
    ))
}

/// Current file snapshot.
async fn current_state(State(state): State<AppState>) -> Json<StateResponse> {
    Json(StateResponse { file: state.inner.bus.get_state() })
}

fn bad_request(message: String) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(error_response(&message)))
}

fn pipeline_error(e: PipelineError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        // The fan-out checkpoint is a confirmation demand, not a failure.
        PipelineError::Transform(TransformError::FanOutExceeded { .. }) => StatusCode::CONFLICT,
        PipelineError::Parse(_) | PipelineError::Transform(_) | PipelineError::Validation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(error_response(&e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_status_mapping() {
        let fanout = PipelineError::Transform(TransformError::FanOutExceeded {
            groups: 200,
            threshold: 100,
        });
        assert_eq!(pipeline_error(fanout).0, StatusCode::CONFLICT);

        let missing = PipelineError::Transform(TransformError::MissingColumn("x".into()));
        assert_eq!(pipeline_error(missing).0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_router_builds() {
        let state = AppState::new(RecentFileStore::with_dir(
            tempfile::tempdir().unwrap().path(),
        ));
        let _router = router(state);
    }
}
