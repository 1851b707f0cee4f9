use std::path::Path;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::RagError;
use crate::models::{
    Answer, AskRequest, DocumentStored, DocumentUpload, IngestReport, RetrieveRequest,
    RetrievedChunk,
};
use crate::ollama::OllamaClient;
use crate::rag::{RagEngine, MAX_TOP_N};

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub struct AppState {
    pub engine: RagEngine,
    pub ollama: OllamaClient,
    pub default_top_n: usize,
}

type ApiError = (StatusCode, String);

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/documents", post(add_document_handler))
        .route("/api/v1/documents/upload", post(upload_document_handler))
        .route("/api/v1/retrieve", post(retrieve_handler))
        .route("/api/v1/ask", post(ask_handler))
        .route("/api/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn error_response(err: RagError) -> ApiError {
    let status = match &err {
        RagError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        RagError::Extraction { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RagError::Embedding { .. } | RagError::Generation { .. } => StatusCode::BAD_GATEWAY,
        RagError::DimensionMismatch { .. }
        | RagError::Store(_)
        | RagError::Metadata(_)
        | RagError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    } else {
        tracing::warn!("Request rejected: {}", err);
    }
    (status, err.to_string())
}

fn resolve_top_n(requested: Option<usize>, default: usize) -> Result<usize, ApiError> {
    let top_n = requested.unwrap_or(default);
    if top_n == 0 || top_n > MAX_TOP_N {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("top_n must be within 1..={}", MAX_TOP_N),
        ));
    }
    Ok(top_n)
}

async fn add_document_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DocumentUpload>,
) -> Result<Json<DocumentStored>, ApiError> {
    let chunks_stored = state
        .engine
        .insert_document(&payload.document_id, &payload.text)
        .await
        .map_err(error_response)?;

    Ok(Json(DocumentStored {
        document_id: payload.document_id,
        chunks_stored,
    }))
}

async fn upload_document_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let document_id = field
            .file_name()
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy().to_string())
            .ok_or((StatusCode::BAD_REQUEST, "Uploaded file has no name".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

        // The extractor works on paths; keep the uploaded file name so the format is detectable.
        let temp_path = std::env::temp_dir().join(format!("{}_{}", Uuid::new_v4(), document_id));
        tokio::fs::write(&temp_path, &bytes).await.map_err(|e| {
            tracing::error!("Failed to write upload to {}: {}", temp_path.display(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to buffer upload".to_string())
        })?;

        let result = state.engine.ingest_file_as(&temp_path, &document_id).await;
        if let Err(e) = tokio::fs::remove_file(&temp_path).await {
            tracing::warn!("Failed to remove {}: {}", temp_path.display(), e);
        }

        return result.map(Json).map_err(error_response);
    }

    Err((StatusCode::BAD_REQUEST, "Missing multipart field 'file'".to_string()))
}

async fn retrieve_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RetrieveRequest>,
) -> Result<Json<Vec<RetrievedChunk>>, ApiError> {
    let top_n = resolve_top_n(request.top_n, state.default_top_n)?;
    if request.query.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "query must not be empty".to_string()));
    }

    let chunks = state
        .engine
        .retrieve(&request.query, top_n)
        .await
        .map_err(error_response)?;
    Ok(Json(chunks))
}

async fn ask_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<Answer>, ApiError> {
    let top_n = resolve_top_n(request.top_n, state.default_top_n)?;
    let answer = state
        .engine
        .answer(&request.question, top_n)
        .await
        .map_err(error_response)?;
    Ok(Json(answer))
}

fn health_status(ollama_healthy: bool, store_healthy: bool) -> &'static str {
    if ollama_healthy && store_healthy {
        "healthy"
    } else {
        "degraded"
    }
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let ollama_healthy = state.ollama.health_check().await;
    let chunks = match state.engine.store().count().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!("Chunk store health check failed: {}", e);
            None
        }
    };

    Json(serde_json::json!({
        "status": health_status(ollama_healthy, chunks.is_some()),
        "timestamp": Utc::now().to_rfc3339(),
        "services": {
            "ollama": ollama_healthy,
            "store": chunks.is_some(),
        },
        "chunks": chunks,
    }))
}
