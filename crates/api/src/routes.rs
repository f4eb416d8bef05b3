use anyhow::Result;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use extract::{GraphExtractor, GraphRelationship, LlmGraphExtractor};
use graph::{ConsolidatedGraph, GraphSelection, reshape_selection};
use ingest::FileReader;
use pipeline::{KnowledgeGraphPipeline, PipelineConfig, ProgressReporter};
use search::{SearchConfig, WikipediaClient};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{AppConfig, ServerConfig};
use crate::error::ApiError;
use crate::stream;

pub struct AppState {
    pub pipeline: Arc<KnowledgeGraphPipeline>,
    pub wikipedia: WikipediaClient,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let extractor = Arc::new(LlmGraphExtractor::new(&config.llm)?);
        Self::with_extractor(extractor, config.pipeline.clone(), &config.search)
    }

    /// Build state around any extraction backend
    pub fn with_extractor(
        extractor: Arc<dyn GraphExtractor>,
        pipeline: PipelineConfig,
        search: &SearchConfig,
    ) -> Result<Self> {
        Ok(Self {
            pipeline: Arc::new(KnowledgeGraphPipeline::new(extractor, pipeline)?),
            wikipedia: WikipediaClient::new(search)?,
        })
    }
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub text: String,
}

/// The client also sends the source `text`; it is not needed to reshape
#[derive(Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub selected_nodes: Vec<String>,
    #[serde(default)]
    pub selected_edges: Vec<GraphRelationship>,
}

#[derive(Deserialize)]
pub struct WikipediaSearchRequest {
    pub query: String,
}

#[derive(Serialize)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub text: String,
    pub filename: String,
}

pub fn router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/wikipedia-search", post(wikipedia_search))
        .route("/api/upload-file", post(upload_file))
        .route("/api/generate-graph", post(generate_graph))
        .route("/api/generate-graph/stream", post(stream::generate_graph_stream))
        .route("/api/filter-graph", post(filter_graph))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(cors_layer(&server.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Knowledge Graph API" }))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn generate_graph(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<ConsolidatedGraph>, ApiError> {
    let graph = state
        .pipeline
        .generate(&req.text, ProgressReporter::disabled())
        .await?;

    Ok(Json(graph))
}

async fn filter_graph(Json(req): Json<FilterRequest>) -> Json<GraphSelection> {
    Json(reshape_selection(req.selected_nodes, req.selected_edges))
}

async fn wikipedia_search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WikipediaSearchRequest>,
) -> Result<Json<TextResponse>, ApiError> {
    let text = state.wikipedia.summary(&req.query).await?;
    Ok(Json(TextResponse { text }))
}

async fn upload_file(mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read uploaded file: {}", e)))?;

        info!(filename = %filename, bytes = bytes.len(), "Received upload");

        // PDF decoding is CPU-bound
        let name = filename.clone();
        let text = tokio::task::spawn_blocking(move || FileReader::decode_named(&bytes, &name))
            .await
            .map_err(|e| ApiError::Internal(format!("File decoding task failed: {}", e)))??;

        return Ok(Json(UploadResponse { text, filename }));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}
