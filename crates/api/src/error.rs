use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ingest::IngestError;
use pipeline::PipelineError;
use search::SearchError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Search(#[from] SearchError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(e) if e.is_input_error() => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ingest(IngestError::InvalidConfig(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ingest(_) => StatusCode::BAD_REQUEST,
            ApiError::Search(SearchError::Upstream(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Search(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), detail = %detail, "Request failed");
        } else {
            warn!(status = status.as_u16(), detail = %detail, "Request rejected");
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(PipelineError::EmptyExtraction).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(PipelineError::ChunkFailed {
                index: 2,
                total: 3,
                source: anyhow::anyhow!("boom"),
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(IngestError::UnsupportedFormat("docx".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(SearchError::Upstream("timeout".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(SearchError::NotFound("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_chunk_failure_message_keeps_index_and_cause() {
        let err = ApiError::from(PipelineError::ChunkFailed {
            index: 2,
            total: 3,
            source: anyhow::anyhow!("rate limited"),
        });

        let message = err.to_string();
        assert!(message.contains("chunk 2 of 3"));
        assert!(message.contains("rate limited"));
    }
}
