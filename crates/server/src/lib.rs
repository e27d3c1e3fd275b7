//! Agricultural FAQ Server
//!
//! Thin HTTP layer over the cache manager plus process bootstrap.

pub mod bootstrap;
pub mod http;
pub mod metrics;
pub mod state;

pub use bootstrap::build_cache_manager;
pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Query failed: {0}")]
    Query(#[from] agri_faq_core::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<agri_faq_config::ConfigError> for ServerError {
    fn from(err: agri_faq_config::ConfigError) -> Self {
        ServerError::Startup(err.to_string())
    }
}

impl From<agri_faq_text_processing::TextProcessingError> for ServerError {
    fn from(err: agri_faq_text_processing::TextProcessingError) -> Self {
        ServerError::Startup(err.to_string())
    }
}

impl From<agri_faq_rag::RagError> for ServerError {
    fn from(err: agri_faq_rag::RagError) -> Self {
        ServerError::Startup(err.to_string())
    }
}

impl From<agri_faq_llm::LlmError> for ServerError {
    fn from(err: agri_faq_llm::LlmError) -> Self {
        ServerError::Startup(err.to_string())
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Query(e) if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Startup(_) | ServerError::Query(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (
            status,
            Json(serde_json::json!({
                "status": "error",
                "message": self.to_string()
            })),
        )
            .into_response()
    }
}
