use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use floorplan_shared::ModelError;
use thiserror::Error;

use crate::geocode::GeocodeError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("invalid booth: {0}")]
    Model(#[from] ModelError),
    #[error("invalid image: {0}")]
    Image(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Invalid(_) | ApiError::Model(_) | ApiError::Image(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Geocode(GeocodeError::NoMatch(_)) => StatusCode::NOT_FOUND,
            ApiError::Geocode(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
