use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use super::ToggleResponse;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum LikesError {
    #[error("User not logged in.")]
    NotAuthenticated,

    #[error("Invalid image id: {0}")]
    InvalidImage(i64),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl IntoResponse for LikesError {
    fn into_response(self) -> Response {
        let status = match &self {
            LikesError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            LikesError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            LikesError::StorageError(e) => {
                error!("Failed to persist liked images: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            LikesError::StorageError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (
            status,
            Json(ToggleResponse {
                success: false,
                message,
                liked: None,
            }),
        )
            .into_response()
    }
}
