//! Failures of the upload handler and their JSON envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::utils::storage::StorageError;

/// Every way an upload can be turned down, in the order the checks run.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to load config")]
    ConfigLoad(#[source] ConfigError),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Failed to fetch file")]
    MissingFile,

    #[error("File too large")]
    FileTooLarge,

    #[error("Invalid file type")]
    InvalidFileType,

    #[error("Failed to create file")]
    StorageCreate(#[source] StorageError),

    #[error("Failed to save file")]
    StorageWrite(#[source] StorageError),
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ConfigLoad(_) | Self::StorageCreate(_) | Self::StorageWrite(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::InvalidToken | Self::MissingFile | Self::FileTooLarge | Self::InvalidFileType => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Create { .. } => Self::StorageCreate(err),
            StorageError::Write { .. } => Self::StorageWrite(err),
        }
    }
}

/// Body of every `/upload` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl UploadResponse {
    pub fn ok(url: String) -> Self {
        Self {
            success: true,
            message: String::new(),
            url: Some(url),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            url: None,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(UploadResponse::failure(self.to_string()))).into_response()
    }
}
