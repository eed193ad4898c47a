//! Dashboard error types and their HTTP mapping.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::warn;

use qsync_core::CoreError;

use crate::types::ErrorBody;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Missing upload field '{0}'")]
    MissingField(&'static str),

    #[error("Upload error: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Core(CoreError::MissingColumns { missing, preview }) => {
                let error = format!(
                    "CSV format incorrect. Columns 'symbol' and 'units' are required (missing: {}).",
                    missing.join(", ")
                );
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorBody {
                        error,
                        missing_columns: Some(missing),
                        preview: Some(preview),
                    },
                )
            }
            Self::Multipart(e) => (e.status(), ErrorBody::message(e.body_text())),
            Self::NotFound(what) => (StatusCode::NOT_FOUND, ErrorBody::message(what)),
            other @ (Self::MissingField(_) | Self::Core(_)) => {
                (StatusCode::BAD_REQUEST, ErrorBody::message(other.to_string()))
            }
        };

        warn!(status = %status, error = %body.error, "Request failed");
        (status, Json(body)).into_response()
    }
}
