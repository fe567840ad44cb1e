use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use certbridge_cert::{CertificateError, TrustFileError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: Option<String>,
}

/// Request-time failures of the debug page
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    TrustFile(#[from] TrustFileError),

    #[error(transparent)]
    Certificate(#[from] CertificateError),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::TrustFile(TrustFileError::Certificate(_)) | ApiError::Certificate(_) => {
                "CERTIFICATE_INVALID"
            }
            ApiError::TrustFile(_) => "TRUST_FILE_UNREADABLE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Debug page failed: {}", self);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: self.to_string(),
                code: Some(self.code().to_string()),
            }),
        )
            .into_response()
    }
}
