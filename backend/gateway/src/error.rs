//! Mapping of domain errors onto HTTP responses.
//!
//! Bodies follow the `{"detail": "..."}` shape the web front-end expects.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use robowarehouse_core::WarehouseError;
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub struct ApiError(pub WarehouseError);

impl From<WarehouseError> for ApiError {
    fn from(err: WarehouseError) -> Self {
        Self(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self(WarehouseError::from_anyhow(err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            WarehouseError::InvalidImage(_) | WarehouseError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            WarehouseError::ScanNotFound(_) => StatusCode::NOT_FOUND,
            WarehouseError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            WarehouseError::Ocr { .. } => StatusCode::BAD_GATEWAY,
            WarehouseError::OcrTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            WarehouseError::Storage(_) | WarehouseError::Config(_) | WarehouseError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn detail(&self) -> String {
        match &self.0 {
            WarehouseError::InvalidImage(_) => "Invalid image".to_string(),
            WarehouseError::ScanNotFound(_) => "Scan not found".to_string(),
            other if self.status().is_server_error() && !is_upstream(other) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

fn is_upstream(err: &WarehouseError) -> bool {
    matches!(err, WarehouseError::Ocr { .. } | WarehouseError::OcrTimeout(_))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, status = status.as_u16(), "Request failed");
        } else {
            warn!(error = %self.0, status = status.as_u16(), "Request rejected");
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
