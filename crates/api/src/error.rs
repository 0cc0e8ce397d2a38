use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain::services::IngestError;
use domain::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

#[derive(Debug)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                "missing_field",
                format!("Missing required field: {field}"),
            ),
            ApiError::InvalidCoordinate(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_coordinate", msg.clone())
            }
            ApiError::InvalidTimestamp(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_timestamp", msg.clone())
            }
            ApiError::InvalidBoundary(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_boundary", msg.clone())
            }
            ApiError::UnknownEntity(entity_id) => (
                StatusCode::NOT_FOUND,
                "unknown_entity",
                format!("Entity '{entity_id}' is not registered"),
            ),
            ApiError::StorageFailure(msg) => {
                tracing::error!("Storage failure: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "storage_failure",
                    "Storage is temporarily unavailable, please retry".into(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Unavailable(msg) => ApiError::StorageFailure(msg),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::MissingField(field) => ApiError::MissingField(field.to_string()),
            IngestError::InvalidCoordinate(msg) => ApiError::InvalidCoordinate(msg),
            IngestError::InvalidTimestamp(raw) => {
                ApiError::InvalidTimestamp(format!("Unrecognized timestamp '{raw}'"))
            }
            IngestError::UnknownEntity(entity_id) => ApiError::UnknownEntity(entity_id.into_inner()),
            err @ IngestError::MixedEntities { .. } => ApiError::Validation(err.to_string()),
            IngestError::StorageFailure(store) => ApiError::StorageFailure(store.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
        let message = match rejection {
            JsonRejection::JsonDataError(_) => {
                "Request body has a missing field or a field of the wrong type"
            }
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
            JsonRejection::MissingJsonContentType(_) => {
                "Expected request with `Content-Type: application/json`"
            }
            _ => "Request body could not be read",
        };
        ApiError::Validation(message.into())
    }
}

/// Flattens validator errors into `field: message` pairs.
pub fn validation_details(errors: &validator::ValidationErrors) -> Vec<ValidationDetail> {
    let mut details: Vec<ValidationDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| ValidationDetail {
                field: field.to_string(),
                message: e
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = validation_details(&errors)
            .iter()
            .map(|d| format!("{}: {}", d.field, d.message))
            .collect::<Vec<_>>()
            .join(", ");
        ApiError::Validation(message)
    }
}
