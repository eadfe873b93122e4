use std::fmt;

use actix_multipart::MultipartError;
use actix_web::{
    error::{PayloadError, ResponseError},
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

#[derive(Debug, Clone)]
pub enum AppError {
    ValidationError { message: String, details: Vec<FieldError> },
    InvalidInput(String),
    PayloadTooLarge(String),
    StorageError(String),
    PersistenceError(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError { details, .. } => {
                let messages = details.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::InvalidInput(msg) => write!(f, "{}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "{}", msg),
            AppError::StorageError(msg) => write!(f, "Object storage error: {}", msg),
            AppError::PersistenceError(msg) => write!(f, "Database error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl AppError {
    /// True for faults on our side or upstream of us.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Replaces the summary of a validation error, keeping its field details.
    pub fn with_message(self, message: impl Into<String>) -> Self {
        match self {
            AppError::ValidationError { details, .. } => AppError::ValidationError {
                message: message.into(),
                details,
            },
            other => other,
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError { message, details } => {
                serde_json::json!({
                    "error": message,
                    "details": details
                })
            }
            AppError::InvalidInput(msg) | AppError::PayloadTooLarge(msg) => {
                serde_json::json!({"error": msg})
            }
            // Upstream detail stays in the logs.
            _ => serde_json::json!({"error": "Internal server error"}),
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        // HashMap iteration order is not stable
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        let fields = field_errors
            .iter()
            .map(|e| e.field.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        AppError::ValidationError {
            message: format!("Invalid or missing fields: {}", fields),
            details: field_errors,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::PersistenceError(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::StorageError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(format!("IO error: {}", err))
    }
}

impl From<&MultipartError> for AppError {
    fn from(err: &MultipartError) -> Self {
        match err {
            MultipartError::Payload(PayloadError::Overflow) => {
                AppError::PayloadTooLarge("Upload exceeds the allowed size".to_string())
            }
            MultipartError::ContentTypeMissing
            | MultipartError::ContentTypeParse
            | MultipartError::ContentTypeIncompatible => {
                AppError::InvalidInput("Request must be multipart/form-data".to_string())
            }
            _ => AppError::InvalidInput(format!("Invalid multipart payload: {}", err)),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::from(&err)
    }
}

/// Extractor failures surface as `actix_web::Error`; recover the typed cause
/// so every rejection keeps the JSON envelope.
impl From<actix_web::Error> for AppError {
    fn from(err: actix_web::Error) -> Self {
        if let Some(app_err) = err.as_error::<AppError>() {
            return app_err.clone();
        }
        if let Some(multipart_err) = err.as_error::<MultipartError>() {
            return AppError::from(multipart_err);
        }

        match err.as_response_error().status_code() {
            StatusCode::PAYLOAD_TOO_LARGE => {
                AppError::PayloadTooLarge("Upload exceeds the allowed size".to_string())
            }
            status if status.is_client_error() => AppError::InvalidInput(err.to_string()),
            _ => AppError::InternalError(err.to_string()),
        }
    }
}

#[derive(Debug, Display)]
pub enum StorageError {
    #[display("Failed to build storage client: {_0}")]
    Configuration(String),

    #[display("Failed to upload object {key}: {reason}")]
    Upload { key: String, reason: String },

    #[display("Failed to delete object {key}: {reason}")]
    Delete { key: String, reason: String },

    #[display("Storage unreachable: {_0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
