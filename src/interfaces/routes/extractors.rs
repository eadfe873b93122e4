use actix_multipart::form::MultipartFormConfig;
use actix_web::{
    web,
    http::StatusCode,
    ResponseError,
    HttpResponse,
    error::QueryPayloadError,
};
use serde_json::json;

use crate::errors::AppError;

pub fn config_routes(cfg: &mut web::ServiceConfig, upload_limit: usize) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ExtractorError::from(err).into()
    }));

    cfg.app_data(
        MultipartFormConfig::default()
            .total_limit(upload_limit)
            .error_handler(|err, _req| AppError::from(err).into())
    );
}

#[derive(Debug)]
pub struct ExtractorError {
    message: String,
    status: StatusCode
}

impl std::fmt::Display for ExtractorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for ExtractorError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status).json(json!({ "error": self.message }))
    }
}

impl From<QueryPayloadError> for ExtractorError {
    fn from(err: QueryPayloadError) -> Self {
        ExtractorError {
            message: format!("Query string error: {}", err),
            status: StatusCode::BAD_REQUEST,
        }
    }
}
