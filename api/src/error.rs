use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use trendrank_core::CoreError;
use uuid::Uuid;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    code: u16,
    timestamp: String,
    correlation_id: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, message)
    }

    pub fn invalid_period(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_PERIOD", message)
    }

    pub fn invalid_date_format(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_DATE_FORMAT", message)
    }

    pub fn job_already_running(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "JOB_ALREADY_RUNNING", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidPeriod(p) => ApiError::invalid_period(format!("unknown period: {p}")),
            CoreError::InvalidDateFormat(d) => ApiError::invalid_date_format(format!("bad date: {d}")),
            CoreError::JobAlreadyRunning(job) => ApiError::job_already_running(job),
            CoreError::Invariant(msg) => ApiError::internal(msg),
            CoreError::Database(e) => {
                tracing::error!(error = ?e, "database error");
                ApiError::internal("an unexpected database error occurred")
            }
            CoreError::Redis(e) => {
                tracing::error!(error = ?e, "redis error");
                ApiError::internal("an unexpected cache error occurred")
            }
            CoreError::Upstream(msg) => {
                tracing::error!(error = %msg, "upstream product service error");
                ApiError::internal("an unexpected upstream error occurred")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let correlation_id = Uuid::new_v4().to_string();
        let payload = ErrorResponse {
            error: self.error,
            message: self.message,
            code: self.status.as_u16(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            correlation_id: correlation_id.clone(),
        };

        let mut response = (self.status, Json(payload)).into_response();
        if let Ok(value) = HeaderValue::from_str(&correlation_id) {
            response.headers_mut().insert(header::HeaderName::from_static("x-correlation-id"), value);
        }
        response
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
