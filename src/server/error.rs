use crate::error::ForgeError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

/// Errors surfaced by HTTP handlers as `{ "error": .., "code": .. }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("session {0} not found")]
    SessionNotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Forge(#[from] ForgeError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::SessionNotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Forge(err) => match err {
                ForgeError::ValidationError(_) => "VALIDATION_ERROR",
                ForgeError::DecodeError(_) => "DECODE_ERROR",
                ForgeError::TransportFailure { .. } | ForgeError::MalformedResponse(_) => {
                    "UPSTREAM_ERROR"
                }
                ForgeError::ConfigError(_) => "INTERNAL_ERROR",
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forge(err) => match err {
                ForgeError::ValidationError(_) | ForgeError::DecodeError(_) => {
                    StatusCode::BAD_REQUEST
                }
                ForgeError::TransportFailure { .. } | ForgeError::MalformedResponse(_) => {
                    StatusCode::BAD_GATEWAY
                }
                ForgeError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Forge(ForgeError::ConfigError(msg)) => {
                log::error!("Configuration error in handler: {}", msg);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({
            "error": message,
            "code": self.code(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::SessionNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ForgeError::DecodeError("bad".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ForgeError::transport(Some(500), "down")).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::BadRequest("x".into()).code(), "BAD_REQUEST");
    }
}
