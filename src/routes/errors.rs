//! HTTP representation of service errors.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::services::ServiceError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ServiceError {
    /// Stable machine-readable code of the error.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Unauthorized => "unauthorized",
            ServiceError::UpstreamUnauthorized => "upstream_unauthorized",
            ServiceError::Forbidden => "forbidden",
            ServiceError::NotFound => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Form(_) | ServiceError::TypeConstraint(_) => "invalid_input",
            ServiceError::RateLimited => "rate_limited",
            ServiceError::Upstream(_) => "upstream_error",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Form(_) | ServiceError::TypeConstraint(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized | ServiceError::UpstreamUnauthorized => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("Request failed: {self}");
            match self {
                ServiceError::Upstream(_) => "upstream service failed".to_string(),
                _ => "internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(ErrorBody {
            error: self.code(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            ServiceError::Form("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ServiceError::Upstream("avito".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[actix_web::test]
    async fn server_errors_hide_details() {
        let response = ServiceError::Internal("database is locked".into()).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "internal server error");
    }

    #[actix_web::test]
    async fn client_errors_carry_message() {
        let response = ServiceError::Form("invalid email address".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "invalid_input");
        assert_eq!(body["message"], "invalid email address");
    }

    #[actix_web::test]
    async fn rejected_integration_credentials_are_not_a_session_error() {
        let response = ServiceError::UpstreamUnauthorized.error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "upstream_unauthorized");
        assert_eq!(
            body["message"],
            "the advertising platform rejected the integration credentials"
        );
    }
}
