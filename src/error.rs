use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::telemetry::Telemetry;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure classes an upstream call can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    BadRequest,
    Unauthorized,
    NotFound,
    RateLimited,
    InvalidResponse,
    NotConfigured,
    Unavailable,
    Timeout,
}

impl UpstreamErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::RateLimited => 429,
            Self::InvalidResponse | Self::NotConfigured => 500,
            Self::Unavailable => 503,
            Self::Timeout => 504,
        }
    }

    /// Classify a non-2xx upstream HTTP status.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            400..=499 => Self::BadRequest,
            _ => Self::Unavailable,
        }
    }
}

#[derive(Debug, Error)]
#[error("{message} (upstream status {})", .kind.status_code())]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    pub message: String,
    #[source]
    pub cause: Option<BoxError>,
}

impl UpstreamError {
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::NotFound, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::InvalidResponse, message)
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::NotConfigured, message)
    }

    /// Classify a transport-level failure: timeouts are 504, everything
    /// else (DNS, refused connection, TLS) is 503.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(UpstreamErrorKind::Timeout, "Upstream request timed out").with_cause(err)
        } else {
            Self::new(UpstreamErrorKind::Unavailable, "Upstream service unreachable").with_cause(err)
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
}

/// Error returned to HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "validation_error",
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal_error",
            message: message.into(),
        }
    }
}

impl From<&UpstreamError> for ApiError {
    fn from(err: &UpstreamError) -> Self {
        let (status, code, message) = match err.kind {
            UpstreamErrorKind::BadRequest => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                "Invalid request parameters",
            ),
            UpstreamErrorKind::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "unauthorized", "Invalid API key")
            }
            UpstreamErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found", "City not found"),
            UpstreamErrorKind::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Rate limit exceeded",
            ),
            UpstreamErrorKind::InvalidResponse | UpstreamErrorKind::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "upstream_error",
                "Invalid response from weather service",
            ),
            UpstreamErrorKind::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "Weather service unavailable",
            ),
            UpstreamErrorKind::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
                "Weather service timed out",
            ),
        };

        Self {
            status,
            code,
            message: message.to_string(),
        }
    }
}

/// Translate an upstream failure for the HTTP client. Rate limiting is also
/// surfaced to monitoring; it never triggers a retry.
pub fn map_upstream_error(err: &UpstreamError, telemetry: &dyn Telemetry) -> ApiError {
    if err.kind == UpstreamErrorKind::RateLimited {
        telemetry.rate_limited(
            "Upstream rate limit exceeded",
            json!({ "status": err.status_code(), "upstream_message": err.message }),
        );
    }
    ApiError::from(err)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorInfo {
                code: self.code,
                message: self.message,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::testing::{Recorded, RecordingTelemetry};

    #[test]
    fn test_http_status_classification() {
        assert_eq!(UpstreamErrorKind::from_http_status(401), UpstreamErrorKind::Unauthorized);
        assert_eq!(UpstreamErrorKind::from_http_status(403), UpstreamErrorKind::Unauthorized);
        assert_eq!(UpstreamErrorKind::from_http_status(404), UpstreamErrorKind::NotFound);
        assert_eq!(UpstreamErrorKind::from_http_status(429), UpstreamErrorKind::RateLimited);
        assert_eq!(UpstreamErrorKind::from_http_status(422), UpstreamErrorKind::BadRequest);
        assert_eq!(UpstreamErrorKind::from_http_status(502), UpstreamErrorKind::Unavailable);
    }

    #[test]
    fn test_mapper_preserves_status_with_fixed_messages() {
        let telemetry = RecordingTelemetry::default();
        let cases = [
            (UpstreamErrorKind::BadRequest, 400, "Invalid request parameters"),
            (UpstreamErrorKind::Unauthorized, 401, "Invalid API key"),
            (UpstreamErrorKind::NotFound, 404, "City not found"),
            (UpstreamErrorKind::RateLimited, 429, "Rate limit exceeded"),
            (UpstreamErrorKind::InvalidResponse, 500, "Invalid response from weather service"),
            (UpstreamErrorKind::Unavailable, 503, "Weather service unavailable"),
            (UpstreamErrorKind::Timeout, 504, "Weather service timed out"),
        ];

        for (kind, status, message) in cases {
            let err = UpstreamError::new(kind, "raw upstream text, not for clients");
            let api = map_upstream_error(&err, &telemetry);
            assert_eq!(api.status.as_u16(), status);
            assert_eq!(err.status_code(), status);
            assert_eq!(api.message, message);
        }
    }

    #[test]
    fn test_rate_limit_notifies_telemetry() {
        let telemetry = RecordingTelemetry::default();
        let err = UpstreamError::new(UpstreamErrorKind::RateLimited, "slow down");

        map_upstream_error(&err, &telemetry);

        let events = telemetry.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Recorded::RateLimited { context, .. } => {
                assert_eq!(context["status"], 429);
                assert_eq!(context["upstream_message"], "slow down");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_other_errors_do_not_notify_telemetry() {
        let telemetry = RecordingTelemetry::default();
        map_upstream_error(&UpstreamError::not_found("City not found"), &telemetry);
        map_upstream_error(&UpstreamError::invalid_response("bad shape"), &telemetry);
        assert!(telemetry.events().is_empty());
    }
}
