use std::time::Duration;

use aicif_common::error::CommonError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("config error: {0}")]
    Config(String),

    #[error("no route for {0}")]
    NotFound(String),

    #[error("rate limit exceeded (RATE_LIMIT_RPS={rps}): try again in ~{}ms", .retry_after.as_millis())]
    RateLimited { rps: u32, retry_after: Duration },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Common(_) | ProxyError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut response = (status, self.to_string()).into_response();
        if let ProxyError::RateLimited { retry_after, .. } = &self {
            // Retry-After is whole seconds; round up so clients never retry early.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            ProxyError::NotFound("/x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ProxyError::InvalidRequest("bad".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn rate_limited_sets_retry_after() {
        let response = ProxyError::RateLimited {
            rps: 2,
            retry_after: Duration::from_millis(400),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }
}
