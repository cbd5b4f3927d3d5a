//! Gateway error responses

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bites_core::ClientError;
use thiserror::Error;
use tracing::error;

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Every way a gateway request can end without a success body
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed path or query parameter, rejected before any bus call
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The store answered with a non-success status
    #[error("Store replied with status {status}")]
    Reply { status: u16, body: Vec<u8> },

    /// No answer: timeout or transport failure
    #[error("Store unavailable: {0}")]
    Unavailable(#[from] ClientError),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            GatewayError::Reply { status, body } => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let body = if body.is_empty() {
                    status.canonical_reason().unwrap_or_default().as_bytes().to_vec()
                } else {
                    body
                };
                (status, [(header::CONTENT_TYPE, TEXT_PLAIN_UTF8)], body).into_response()
            }
            GatewayError::Unavailable(e) => {
                error!(error = %e, "Store request failed");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, status.canonical_reason().unwrap_or_default()).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_status_is_kept() {
        let resp = GatewayError::Reply {
            status: 404,
            body: Vec::new(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = GatewayError::Reply {
            status: 409,
            body: b"exists".to_vec(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_reply_body_bytes_are_kept() {
        use http_body_util::BodyExt;

        let raw = vec![0xff, 0xfe, b'!'];
        let resp = GatewayError::Reply {
            status: 500,
            body: raw.clone(),
        }
        .into_response();
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            TEXT_PLAIN_UTF8
        );
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.to_vec(), raw);
    }

    #[test]
    fn test_unknown_status_becomes_server_error() {
        let resp = GatewayError::Reply {
            status: 42,
            body: Vec::new(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unavailable_is_server_error() {
        let resp = GatewayError::Unavailable(ClientError::Timeout).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp =
            GatewayError::Unavailable(ClientError::Transport("refused".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
