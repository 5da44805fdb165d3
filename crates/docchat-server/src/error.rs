//! Mapping of domain errors onto HTTP responses

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use docchat_core::Error;

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// An [`Error`] on its way to the client
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::InvalidInput(rejection.body_text()))
    }
}

/// HTTP status for each error class
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::DirectoryNotFound(_) | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        Error::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Upstream(_) | Error::MalformedStreamFrame { .. } => StatusCode::BAD_GATEWAY,
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = %self.0, "request failed");
        } else {
            tracing::debug!(kind = self.0.kind(), error = %self.0, "request rejected");
        }

        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::DirectoryNotFound(PathBuf::from("/x")), 400),
            (Error::InvalidInput("blank".into()), 400),
            (Error::UnsupportedFormat(".png".into()), 415),
            (Error::Extraction("bad pdf".into()), 422),
            (Error::Upstream("down".into()), 502),
            (Error::malformed_frame(b"{oops", "eof"), 502),
            (Error::Timeout("slow".into()), 504),
            (Error::InvalidConfiguration("dim".into()), 500),
            (Error::Other("?".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(&err).as_u16(), status, "{}", err.kind());
        }
    }
}
