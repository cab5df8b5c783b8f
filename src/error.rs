use std::{convert::Infallible, fmt::Display, string::FromUtf8Error};

use http_body_util::Full;
use hyper::{body::Bytes, header, StatusCode};

use crate::response::IntoStatusCode;

/// Failure produced by a controller's `init` or by one of its actions.
///
/// Every error carries the status it should be reported with. Conversions
/// that have no status of their own use `500 Internal Server Error`; build
/// the error from a `(status, message)` tuple to pick another one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    status: StatusCode,
    message: String,
}

impl Error {
    pub fn new<S: IntoStatusCode, M: Display>(status: S, message: M) -> Self {
        Error {
            status: status.into_status_code(),
            message: message.to_string(),
        }
    }

    /// Error with an internal server error status.
    pub fn internal<M: Display>(message: M) -> Self {
        Error::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Plain text response for failures that happen outside of a controller,
    /// e.g. when the request body could not be read.
    pub fn into_response(self) -> hyper::Response<Full<Bytes>> {
        let mut response = hyper::Response::new(Full::new(Bytes::from(format!(
            "{}\n",
            self.message
        ))));
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::internal(value)
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: value,
        }
    }
}

impl From<StatusCode> for Error {
    fn from(value: StatusCode) -> Self {
        Error::new(value, value.canonical_reason().unwrap_or_default())
    }
}

impl From<u16> for Error {
    fn from(value: u16) -> Self {
        Error::from(value.into_status_code())
    }
}

impl<C: IntoStatusCode, M: Display> From<(C, M)> for Error {
    fn from(value: (C, M)) -> Self {
        Error::new(value.0, value.1)
    }
}

impl From<Infallible> for Error {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::internal(value)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(value: std::fmt::Error) -> Self {
        Error::internal(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::internal(value)
    }
}

impl From<serde_qs::Error> for Error {
    fn from(value: serde_qs::Error) -> Self {
        Error::internal(value)
    }
}

impl From<hyper::Error> for Error {
    fn from(value: hyper::Error) -> Self {
        Error::internal(value)
    }
}

impl From<hyper::http::Error> for Error {
    fn from(value: hyper::http::Error) -> Self {
        Error::internal(value)
    }
}

impl From<FromUtf8Error> for Error {
    fn from(value: FromUtf8Error) -> Self {
        Error::internal(value)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for Error {
    fn from(value: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Error::internal(value)
    }
}

#[cfg(feature = "tera")]
impl From<tera::Error> for Error {
    fn from(value: tera::Error) -> Self {
        Error::internal(value)
    }
}

#[cfg(feature = "handlebars")]
impl From<handlebars::RenderError> for Error {
    fn from(value: handlebars::RenderError) -> Self {
        Error::internal(value)
    }
}

#[cfg(feature = "handlebars")]
impl From<handlebars::TemplateError> for Error {
    fn from(value: handlebars::TemplateError) -> Self {
        Error::internal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_messages_are_internal_errors() {
        let err = Error::from("action failed");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "action failed");

        let err = Error::from(String::from("init failed"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "init failed");
    }

    #[test]
    fn tuples_keep_their_status() {
        let err = Error::from((404, "no such user"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "no such user");

        let err = Error::from((StatusCode::BAD_REQUEST, 7));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "7");
    }

    #[test]
    fn status_codes_use_their_reason() {
        let err = Error::from(StatusCode::FORBIDDEN);
        assert_eq!(err.message(), "Forbidden");

        // Out of range codes fall back to a server error.
        let err = Error::from(1000u16);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn into_response_is_plain_text() {
        let response = Error::from((StatusCode::CONFLICT, "taken")).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}
