use std::{
    fmt::Debug,
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use bytes::BytesMut;
use http_body_util::Full;
use hyper::{
    body::Bytes,
    header::{self, HeaderName, HeaderValue},
    HeaderMap, StatusCode,
};

use crate::error::Error;

pub trait IntoStatusCode {
    fn into_status_code(self) -> StatusCode;
}
impl IntoStatusCode for StatusCode {
    fn into_status_code(self) -> StatusCode {
        self
    }
}
impl IntoStatusCode for u16 {
    /// Codes hyper rejects become `500 Internal Server Error`.
    fn into_status_code(self) -> StatusCode {
        StatusCode::from_u16(self).unwrap_or_else(|_| {
            tracing::warn!(code = self, "invalid status code; using 500 Internal Server Error");
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }
}

#[derive(Debug, Default)]
struct Buffer {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    committed: bool,
}

/// Response sink for a single request.
///
/// A writer is a handle: clones share the same buffer, which is how the
/// dispatcher reads back what a controller wrote once the controller is gone.
/// The first write commits the status; later status changes are ignored.
#[derive(Clone, Default)]
pub struct ResponseWriter(Arc<Mutex<Buffer>>);

impl ResponseWriter {
    pub fn new() -> Self {
        ResponseWriter::default()
    }

    fn buffer(&self) -> MutexGuard<'_, Buffer> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append bytes to the response body.
    pub fn write<B: AsRef<[u8]>>(&self, bytes: B) {
        let mut buffer = self.buffer();
        buffer.committed = true;
        buffer.body.extend_from_slice(bytes.as_ref());
    }

    /// Set the response status. Has no effect once the body was written to.
    pub fn set_status<S: IntoStatusCode>(&self, status: S) {
        let mut buffer = self.buffer();
        if buffer.committed {
            tracing::debug!("status already committed; ignoring {}", status.into_status_code());
            return;
        }
        buffer.status = status.into_status_code();
    }

    /// Insert a response header, replacing any previous value.
    pub fn header<K, V>(&self, key: K, value: V) -> Result<(), Error>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let key = HeaderName::from_bytes(key.as_ref().as_bytes())
            .map_err(|err| Error::internal(format!("invalid header name: {}", err)))?;
        let value = HeaderValue::from_str(value.as_ref())
            .map_err(|err| Error::internal(format!("invalid header value: {}", err)))?;
        self.buffer().headers.insert(key, value);
        Ok(())
    }

    /// Reply with a plain text error.
    ///
    /// The status is only applied when nothing has been written yet; the
    /// message is always appended, followed by a newline.
    pub fn write_error<S: IntoStatusCode>(&self, status: S, message: &str) {
        let mut buffer = self.buffer();
        buffer.headers.remove(header::CONTENT_LENGTH);
        buffer.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        buffer.headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        if !buffer.committed {
            buffer.status = status.into_status_code();
            buffer.committed = true;
        }
        buffer.body.extend_from_slice(message.as_bytes());
        buffer.body.extend_from_slice(b"\n");
    }

    pub fn status(&self) -> StatusCode {
        self.buffer().status
    }

    pub fn is_committed(&self) -> bool {
        self.buffer().committed
    }

    /// Copy of the body written so far.
    pub fn body(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buffer().body)
    }

    /// Drain the buffer into a hyper response.
    ///
    /// Other clones of this writer are left with an empty buffer.
    pub fn into_response(self) -> hyper::Response<Full<Bytes>> {
        let buffer = mem::take(&mut *self.buffer());
        let mut response = hyper::Response::new(Full::new(buffer.body.freeze()));
        *response.status_mut() = buffer.status;
        *response.headers_mut() = buffer.headers;
        response
    }
}

impl Debug for ResponseWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let buffer = self.buffer();
        f.debug_struct("ResponseWriter")
            .field("status", &buffer.status)
            .field("headers", &buffer.headers)
            .field("body", &buffer.body.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_status_codes_fall_back_to_500() {
        assert_eq!(404u16.into_status_code(), StatusCode::NOT_FOUND);
        assert_eq!(42u16.into_status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(1000u16.into_status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let rw = ResponseWriter::new();
        rw.set_status(12);
        assert_eq!(rw.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn clones_share_the_buffer() {
        let rw = ResponseWriter::new();
        let other = rw.clone();
        other.write("Hello ");
        rw.write(b"World");

        assert_eq!(rw.body(), "Hello World");
        assert_eq!(rw.status(), StatusCode::OK);
    }

    #[test]
    fn status_is_committed_by_first_write() {
        let rw = ResponseWriter::new();
        rw.set_status(201);
        rw.write("created");
        rw.set_status(StatusCode::ACCEPTED);

        assert!(rw.is_committed());
        assert_eq!(rw.status(), StatusCode::CREATED);
    }

    #[test]
    fn write_error_sets_status_and_plain_text() {
        let rw = ResponseWriter::new();
        rw.header("Content-Length", "12").unwrap();
        rw.write_error(500, "init failed");

        let response = rw.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
    }

    #[test]
    fn write_error_after_write_keeps_status() {
        let rw = ResponseWriter::new();
        rw.write("partial ");
        rw.write_error(StatusCode::BAD_GATEWAY, "upstream failed");

        assert_eq!(rw.status(), StatusCode::OK);
        assert_eq!(rw.body(), "partial upstream failed\n");
    }

    #[test]
    fn invalid_headers_are_rejected() {
        let rw = ResponseWriter::new();
        assert!(rw.header("bad header", "value").is_err());
        assert!(rw.header("X-Ok", "line\nbreak").is_err());
        assert!(rw.header("X-Ok", "fine").is_ok());
    }

    #[test]
    fn into_response_drains_shared_buffer() {
        let rw = ResponseWriter::new();
        let held = rw.clone();
        rw.write("body");
        rw.header("X-Request", "1").unwrap();

        let response = rw.into_response();
        assert_eq!(response.headers()["x-request"], "1");
        assert!(held.body().is_empty());
    }
}
