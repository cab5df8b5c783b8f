use std::collections::HashMap;
use std::fmt::Display;

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::{
    body::Bytes,
    http::{request::Parts, HeaderValue},
    HeaderMap, Request as HttpRequest, StatusCode,
};
use serde::de::DeserializeOwned;

use crate::error::Error;

pub use hyper::{Method, Uri, Version};

pub type Headers = HeaderMap<HeaderValue>;

/// Largest request body [`Request::from_hyper`] reads into memory: 2 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Request builder
pub struct Builder {
    uri: String,
    headers: HashMap<String, String>,
    method: String,
    version: Version,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            uri: String::from("/"),
            headers: HashMap::new(),
            method: String::from("GET"),
            version: Version::HTTP_11,
        }
    }
}

impl Builder {
    pub fn new() -> Self {
        Builder::default()
    }

    /// Set the request uri.
    pub fn uri<T>(mut self, uri: T) -> Self
    where
        T: ToString,
    {
        self.uri = uri.to_string().replace(' ', "%20");
        self
    }

    /// Add a request header.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: ToString,
        V: Display,
    {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the reqeust method.
    pub fn method<M>(mut self, method: M) -> Self
    where
        M: ToString,
    {
        self.method = method.to_string();
        self
    }

    /// Set the request http version.
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Set the requests body and return the Request
    pub fn body<B: Into<Bytes>>(self, body: B) -> Result<Request, Error> {
        let mut builder = HttpRequest::builder()
            .uri(self.uri)
            .method(self.method.as_str())
            .version(self.version);

        for (key, value) in self.headers.iter() {
            builder = builder.header(key, value);
        }

        let (head, _) = builder.body(())?.into_parts();
        Ok(Request {
            head: Head::from(head),
            body: body.into(),
        })
    }
}

/// Represents the different parts of a requests head properites.
#[derive(Debug, Clone)]
pub struct Head {
    pub method: Method,
    pub version: Version,
    pub headers: Headers,
    pub uri: Uri,
}

impl From<Parts> for Head {
    fn from(value: Parts) -> Self {
        Head {
            method: value.method,
            version: value.version,
            headers: value.headers,
            uri: value.uri,
        }
    }
}

impl Default for Head {
    fn default() -> Self {
        Head {
            method: Method::GET,
            version: Version::HTTP_11,
            headers: Headers::new(),
            uri: Uri::from_static("/"),
        }
    }
}

/// Incoming request with its body already read into memory.
///
/// Controllers receive the request in `init`; actions run synchronously, so
/// the body is collected before the controller is created.
#[derive(Debug, Clone, Default)]
pub struct Request {
    head: Head,
    body: Bytes,
}

impl Request {
    /// Build a request.
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Collect a hyper request's body and wrap it.
    ///
    /// At most [`DEFAULT_BODY_LIMIT`] bytes are read; a larger body is a
    /// `413 Payload Too Large` error.
    pub async fn from_hyper<B>(request: HttpRequest<B>) -> Result<Self, Error>
    where
        B: hyper::body::Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Request::from_hyper_limited(request, DEFAULT_BODY_LIMIT).await
    }

    /// Same as [`Request::from_hyper`] with a body cap of `limit` bytes.
    pub async fn from_hyper_limited<B>(request: HttpRequest<B>, limit: usize) -> Result<Self, Error>
    where
        B: hyper::body::Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (head, body) = request.into_parts();
        let body = match Limited::new(body, limit).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.is::<LengthLimitError>() => {
                return Err(Error::new(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("request body is larger than {} bytes", limit),
                ))
            }
            Err(err) => return Err(Error::new(StatusCode::BAD_REQUEST, err)),
        };
        Ok(Request {
            head: Head::from(head),
            body,
        })
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn version(&self) -> Version {
        self.head.version
    }

    pub fn headers(&self) -> &Headers {
        &self.head.headers
    }

    /// Value of a header if present and valid utf-8.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.head
            .headers
            .get(key)
            .and_then(|value| value.to_str().ok())
    }

    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    pub fn path(&self) -> &str {
        self.head.uri.path()
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as utf-8 text.
    pub fn text(&self) -> Result<String, Error> {
        Ok(String::from_utf8(self.body.to_vec())?)
    }

    /// Body parsed as json.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Get the uri's query as another data type.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, Error> {
        match self.head.uri.query() {
            Some(query) => Ok(serde_qs::from_str::<T>(query)?),
            None => Err(Error::new(
                StatusCode::BAD_REQUEST,
                "No query available to parse",
            )),
        }
    }
}
