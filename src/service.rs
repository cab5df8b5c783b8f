use std::{convert::Infallible, future::Future, pin::Pin, sync::Arc};

use http_body_util::Full;
use hyper::{body::Bytes, service::Service, StatusCode};

use crate::{
    error::Error,
    request::{Request, DEFAULT_BODY_LIMIT},
    response::ResponseWriter,
};

pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<hyper::Response<Full<Bytes>>, Infallible>> + Send>>;

/// Handles one request by writing to the response writer.
///
/// Implemented by [`Action`](crate::Action) and by any
/// `Fn(ResponseWriter, Request)` closure.
pub trait Handler: Send + Sync + 'static {
    fn serve(&self, rw: ResponseWriter, request: Request);

    /// Serve `request` into a fresh writer and convert it to a hyper response.
    fn respond(&self, request: Request) -> hyper::Response<Full<Bytes>> {
        let rw = ResponseWriter::new();
        self.serve(rw.clone(), request);
        rw.into_response()
    }
}

impl<F> Handler for F
where
    F: Fn(ResponseWriter, Request) + Send + Sync + 'static,
{
    fn serve(&self, rw: ResponseWriter, request: Request) {
        self(rw, request)
    }
}

/// Adapts a [`Handler`] to hyper's `Service` so it can be passed to
/// `serve_connection`.
///
/// The request body is read before the handler runs, up to
/// [`DEFAULT_BODY_LIMIT`] bytes unless changed with
/// [`HandlerService::with_body_limit`]. Handlers are synchronous so they run
/// on tokio's blocking pool; a panic in a handler results in a bare
/// `500 Internal Server Error`.
pub struct HandlerService<H> {
    handler: Arc<H>,
    body_limit: usize,
}

pub fn service<H: Handler>(handler: H) -> HandlerService<H> {
    HandlerService {
        handler: Arc::new(handler),
        body_limit: DEFAULT_BODY_LIMIT,
    }
}

impl<H> HandlerService<H> {
    /// Answer requests with a body over `limit` bytes with `413`.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

impl<H> Clone for HandlerService<H> {
    fn clone(&self) -> Self {
        HandlerService {
            handler: self.handler.clone(),
            body_limit: self.body_limit,
        }
    }
}

impl<H, B> Service<hyper::Request<B>> for HandlerService<H>
where
    H: Handler,
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = hyper::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = HandlerFuture;

    fn call(&self, req: hyper::Request<B>) -> Self::Future {
        let handler = self.handler.clone();
        let body_limit = self.body_limit;
        Box::pin(async move {
            let request = match Request::from_hyper_limited(req, body_limit).await {
                Ok(request) => request,
                Err(err) => {
                    tracing::warn!(
                        status = err.status().as_u16(),
                        "failed to read request body: {}",
                        err
                    );
                    return Ok(err.into_response());
                }
            };

            let method = request.method().clone();
            let path = request.path().to_string();

            let response = match tokio::task::spawn_blocking(move || handler.respond(request)).await
            {
                Ok(response) => response,
                Err(err) => {
                    tracing::error!(%method, path, "handler did not complete: {}", err);
                    Error::from(StatusCode::INTERNAL_SERVER_ERROR).into_response()
                }
            };

            tracing::debug!(%method, path, status = response.status().as_u16(), "served request");
            Ok(response)
        })
    }
}
