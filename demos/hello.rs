//! Serve a single controller action.
//!
//! ```text
//! RUST_LOG=debug cargo run --example hello
//! curl localhost:3210/?name=tela
//! ```
//! https://hyper.rs/guides/1/server/hello-world/

use std::net::SocketAddr;

use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tela_controller::{action, controller, service, Base, Error, Handler, StatusCode};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Defines whether the socket address should be localhost or on the network.
pub enum Socket {
    Local(u16),
    Network(u16),
}

impl Default for Socket {
    fn default() -> Self {
        Socket::Local(3210)
    }
}

/// Convert a `([u8; 4], u16)` tuple or a [`Socket`] into a SocketAddr.
pub trait IntoSocketAddr {
    fn into_socket_addr(self) -> SocketAddr;
}

impl IntoSocketAddr for ([u8; 4], u16) {
    fn into_socket_addr(self) -> SocketAddr {
        SocketAddr::from(self)
    }
}

impl IntoSocketAddr for Socket {
    fn into_socket_addr(self) -> SocketAddr {
        match self {
            Socket::Local(port) => SocketAddr::from(([127, 0, 0, 1], port)),
            Socket::Network(port) => SocketAddr::from(([0, 0, 0, 0], port)),
        }
    }
}

#[derive(Deserialize)]
struct Greeting {
    name: String,
}

#[derive(Default)]
struct Hello {
    base: Base,
}

controller!(Hello => base);

impl Hello {
    fn index(&mut self) -> Result<(), Error> {
        let greeting = self
            .base
            .request
            .query::<Greeting>()
            .map_err(|_| (StatusCode::BAD_REQUEST, "expected ?name=..."))?;
        self.base
            .response
            .write(format!("Hello, {}!", greeting.name));
        Ok(())
    }
}

async fn serve<A, H>(addr: A, handler: H) -> Result<(), Box<dyn std::error::Error>>
where
    A: IntoSocketAddr,
    H: Handler,
{
    let addr = addr.into_socket_addr();
    let listener = TcpListener::bind(addr).await?;
    let service = service(handler);
    tracing::info!("Serving at http://{}", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);

        // Create owned clone of the service.
        let service = service.clone();

        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::error!("Error serving connection: {}", err);
            }
        });
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    serve(Socket::default(), action(Hello::index)).await
}
