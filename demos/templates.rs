//! Render tera templates from a view controller.
//!
//! ```text
//! cargo run --example templates --features tera
//! ```

use std::net::SocketAddr;

use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use tela_controller::{
    action, context, controller, service,
    view::{Tera, TemplateEngine, ViewController},
    Error,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Home {
    view: ViewController<Tera>,
}

controller!(Home => view);

impl Home {
    fn index(&mut self) -> Result<(), Error> {
        let path = self.view.base.request.path().to_string();
        self.view.set("path", path)?;
        self.view.set("items", ["controllers", "actions", "views"])?;
        self.view.html(200, "index.html")
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    Tera::init("demos/templates", context! { title: "Tela Controllers" })?;

    let addr = SocketAddr::from(([127, 0, 0, 1], 3210));
    let listener = TcpListener::bind(addr).await?;
    let service = service(action(Home::index));
    tracing::info!("Serving at http://{}", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let service = service.clone();
        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::error!("Error serving connection: {}", err);
            }
        });
    }
}
