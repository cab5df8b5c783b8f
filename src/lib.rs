//! Request scoped controllers for hyper.
//!
//! Plain handlers are not always enough: sometimes logic belongs to a
//! resource and data belongs to a single request. A controller is a struct
//! that implements the [`Controller`] lifecycle and has any number of action
//! methods. [`action`] turns one of those methods into a [`Handler`] that
//! builds a new controller for every request, initializes it, runs the
//! action, reports errors and cleans up.
//!
//! ```
//! use tela_controller::{action, controller, Base, Error, Handler, Request};
//!
//! #[derive(Default)]
//! struct Greeter {
//!     base: Base,
//! }
//!
//! controller!(Greeter => base);
//!
//! impl Greeter {
//!     fn index(&mut self) -> Result<(), Error> {
//!         self.base.response.write("Hello World");
//!         Ok(())
//!     }
//! }
//!
//! let index = action(Greeter::index);
//! let response = index.respond(Request::default());
//! assert_eq!(response.status(), 200);
//! ```
//!
//! Use [`service`] to serve a handler with hyper.

mod action;
mod controller;
mod error;
mod service;

pub mod request;
pub mod response;
pub mod view;

pub use action::{action, Action, ActionResult};
pub use controller::{Base, Controller};
pub use error::Error;
pub use request::Request;
pub use response::{IntoStatusCode, ResponseWriter};
pub use service::{service, Handler, HandlerFuture, HandlerService};

pub use hyper::StatusCode;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
