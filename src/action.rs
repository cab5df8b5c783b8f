//! Turning controller methods into request handlers.
//!
//! [`action`] is checked by the compiler when a route is registered. A method
//! is only accepted if it has the shape `fn(&mut C) -> Result<(), E>` where
//! `C` implements [`Controller`] and `E` converts into [`Error`]. Every other
//! shape is rejected before the program runs:
//!
//! A value that can't be called:
//! ```compile_fail
//! let _ = tela_controller::action("bad");
//! ```
//!
//! A method without the controller argument:
//! ```compile_fail
//! fn index() -> Result<(), tela_controller::Error> { Ok(()) }
//! let _ = tela_controller::action(index);
//! ```
//!
//! A method with more than one argument:
//! ```compile_fail
//! use tela_controller::{controller, Base, Error};
//!
//! #[derive(Default)]
//! struct Users { base: Base }
//! controller!(Users => base);
//!
//! impl Users {
//!     fn show(&mut self, _id: u32) -> Result<(), Error> { Ok(()) }
//! }
//! let _ = tela_controller::action(Users::show);
//! ```
//!
//! A method that returns nothing, or something that isn't an error:
//! ```compile_fail
//! use tela_controller::{controller, Base};
//!
//! #[derive(Default)]
//! struct Users { base: Base }
//! controller!(Users => base);
//!
//! impl Users {
//!     fn index(&mut self) {}
//! }
//! let _ = tela_controller::action(Users::index);
//! ```
//! ```compile_fail
//! use tela_controller::{controller, Base};
//!
//! #[derive(Default)]
//! struct Users { base: Base }
//! controller!(Users => base);
//!
//! impl Users {
//!     fn index(&mut self) -> String { String::new() }
//! }
//! let _ = tela_controller::action(Users::index);
//! ```
//!
//! A method on a type that isn't a controller:
//! ```compile_fail
//! #[derive(Default)]
//! struct NoController;
//!
//! impl NoController {
//!     fn index(&mut self) -> Result<(), tela_controller::Error> { Ok(()) }
//! }
//! let _ = tela_controller::action(NoController::index);
//! ```

use std::{
    any::type_name,
    fmt::Debug,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use crate::{
    controller::Controller, error::Error, request::Request, response::ResponseWriter,
    service::Handler,
};

/// Return type of a controller action.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be returned from a controller action",
    label = "actions must return `Result<(), E>` where `E: Into<tela_controller::Error>`"
)]
pub trait ActionResult {
    fn into_outcome(self) -> Result<(), Error>;
}

impl<E: Into<Error>> ActionResult for Result<(), E> {
    fn into_outcome(self) -> Result<(), Error> {
        self.map_err(Into::into)
    }
}

/// Request handler built from a controller method with [`action`].
///
/// Cloning is cheap and clones share the registered method. Each call to
/// [`Handler::serve`] builds its own controller, so an `Action` can serve any
/// number of requests at once.
#[derive(Clone)]
pub struct Action {
    controller: &'static str,
    run: Arc<dyn Fn(ResponseWriter, Request) + Send + Sync>,
}

impl Action {
    /// Type name of the controller this action constructs.
    pub fn controller(&self) -> &'static str {
        self.controller
    }
}

impl Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Action({})", self.controller)
    }
}

impl Handler for Action {
    fn serve(&self, rw: ResponseWriter, request: Request) {
        let _span = tracing::debug_span!("action", controller = self.controller).entered();
        (self.run)(rw, request)
    }
}

/// Build a request handler from a controller method.
///
/// For every request the handler:
///
/// 1. Constructs a new `C` with `Default`
/// 2. Calls [`Controller::init`] with the response writer and request
/// 3. Invokes `method` if `init` succeeded
/// 4. Reports an error from `init` or `method` with [`Controller::error`]
/// 5. Calls [`Controller::destroy`]
///
/// `destroy` runs on every path out of the handler, including a panic in
/// `method`.
///
/// # Example
/// ```
/// use tela_controller::{action, controller, Base, Error, Handler, Request};
///
/// #[derive(Default)]
/// struct Home {
///     base: Base,
/// }
///
/// controller!(Home => base);
///
/// impl Home {
///     fn index(&mut self) -> Result<(), Error> {
///         self.base.response.write("Hello World");
///         Ok(())
///     }
/// }
///
/// let index = action(Home::index);
/// let response = index.respond(Request::default());
/// assert_eq!(response.status(), 200);
/// ```
pub fn action<C, F, R>(method: F) -> Action
where
    C: Controller,
    F: Fn(&mut C) -> R + Send + Sync + 'static,
    R: ActionResult,
{
    let controller = type_name::<C>();
    tracing::debug!(controller, "registered action");

    Action {
        controller,
        run: Arc::new(move |rw, request| dispatch::<C, F, R>(&method, rw, request)),
    }
}

fn dispatch<C, F, R>(method: &F, rw: ResponseWriter, request: Request)
where
    C: Controller,
    F: Fn(&mut C) -> R,
    R: ActionResult,
{
    let mut controller = Lifecycle(C::default());

    let outcome = match controller.init(rw.clone(), request) {
        Ok(()) => method(&mut *controller).into_outcome().map_err(|err| {
            tracing::warn!(status = err.status().as_u16(), "action failed: {}", err);
            err
        }),
        Err(err) => {
            tracing::warn!(status = err.status().as_u16(), "controller init failed: {}", err);
            Err(err)
        }
    };

    if let Err(err) = outcome {
        controller.error(err.status(), err.message());
        // `error` wrote somewhere else, e.g. `init` failed before storing the writer.
        if !rw.is_committed() {
            rw.write_error(err.status(), err.message());
        }
    }
}

/// Owns the controller for one request and destroys it when dropped.
struct Lifecycle<C: Controller>(C);

impl<C: Controller> Deref for Lifecycle<C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<C: Controller> DerefMut for Lifecycle<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<C: Controller> Drop for Lifecycle<C> {
    fn drop(&mut self) {
        self.0.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        panic::{self, AssertUnwindSafe},
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    use hyper::StatusCode;

    use super::*;
    use crate::controller::Base;

    static CALLS: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());
    static DESTROYED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Recorder {
        base: Base,
    }

    impl Controller for Recorder {
        fn init(&mut self, rw: ResponseWriter, request: Request) -> Result<(), Error> {
            CALLS.lock().unwrap().push("init");
            self.base.init(rw, request)?;
            match self.base.request.path() {
                "/init-fails" => Err(Error::from("init failed")),
                _ => Ok(()),
            }
        }

        fn destroy(&mut self) {
            CALLS.lock().unwrap().push("destroy");
        }

        fn error(&mut self, code: StatusCode, message: &str) {
            CALLS.lock().unwrap().push("error");
            self.base.error(code, message);
        }
    }

    impl Recorder {
        fn index(&mut self) -> Result<(), Error> {
            CALLS.lock().unwrap().push("index");
            self.base.response.write("Hello World");
            Ok(())
        }

        fn fails(&mut self) -> Result<(), Error> {
            CALLS.lock().unwrap().push("fails");
            Err(Error::from("action failed"))
        }
    }

    #[derive(Default)]
    struct Panics;

    impl Controller for Panics {
        fn init(&mut self, _rw: ResponseWriter, _request: Request) -> Result<(), Error> {
            Ok(())
        }

        fn destroy(&mut self) {
            DESTROYED.fetch_add(1, Ordering::SeqCst);
        }

        fn error(&mut self, _code: StatusCode, _message: &str) {}
    }

    impl Panics {
        fn boom(&mut self) -> Result<(), Error> {
            panic!("boom")
        }
    }

    fn request(path: &str) -> Request {
        Request::builder().uri(path).body("").unwrap()
    }

    // One test for every path through the lifecycle; CALLS is shared.
    #[test]
    fn lifecycle_order() {
        let index = action(Recorder::index);
        let fails = action(Recorder::fails);

        CALLS.lock().unwrap().clear();
        let response = index.respond(request("/"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*CALLS.lock().unwrap(), ["init", "index", "destroy"]);

        CALLS.lock().unwrap().clear();
        let response = index.respond(request("/init-fails"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(*CALLS.lock().unwrap(), ["init", "error", "destroy"]);

        CALLS.lock().unwrap().clear();
        let response = fails.respond(request("/"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(*CALLS.lock().unwrap(), ["init", "fails", "error", "destroy"]);
    }

    #[test]
    fn destroy_runs_when_action_panics() {
        let boom = action(Panics::boom);
        let result = panic::catch_unwind(AssertUnwindSafe(|| boom.respond(Request::default())));

        assert!(result.is_err());
        assert_eq!(DESTROYED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn closures_are_actions() {
        let greeting = String::from("hi");
        let hello = action(move |c: &mut Base| -> Result<(), Error> {
            c.response.write(&greeting);
            Ok(())
        });

        assert!(hello.controller().ends_with("Base"));
        assert_eq!(format!("{:?}", hello), format!("Action({})", hello.controller()));
    }

    #[test]
    fn action_errors_keep_their_status() {
        let missing = action(|_: &mut Base| Err::<(), _>((StatusCode::NOT_FOUND, "no such page")));
        let response = missing.respond(Request::default());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
