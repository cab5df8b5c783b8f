use hyper::StatusCode;

use crate::{error::Error, request::Request, response::ResponseWriter};

/// Lifecycle every controller goes through for a single request.
///
/// A new instance is built with `Default` for every request handled by an
/// [`Action`](crate::Action), so nothing stored on `self` outlives the
/// request.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Controller`",
    label = "actions must take `&mut` of a controller type",
    note = "embed `tela_controller::Base` and delegate with `controller!({Self} => base)`"
)]
pub trait Controller: Default + Send + 'static {
    /// Prepare the controller for the request. Returning an error skips the
    /// action and reports the error through [`Controller::error`].
    fn init(&mut self, rw: ResponseWriter, request: Request) -> Result<(), Error>;

    /// Called once the request is finished, whether or not it failed.
    fn destroy(&mut self) {}

    /// Report a failed `init` or action to the client. May also be called
    /// from actions for consistent error pages across a controller.
    fn error(&mut self, code: StatusCode, message: &str);
}

/// Default controller that only stores the request and its response writer.
///
/// Meant to be a field of your own controllers. When a controller overrides
/// `init` it should still call `Base::init`. If `error` never reaches the
/// request's writer, the dispatcher writes the plain text error itself.
#[derive(Debug, Default)]
pub struct Base {
    pub request: Request,
    pub response: ResponseWriter,
}

impl Controller for Base {
    fn init(&mut self, rw: ResponseWriter, request: Request) -> Result<(), Error> {
        self.request = request;
        self.response = rw;
        Ok(())
    }

    fn error(&mut self, code: StatusCode, message: &str) {
        self.response.write_error(code, message);
    }
}

/// Implement [`Controller`] by delegating every lifecycle method to a field.
///
/// ```
/// use tela_controller::{controller, Base};
///
/// #[derive(Default)]
/// struct Users {
///     base: Base,
/// }
///
/// controller!(Users => base);
/// ```
///
/// To override only part of the lifecycle implement the trait by hand and
/// forward the remaining methods to the field.
#[macro_export]
macro_rules! controller {
    ($ty: ty => $field: ident) => {
        impl $crate::Controller for $ty {
            fn init(
                &mut self,
                rw: $crate::ResponseWriter,
                request: $crate::Request,
            ) -> ::std::result::Result<(), $crate::Error> {
                $crate::Controller::init(&mut self.$field, rw, request)
            }

            fn destroy(&mut self) {
                $crate::Controller::destroy(&mut self.$field)
            }

            fn error(&mut self, code: $crate::StatusCode, message: &str) {
                $crate::Controller::error(&mut self.$field, code, message)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Embedding {
        base: Base,
    }

    crate::controller!(Embedding => base);

    #[test]
    fn base_init_stores_context() {
        let rw = ResponseWriter::new();
        let request = Request::builder().uri("/users").body("").unwrap();

        let mut base = Base::default();
        base.init(rw.clone(), request).unwrap();
        base.response.write("ok");

        assert_eq!(base.request.path(), "/users");
        assert_eq!(rw.body(), "ok");
    }

    #[test]
    fn base_error_writes_to_response() {
        let rw = ResponseWriter::new();
        let mut base = Base::default();
        base.init(rw.clone(), Request::default()).unwrap();
        base.error(StatusCode::NOT_FOUND, "missing");

        assert_eq!(rw.status(), StatusCode::NOT_FOUND);
        assert_eq!(rw.body(), "missing\n");
    }

    #[test]
    fn macro_delegates_to_field() {
        let rw = ResponseWriter::new();
        let mut controller = Embedding::default();
        Controller::init(&mut controller, rw.clone(), Request::default()).unwrap();
        Controller::error(&mut controller, StatusCode::IM_A_TEAPOT, "short and stout");
        Controller::destroy(&mut controller);

        assert_eq!(rw.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(controller.base.request.path(), "/");
    }
}
