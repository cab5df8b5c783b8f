//! Controllers that render templates.
//!
//! [`ViewController`] is a controller to embed in your own: it carries a view
//! model for the current request and renders it through a process wide
//! [`TemplateEngine`]. Enable the `tera` or `handlebars` feature for one of
//! the bundled engines.

pub mod hbs;
pub mod ttera;

use std::{collections::BTreeMap, fmt::Debug, marker::PhantomData, path::Path};

use hyper::StatusCode;
use serde::Serialize;

#[cfg(feature = "handlebars")]
pub use hbs::Handlebars;
#[cfg(feature = "tera")]
pub use ttera::Tera;

use crate::{
    controller::{Base, Controller},
    error::Error,
    request::Request,
    response::{IntoStatusCode, ResponseWriter},
};

/// Values handed to a template.
pub type Context = BTreeMap<String, serde_json::Value>;

/// Build a [`Context`] from `key: value` pairs. Values may be any
/// serializable expression.
///
/// ```
/// use tela_controller::context;
///
/// let context = context! { title: "Home", visits: 3 };
/// assert_eq!(context["visits"], 3);
/// ```
#[macro_export]
macro_rules! context {
    ($($key: ident: $value: expr),* $(,)?) => {
        $crate::view::Context::from([
            $((
                ::std::string::String::from(stringify!($key)),
                $crate::__private::serde_json::json!($value),
            ),)*
        ])
    };
}

/// Process wide template engine used by [`ViewController`].
pub trait TemplateEngine: Send + Sync + 'static {
    /// Load every template under `path`. `globals` are available to every
    /// render. Calling `init` again replaces the loaded templates.
    fn init<P: AsRef<Path>>(path: P, globals: Context) -> Result<(), Error>;

    fn is_initialized() -> bool;

    fn globals() -> Context;

    fn render(name: &str, context: &Context) -> Result<String, Error>;
}

/// Controller with a per request view model.
///
/// ```ignore
/// #[derive(Default)]
/// struct Home {
///     view: ViewController<Tera>,
/// }
///
/// controller!(Home => view);
///
/// impl Home {
///     fn index(&mut self) -> Result<(), Error> {
///         self.view.set("title", "Home")?;
///         self.view.html(200, "index.html")
///     }
/// }
/// ```
pub struct ViewController<E: TemplateEngine> {
    pub base: Base,
    pub view: Context,
    engine: PhantomData<fn() -> E>,
}

impl<E: TemplateEngine> Default for ViewController<E> {
    fn default() -> Self {
        ViewController {
            base: Base::default(),
            view: Context::new(),
            engine: PhantomData,
        }
    }
}

impl<E: TemplateEngine> Debug for ViewController<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewController")
            .field("base", &self.base)
            .field("view", &self.view)
            .finish()
    }
}

impl<E: TemplateEngine> Controller for ViewController<E> {
    fn init(&mut self, rw: ResponseWriter, request: Request) -> Result<(), Error> {
        self.base.init(rw, request)?;
        self.view = Context::new();
        if !E::is_initialized() {
            return Err(Error::internal(format!(
                "template engine {} is not initialized",
                std::any::type_name::<E>()
            )));
        }
        Ok(())
    }

    fn destroy(&mut self) {
        self.base.destroy()
    }

    fn error(&mut self, code: StatusCode, message: &str) {
        self.base.error(code, message)
    }
}

impl<E: TemplateEngine> ViewController<E> {
    /// Add a value to the view model.
    pub fn set<K: Into<String>, V: Serialize>(&mut self, key: K, value: V) -> Result<(), Error> {
        self.view.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Render a template with the engine's globals and the view model.
    /// Keys in the view model shadow globals.
    pub fn render(&self, name: &str) -> Result<String, Error> {
        let mut context = E::globals();
        context.extend(self.view.iter().map(|(k, v)| (k.clone(), v.clone())));
        E::render(name, &context)
    }

    /// Render a template as the html response.
    pub fn html<S: IntoStatusCode>(&self, code: S, name: &str) -> Result<(), Error> {
        let body = self.render(name)?;
        let response = &self.base.response;
        response.set_status(code);
        response.header("Content-Type", "text/html; charset=utf-8")?;
        response.write(body);
        Ok(())
    }
}
