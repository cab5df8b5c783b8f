cfg_if::cfg_if! {
    if #[cfg(feature = "tera")] {
// CFG IF

use std::{path::Path, sync::{PoisonError, RwLock}};

use lazy_static::lazy_static;

use super::{Context, TemplateEngine};
use crate::error::Error;

lazy_static! {
    static ref TERA: RwLock<Option<(tera::Tera, Context)>> = RwLock::new(None);
}

/// [Tera](https://keats.github.io/tera/) templates. Templates are named by
/// their path relative to the directory passed to `init`, e.g. `users/index.html`.
pub struct Tera;
impl TemplateEngine for Tera {
    fn init<P: AsRef<Path>>(path: P, globals: Context) -> Result<(), Error> {
        let glob = path.as_ref().join("**").join("*");
        let engine = tera::Tera::new(&glob.to_string_lossy())?;
        tracing::debug!(
            templates = engine.get_template_names().count(),
            "loaded tera templates from {}",
            path.as_ref().display()
        );
        *TERA.write().unwrap_or_else(PoisonError::into_inner) = Some((engine, globals));
        Ok(())
    }

    fn is_initialized() -> bool {
        TERA.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    fn globals() -> Context {
        match &*TERA.read().unwrap_or_else(PoisonError::into_inner) {
            Some((_, globals)) => globals.clone(),
            None => Context::new(),
        }
    }

    fn render(name: &str, context: &Context) -> Result<String, Error> {
        match &*TERA.read().unwrap_or_else(PoisonError::into_inner) {
            Some((engine, _)) => {
                let context = tera::Context::from_serialize(context)?;
                Ok(engine.render(name, &context)?)
            }
            None => Err(Error::internal("Tera templating engine is not active")),
        }
    }
}

// CFG END IF
    }
}
