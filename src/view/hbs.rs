cfg_if::cfg_if! {
    if #[cfg(feature = "handlebars")] {
// CFG IF

use std::{ffi::OsStr, path::Path, sync::{PoisonError, RwLock}};

use lazy_static::lazy_static;

use super::{Context, TemplateEngine};
use crate::error::Error;

lazy_static! {
    static ref HANDLEBARS: RwLock<Option<(handlebars::Handlebars<'static>, Context)>> =
        RwLock::new(None);
}

/// [Handlebars](https://handlebarsjs.com/) templates loaded from `.hbs` files.
///
/// Templates are registered without their extension; `render` accepts the
/// name with or without it, so `index.hbs` and `index` are the same template.
pub struct Handlebars;

impl Handlebars {
    fn template_name(path: &str) -> &str {
        match Path::new(path).extension().and_then(OsStr::to_str) {
            Some(ext) => path.strip_suffix(ext).and_then(|p| p.strip_suffix('.')).unwrap_or(path),
            None => path,
        }
    }
}

impl TemplateEngine for Handlebars {
    fn init<P: AsRef<Path>>(path: P, globals: Context) -> Result<(), Error> {
        let mut engine = handlebars::Handlebars::new();
        engine.set_strict_mode(false);
        engine.register_templates_directory(".hbs", path.as_ref())?;
        tracing::debug!(
            templates = engine.get_templates().len(),
            "loaded handlebars templates from {}",
            path.as_ref().display()
        );
        *HANDLEBARS.write().unwrap_or_else(PoisonError::into_inner) = Some((engine, globals));
        Ok(())
    }

    fn is_initialized() -> bool {
        HANDLEBARS.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    fn globals() -> Context {
        match &*HANDLEBARS.read().unwrap_or_else(PoisonError::into_inner) {
            Some((_, globals)) => globals.clone(),
            None => Context::new(),
        }
    }

    fn render(name: &str, context: &Context) -> Result<String, Error> {
        match &*HANDLEBARS.read().unwrap_or_else(PoisonError::into_inner) {
            Some((engine, _)) => Ok(engine.render(Handlebars::template_name(name), context)?),
            None => Err(Error::internal("Handlebars templating engine is not active")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_names_drop_the_extension() {
        assert_eq!(Handlebars::template_name("index.hbs"), "index");
        assert_eq!(Handlebars::template_name("users/show.hbs"), "users/show");
        assert_eq!(Handlebars::template_name("index"), "index");
    }
}

// CFG END IF
    }
}
