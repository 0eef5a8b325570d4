//! The resolver capability and the built-in defaults and environment
//! sources.
//!
//! A [`Resolver`] supplies a fallback value for a flag that was not given on
//! the command line. Returning `Ok(None)` means "this source has no value for
//! this flag" and lets the caller move on to the next source; it is never an
//! error for a flag to be absent.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::{Application, Context, Flag, Path};

/// A source of fallback values for flags.
///
/// Implementations must be free of side effects: the same flag may be
/// resolved several times during one parse (once per tree depth that
/// inherits it), and every call with the same arguments must return the same
/// result.
///
/// # Examples
///
/// ```
/// use flag_resolver_core::*;
/// use serde_json::{Value, json};
///
/// /// Resolves every flag ending in `-port` to 8080.
/// struct PortResolver;
///
/// impl Resolver for PortResolver {
///     fn validate(&self, _app: &Application) -> Result<()> {
///         Ok(())
///     }
///
///     fn resolve(&self, _ctx: &Context, _parent: &Path, flag: &Flag) -> Result<Option<Value>> {
///         Ok(flag.name.ends_with("-port").then(|| json!(8080)))
///     }
/// }
///
/// let app = Application::new("srv").with_flag(Flag::new("http-port"));
/// let ctx = Context::new(&app);
/// let value = PortResolver.resolve(&ctx, ctx.leaf(), &app.flags[0]).unwrap();
/// assert_eq!(value, Some(json!(8080)));
/// ```
pub trait Resolver: Send + Sync {
    /// Checks this source's configuration against the full application
    /// schema, returning the first problem found.
    fn validate(&self, app: &Application) -> Result<()>;

    /// Produces a value for `flag`, or `None` if this source has no opinion.
    ///
    /// `parent` is the node of the command tree that declares `flag`.
    fn resolve(&self, context: &Context, parent: &Path, flag: &Flag) -> Result<Option<Value>>;
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn validate(&self, app: &Application) -> Result<()> {
        (**self).validate(app)
    }

    fn resolve(&self, context: &Context, parent: &Path, flag: &Flag) -> Result<Option<Value>> {
        (**self).resolve(context, parent, flag)
    }
}

impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    fn validate(&self, app: &Application) -> Result<()> {
        (**self).validate(app)
    }

    fn resolve(&self, context: &Context, parent: &Path, flag: &Flag) -> Result<Option<Value>> {
        (**self).resolve(context, parent, flag)
    }
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn validate(&self, app: &Application) -> Result<()> {
        (**self).validate(app)
    }

    fn resolve(&self, context: &Context, parent: &Path, flag: &Flag) -> Result<Option<Value>> {
        (**self).resolve(context, parent, flag)
    }
}

/// Adapts a plain function into a non-validating [`Resolver`].
///
/// # Examples
///
/// ```
/// use flag_resolver_core::*;
/// use serde_json::json;
///
/// let upper = ResolverFn::new(|_ctx: &Context, _parent: &Path, flag: &Flag| {
///     Ok(Some(json!(flag.name.to_uppercase())))
/// });
///
/// let app = Application::new("tool").with_flag(Flag::new("name"));
/// let ctx = Context::new(&app);
/// assert!(upper.validate(&app).is_ok());
/// assert_eq!(
///     upper.resolve(&ctx, ctx.leaf(), &app.flags[0]).unwrap(),
///     Some(json!("NAME"))
/// );
/// ```
#[derive(Clone)]
pub struct ResolverFn<F> {
    f: F,
}

impl<F> ResolverFn<F>
where
    F: Fn(&Context, &Path, &Flag) -> Result<Option<Value>> + Send + Sync,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Resolver for ResolverFn<F>
where
    F: Fn(&Context, &Path, &Flag) -> Result<Option<Value>> + Send + Sync,
{
    fn validate(&self, _app: &Application) -> Result<()> {
        Ok(())
    }

    fn resolve(&self, context: &Context, parent: &Path, flag: &Flag) -> Result<Option<Value>> {
        (self.f)(context, parent, flag)
    }
}

impl<F> std::fmt::Debug for ResolverFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverFn").finish_non_exhaustive()
    }
}

/// Resolves flags from the `default` entry of their tag.
///
/// Flags without a default resolve to `None`.
///
/// # Examples
///
/// ```
/// use flag_resolver_core::*;
/// use serde_json::json;
///
/// let app = Application::new("tool")
///     .with_flag(Flag::new("port").with_default("8080"))
///     .with_flag(Flag::new("host"));
/// let ctx = Context::new(&app);
/// let defaults = defaults_resolver();
///
/// assert_eq!(defaults.resolve(&ctx, ctx.leaf(), &app.flags[0]).unwrap(), Some(json!("8080")));
/// assert_eq!(defaults.resolve(&ctx, ctx.leaf(), &app.flags[1]).unwrap(), None);
/// ```
pub fn defaults_resolver() -> impl Resolver {
    ResolverFn::new(|_ctx: &Context, _parent: &Path, flag: &Flag| {
        if flag.tag.default.is_empty() {
            return Ok(None);
        }
        Ok(Some(Value::String(flag.tag.default.clone())))
    })
}

/// Read-only access to environment variables.
///
/// [`ProcessEnv`] reads the real process environment; the map
/// implementations let tests inject a fixed environment.
pub trait EnvLookup: Send + Sync {
    /// Returns the value of `name`, or `None` if it is not set.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// The environment of the running process.
///
/// Variables whose value is not valid Unicode are reported as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<E: EnvLookup + ?Sized> EnvLookup for Arc<E> {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }
}

impl EnvLookup for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl EnvLookup for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Resolves flags from the environment variable named in their tag.
///
/// Equivalent to `env_resolver_with(ProcessEnv)`.
pub fn env_resolver() -> impl Resolver {
    env_resolver_with(ProcessEnv)
}

/// Resolves flags from the environment variable named in their tag, using
/// `env` for lookups.
///
/// A variable that is set to the empty string is treated exactly like an
/// unset one, so an empty variable can never override a default.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use flag_resolver_core::*;
/// use serde_json::json;
///
/// let env = HashMap::from([
///     ("APP_TOKEN".to_string(), "s3cret".to_string()),
///     ("APP_EMPTY".to_string(), String::new()),
/// ]);
/// let app = Application::new("tool")
///     .with_flag(Flag::new("token").with_env("APP_TOKEN"))
///     .with_flag(Flag::new("empty").with_env("APP_EMPTY"));
/// let ctx = Context::new(&app);
/// let resolver = env_resolver_with(env);
///
/// assert_eq!(resolver.resolve(&ctx, ctx.leaf(), &app.flags[0]).unwrap(), Some(json!("s3cret")));
/// assert_eq!(resolver.resolve(&ctx, ctx.leaf(), &app.flags[1]).unwrap(), None);
/// ```
pub fn env_resolver_with<E: EnvLookup>(env: E) -> impl Resolver {
    ResolverFn::new(move |_ctx: &Context, _parent: &Path, flag: &Flag| {
        if flag.tag.env.is_empty() {
            return Ok(None);
        }
        match env.lookup(&flag.tag.env) {
            Some(value) if !value.is_empty() => Ok(Some(Value::String(value))),
            _ => Ok(None),
        }
    })
}
