//! Ordered resolver chains.
//!
//! A [`ResolverChain`] decides the effective value of a flag:
//!
//! 1. a value given literally on the command line always wins;
//! 2. otherwise resolvers are consulted in registration order and the first
//!    one returning a value (other than an empty string) wins;
//! 3. otherwise the flag has no value, which is an error only for required
//!    flags.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use flag_resolver_core::*;
//! use serde_json::json;
//!
//! let app = Application::new("tool")
//!     .with_flag(Flag::new("port").with_default("80").with_env("TOOL_PORT"))
//!     .with_flag(Flag::new("host").with_default("localhost"))
//!     .with_flag(Flag::new("user"));
//!
//! let env = HashMap::from([("TOOL_PORT".to_string(), "8080".to_string())]);
//! let chain = ResolverChain::new()
//!     .with("env", env_resolver_with(env))
//!     .with("json", json_resolver(r#"{"host": "example.com"}"#.as_bytes()).unwrap())
//!     .with("defaults", defaults_resolver());
//!
//! let ctx = Context::new(&app).with_value("user", "root");
//! let resolved = chain.resolve_context(&ctx).unwrap();
//!
//! assert_eq!(resolved[0].value, json!("8080"));
//! assert_eq!(resolved[1].value, json!("example.com"));
//! assert_eq!(resolved[2].origin, Origin::CommandLine);
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{ResolveError, Result};
use crate::{Application, Context, Flag, Path, Resolver, defaults_resolver, env_resolver};

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Supplied literally on the command line.
    CommandLine,
    /// Supplied by the named resolver.
    Resolver(String),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::CommandLine => f.write_str("command line"),
            Origin::Resolver(name) => f.write_str(name),
        }
    }
}

/// The effective value of one flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved {
    /// Flag name
    pub flag: String,
    /// Untyped value; command-line values are always strings
    pub value: Value,
    /// Which source supplied the value
    pub origin: Origin,
}

struct Entry {
    name: String,
    resolver: Box<dyn Resolver>,
}

/// An ordered list of named resolvers.
///
/// [`ResolverChain::default`] holds the environment resolver followed by the
/// defaults resolver, so an environment variable overrides a tag default.
/// Use [`ResolverChain::new`] or [`clear`](ResolverChain::clear) to start
/// from an empty chain.
pub struct ResolverChain {
    entries: Vec<Entry>,
}

impl Default for ResolverChain {
    fn default() -> Self {
        Self::new()
            .with("env", env_resolver())
            .with("defaults", defaults_resolver())
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverChain")
            .field("resolvers", &self.names())
            .finish()
    }
}

impl ResolverChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a resolver and returns the chain.
    pub fn with(mut self, name: &str, resolver: impl Resolver + 'static) -> Self {
        self.push(name, resolver);
        self
    }

    /// Appends a resolver.
    pub fn push(&mut self, name: &str, resolver: impl Resolver + 'static) {
        self.entries.push(Entry {
            name: name.to_string(),
            resolver: Box::new(resolver),
        });
    }

    /// Removes every resolver.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of resolvers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the chain has no resolvers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns resolver names in consultation order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Validates every resolver against `app`, in order.
    ///
    /// # Errors
    ///
    /// Returns the first resolver's validation error.
    pub fn validate(&self, app: &Application) -> Result<()> {
        for entry in &self.entries {
            if let Err(err) = entry.resolver.validate(app) {
                warn!(resolver = %entry.name, error = %err, "Resolver failed validation");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Resolves a single flag declared at `parent`.
    ///
    /// Returns `None` when neither the command line nor any resolver has a
    /// value.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by a resolver.
    pub fn resolve(&self, ctx: &Context, parent: &Path, flag: &Flag) -> Result<Option<Resolved>> {
        if let Some(literal) = ctx.value(&flag.name) {
            return Ok(Some(Resolved {
                flag: flag.name.clone(),
                value: Value::String(literal.to_string()),
                origin: Origin::CommandLine,
            }));
        }

        for entry in &self.entries {
            match entry.resolver.resolve(ctx, parent, flag)? {
                Some(value) if !is_empty_value(&value) => {
                    debug!(flag = %flag.name, resolver = %entry.name, "Resolved flag value");
                    return Ok(Some(Resolved {
                        flag: flag.name.clone(),
                        value,
                        origin: Origin::Resolver(entry.name.clone()),
                    }));
                }
                _ => trace!(flag = %flag.name, resolver = %entry.name, "No value from resolver"),
            }
        }

        Ok(None)
    }

    /// Resolves every flag visible from the context's current command.
    ///
    /// Nodes are walked from the root down, and each flag is resolved with
    /// its declaring node as `parent`. Flags with no value are left out of
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MissingRequired`] for the first required flag
    /// without a value, or the first error a resolver returns.
    pub fn resolve_context(&self, ctx: &Context) -> Result<Vec<Resolved>> {
        let mut resolved = Vec::new();
        for node in ctx.path() {
            for flag in &node.flags {
                match self.resolve(ctx, node, flag)? {
                    Some(value) => resolved.push(value),
                    None if flag.tag.required => {
                        return Err(ResolveError::MissingRequired(flag.name.clone()));
                    }
                    None => {}
                }
            }
        }
        Ok(resolved)
    }
}

fn is_empty_value(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.is_empty())
}
