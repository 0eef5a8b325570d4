//! Resolution of command-line flag values from external sources.
//!
//! When a flag is not given on the command line, its value may still come
//! from somewhere else: an environment variable, a configuration document, or
//! a default compiled into the flag declaration. This crate defines how those
//! sources are consulted:
//!
//! - [`Resolver`]: the capability every source implements, to `validate`
//!   against the application schema, and `resolve` one flag.
//! - [`ResolverFn`]: adapts a closure into a non-validating resolver.
//! - [`defaults_resolver`], [`env_resolver`] / [`env_resolver_with`] and
//!   [`json_resolver`]: the built-in sources.
//! - [`Document`] and [`StrictDocumentResolver`]: decoded configuration
//!   documents, optionally validated against the declared flags.
//! - [`ResolverChain`]: consults resolvers in order; a literal command-line
//!   value always wins.
//!
//! The schema types ([`Application`], [`Command`], [`Flag`]) and the parse
//! position ([`Context`], [`Path`]) are inputs: tokenizing arguments and
//! coercing the resolved [`serde_json::Value`] into a typed field happen
//! elsewhere.
//!
//! # Example
//!
//! ```
//! use flag_resolver_core::*;
//! use serde_json::json;
//!
//! let app = Application::new("fetch")
//!     .with_flag(Flag::new("max-retries").with_default("3"))
//!     .with_flag(Flag::new("url").required());
//! assert!(validate_application(&app).is_empty());
//!
//! let chain = ResolverChain::new()
//!     .with("json", json_resolver(r#"{"max_retries": 5}"#.as_bytes()).unwrap())
//!     .with("defaults", defaults_resolver());
//! chain.validate(&app).unwrap();
//!
//! let ctx = Context::new(&app).with_value("url", "https://example.com");
//! let resolved = chain.resolve_context(&ctx).unwrap();
//! assert_eq!(resolved[0].value, json!(5));
//! assert_eq!(resolved[1].origin, Origin::CommandLine);
//! ```

mod chain;
mod document;
mod error;
mod resolver;
mod types;
mod validate;

pub use chain::{Origin, Resolved, ResolverChain};
pub use document::{
    Document, StrictDocumentResolver, json_resolver, normalize_key, strict_json_resolver,
};
pub use error::{ResolveError, Result};
pub use resolver::{
    EnvLookup, ProcessEnv, Resolver, ResolverFn, defaults_resolver, env_resolver,
    env_resolver_with,
};
pub use types::*;
pub use validate::{ValidationError, validate_application};
