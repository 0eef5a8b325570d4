//! Structured configuration documents as a flag source.
//!
//! A [`Document`] is a flat mapping from key to untyped value, decoded in
//! full when it is built. Flags are looked up by their name with hyphens
//! replaced by underscores, so `max-retries` reads the `max_retries` key.
//! Stored keys are never rewritten.
//!
//! # Example
//!
//! ```
//! use flag_resolver_core::*;
//! use serde_json::json;
//!
//! let resolver = json_resolver(r#"{"max_retries": 3, "name": "x"}"#.as_bytes()).unwrap();
//! let app = Application::new("tool")
//!     .with_flag(Flag::new("max-retries"))
//!     .with_flag(Flag::new("missing-key"));
//! let ctx = Context::new(&app);
//!
//! assert_eq!(resolver.resolve(&ctx, ctx.leaf(), &app.flags[0]).unwrap(), Some(json!(3)));
//! assert_eq!(resolver.resolve(&ctx, ctx.leaf(), &app.flags[1]).unwrap(), None);
//! ```

use std::io::Read;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::{Application, Context, Flag, Path, Resolver, ResolverFn};

/// Converts a flag name into its document key by replacing every `-` with
/// `_`.
///
/// # Examples
///
/// ```
/// assert_eq!(flag_resolver_core::normalize_key("max-retries"), "max_retries");
/// assert_eq!(flag_resolver_core::normalize_key("a-b-c"), "a_b_c");
/// ```
pub fn normalize_key(name: &str) -> String {
    name.replace('-', "_")
}

/// A decoded configuration document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    values: Map<String, Value>,
}

impl Document {
    /// Decodes a JSON object from `reader`.
    ///
    /// The whole stream must hold exactly one JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Json`] for malformed JSON or when the top-level
    /// value is not an object.
    pub fn from_json_reader(reader: impl Read) -> Result<Self> {
        let values: Map<String, Value> = serde_json::from_reader(reader)?;
        debug!(keys = values.len(), "Decoded JSON configuration document");
        Ok(Self { values })
    }

    /// Wraps an already-decoded mapping.
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Returns the raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the value for `flag`, looked up by its normalized name.
    ///
    /// A key holding JSON `null` yields `Some(Value::Null)`; only a missing
    /// key yields `None`.
    pub fn lookup(&self, flag: &Flag) -> Option<Value> {
        self.values.get(&flag.document_key()).cloned()
    }

    /// Iterates the stored keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns the number of top-level keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the document has no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the first key (in sorted order) that no flag of `app` maps
    /// to.
    ///
    /// # Examples
    ///
    /// ```
    /// use flag_resolver_core::*;
    ///
    /// let doc = Document::from_json_reader(r#"{"port": 1, "prot": 2}"#.as_bytes()).unwrap();
    /// let app = Application::new("srv").with_flag(Flag::new("port"));
    /// assert_eq!(doc.unknown_key(&app), Some("prot"));
    /// ```
    pub fn unknown_key(&self, app: &Application) -> Option<&str> {
        let known: std::collections::HashSet<String> =
            app.all_flags().map(Flag::document_key).collect();
        self.keys().find(|key| !known.contains(*key))
    }

    /// Turns the document into a resolver that never fails validation.
    pub fn into_resolver(self) -> impl Resolver {
        ResolverFn::new(move |_ctx: &Context, _parent: &Path, flag: &Flag| {
            Ok(self.lookup(flag))
        })
    }

    /// Turns the document into a resolver whose validation rejects keys that
    /// match no flag.
    pub fn into_strict(self) -> StrictDocumentResolver {
        StrictDocumentResolver { document: self }
    }
}

/// Document resolver that checks every key against the application schema.
///
/// Lookups behave exactly like the resolver from [`json_resolver`];
/// [`validate`](Resolver::validate) fails with [`ResolveError::UnknownKey`]
/// on the first key that does not belong to any declared flag, which catches
/// typos in configuration files.
///
/// # Examples
///
/// ```
/// use flag_resolver_core::*;
///
/// let resolver = strict_json_resolver(r#"{"max_retry": 3}"#.as_bytes()).unwrap();
/// let app = Application::new("tool").with_flag(Flag::new("max-retries"));
///
/// let err = resolver.validate(&app).unwrap_err();
/// assert!(matches!(err, ResolveError::UnknownKey { ref key, .. } if key == "max_retry"));
/// ```
#[derive(Debug, Clone)]
pub struct StrictDocumentResolver {
    document: Document,
}

impl StrictDocumentResolver {
    /// Returns the underlying document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl Resolver for StrictDocumentResolver {
    fn validate(&self, app: &Application) -> Result<()> {
        match self.document.unknown_key(app) {
            Some(key) => Err(ResolveError::UnknownKey {
                key: key.to_string(),
                flag: key.replace('_', "-"),
            }),
            None => Ok(()),
        }
    }

    fn resolve(&self, _context: &Context, _parent: &Path, flag: &Flag) -> Result<Option<Value>> {
        Ok(self.document.lookup(flag))
    }
}

/// Builds a resolver from a JSON object read from `reader`.
///
/// The document is decoded once, here; lookups never fail.
///
/// # Errors
///
/// Returns [`ResolveError::Json`] if the input is not a single JSON object.
///
/// # Examples
///
/// ```
/// use flag_resolver_core::*;
///
/// assert!(json_resolver("not json".as_bytes()).is_err());
/// assert!(json_resolver("[1, 2]".as_bytes()).is_err());
/// ```
pub fn json_resolver(reader: impl Read) -> Result<impl Resolver> {
    Ok(Document::from_json_reader(reader)?.into_resolver())
}

/// Builds a [`StrictDocumentResolver`] from a JSON object read from `reader`.
///
/// # Errors
///
/// Returns [`ResolveError::Json`] if the input is not a single JSON object.
pub fn strict_json_resolver(reader: impl Read) -> Result<StrictDocumentResolver> {
    Ok(Document::from_json_reader(reader)?.into_strict())
}
