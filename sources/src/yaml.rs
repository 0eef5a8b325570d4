//! YAML documents as a flag source.
//!
//! Same lookup rules as the JSON source: one top-level mapping, flag names
//! looked up with hyphens replaced by underscores, values returned raw.

use std::io::Read;
use std::path::Path;

use flag_resolver_core::{Document, Resolver, StrictDocumentResolver};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, SourceError};

/// Decodes a YAML mapping from `reader` into a [`Document`].
///
/// # Errors
///
/// Returns [`SourceError::YamlError`] for malformed YAML or when the top
/// level is not a mapping with string keys, and
/// [`SourceError::NonFiniteNumber`] when a value contains `.nan` or `.inf`,
/// which JSON values cannot hold.
pub fn yaml_document(reader: impl Read) -> Result<Document> {
    let raw: serde_yaml::Value = serde_yaml::from_reader(reader)?;
    if let serde_yaml::Value::Mapping(mapping) = &raw {
        if let Some((key, _)) = mapping.iter().find(|(_, value)| !is_finite(value)) {
            let key = match key.as_str() {
                Some(key) => key.to_string(),
                None => format!("{key:?}"),
            };
            return Err(SourceError::NonFiniteNumber(key));
        }
    }
    let values: Map<String, Value> = serde_yaml::from_value(raw)?;
    debug!(keys = values.len(), "Decoded YAML configuration document");
    Ok(Document::from_map(values))
}

fn is_finite(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Number(n) => n.is_finite(),
        serde_yaml::Value::Sequence(items) => items.iter().all(is_finite),
        serde_yaml::Value::Mapping(mapping) => mapping.values().all(is_finite),
        serde_yaml::Value::Tagged(tagged) => is_finite(&tagged.value),
        _ => true,
    }
}

/// Builds a non-validating resolver from a YAML mapping.
///
/// # Examples
///
/// ```
/// use flag_resolver_core::{Application, Context, Flag, Resolver};
/// use flag_resolver_sources::yaml_resolver;
/// use serde_json::json;
///
/// let resolver = yaml_resolver("max_retries: 3\ntags: [a, b]\n".as_bytes()).unwrap();
/// let app = Application::new("tool")
///     .with_flag(Flag::new("max-retries"))
///     .with_flag(Flag::new("tags"));
/// let ctx = Context::new(&app);
///
/// assert_eq!(resolver.resolve(&ctx, ctx.leaf(), &app.flags[0]).unwrap(), Some(json!(3)));
/// assert_eq!(resolver.resolve(&ctx, ctx.leaf(), &app.flags[1]).unwrap(), Some(json!(["a", "b"])));
/// ```
///
/// # Errors
///
/// See [`yaml_document`].
pub fn yaml_resolver(reader: impl Read) -> Result<impl Resolver> {
    Ok(yaml_document(reader)?.into_resolver())
}

/// Builds a [`StrictDocumentResolver`] from a YAML mapping.
///
/// # Errors
///
/// See [`yaml_document`].
pub fn strict_yaml_resolver(reader: impl Read) -> Result<StrictDocumentResolver> {
    Ok(yaml_document(reader)?.into_strict())
}

/// Loads a document file, choosing the decoder from its extension.
///
/// `.json` files are decoded as JSON; `.yaml` and `.yml` as YAML.
///
/// # Errors
///
/// Returns [`SourceError::UnsupportedFormat`] for other extensions, or
/// [`SourceError::Load`] wrapping the I/O or decode failure.
pub fn load_document(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| SourceError::UnsupportedFormat(path.to_path_buf()))?;
    load_document_as(path, format)
}

/// Supported document encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON object.
    Json,
    /// YAML mapping.
    Yaml,
}

impl DocumentFormat {
    /// Infers the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("yaml" | "yml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

pub(crate) fn load_document_as(path: &Path, format: DocumentFormat) -> Result<Document> {
    let wrap = |source: SourceError| SourceError::Load {
        path: path.to_path_buf(),
        source: Box::new(source),
    };
    let file = std::fs::File::open(path).map_err(|e| wrap(e.into()))?;
    let reader = std::io::BufReader::new(file);
    let document = match format {
        DocumentFormat::Json => Document::from_json_reader(reader).map_err(|e| wrap(e.into()))?,
        DocumentFormat::Yaml => yaml_document(reader).map_err(wrap)?,
    };
    debug!(path = %path.display(), keys = document.len(), "Loaded configuration document");
    Ok(document)
}
