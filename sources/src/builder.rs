//! Building resolver chains from configured sources.
//!
//! ```no_run
//! use flag_resolver_sources::ChainBuilder;
//!
//! // From a configuration file; relative paths resolve next to it
//! let chain = ChainBuilder::from_config_file("resolvers.yaml").unwrap().build().unwrap();
//!
//! // Or assembled directly
//! let chain = ChainBuilder::new()
//!     .env()
//!     .json_file("settings.json")
//!     .defaults()
//!     .build()
//!     .unwrap();
//! assert_eq!(chain.len(), 3);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use flag_resolver_core::{
    EnvLookup, ProcessEnv, ResolverChain, defaults_resolver, env_resolver_with,
};
use tracing::debug;

use crate::config::{ChainConfig, FileSource, SourceConfig};
use crate::error::{Result, SourceError};
use crate::yaml::{DocumentFormat, load_document_as};

/// Builder for a [`ResolverChain`] backed by configured sources.
///
/// Sources are consulted in the order they are added. Every document is
/// loaded during [`build`](Self::build); a missing file is an error unless
/// the source is marked optional, in which case it is left out of the chain.
pub struct ChainBuilder {
    sources: Vec<SourceConfig>,
    base_dir: Option<PathBuf>,
    env: Arc<dyn EnvLookup>,
}

impl ChainBuilder {
    /// Creates a builder with no sources that reads the process environment.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            base_dir: None,
            env: Arc::new(ProcessEnv),
        }
    }

    /// Creates a builder holding the sources of `config`.
    pub fn from_config(config: &ChainConfig) -> Self {
        let mut builder = Self::new();
        builder.sources = config.sources.clone();
        builder
    }

    /// Loads `path` as a [`ChainConfig`] and resolves relative document
    /// paths against the directory that contains it.
    ///
    /// # Errors
    ///
    /// See [`ChainConfig::load`].
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = ChainConfig::load(path)?;
        let mut builder = Self::from_config(&config);
        if let Some(dir) = path.parent() {
            builder.base_dir = Some(dir.to_path_buf());
        }
        Ok(builder)
    }

    /// Sets the directory relative document paths are resolved against.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Replaces the environment consulted by `env` sources.
    pub fn env_lookup(mut self, env: impl EnvLookup + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Adds the environment-variable source.
    pub fn env(self) -> Self {
        self.source(SourceConfig::Env)
    }

    /// Adds the tag-default source.
    pub fn defaults(self) -> Self {
        self.source(SourceConfig::Defaults)
    }

    /// Adds a JSON document file.
    pub fn json_file(self, path: impl Into<PathBuf>) -> Self {
        self.source(SourceConfig::Json(FileSource::new(path)))
    }

    /// Adds a YAML document file.
    pub fn yaml_file(self, path: impl Into<PathBuf>) -> Self {
        self.source(SourceConfig::Yaml(FileSource::new(path)))
    }

    /// Adds any configured source.
    pub fn source(mut self, source: SourceConfig) -> Self {
        self.sources.push(source);
        self
    }

    /// Loads every source and assembles the chain.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Load`](crate::SourceError::Load) for the first
    /// document that cannot be read or decoded.
    pub fn build(self) -> Result<ResolverChain> {
        let mut chain = ResolverChain::new();

        for source in &self.sources {
            let name = source.name();
            match source {
                SourceConfig::Env => chain.push(&name, env_resolver_with(Arc::clone(&self.env))),
                SourceConfig::Defaults => chain.push(&name, defaults_resolver()),
                SourceConfig::Json(file) => {
                    self.push_document(&mut chain, &name, file, DocumentFormat::Json)?;
                }
                SourceConfig::Yaml(file) => {
                    self.push_document(&mut chain, &name, file, DocumentFormat::Yaml)?;
                }
            }
        }

        debug!(resolvers = ?chain.names(), "Built resolver chain");
        Ok(chain)
    }

    fn push_document(
        &self,
        chain: &mut ResolverChain,
        name: &str,
        file: &FileSource,
        format: DocumentFormat,
    ) -> Result<()> {
        let path = self.resolve_path(&file.path);
        if file.optional {
            // Only a definite "not found" skips the source; other errors surface.
            let exists = path.try_exists().map_err(|err| SourceError::Load {
                path: path.clone(),
                source: Box::new(err.into()),
            })?;
            if !exists {
                debug!(path = %path.display(), "Skipping missing optional source");
                return Ok(());
            }
        }

        let document = load_document_as(&path, format)?;
        if file.strict {
            chain.push(name, document.into_strict());
        } else {
            chain.push(name, document.into_resolver());
        }
        Ok(())
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
