//! YAML configuration describing a resolver chain.
//!
//! Lists the sources to consult, in order. Document paths are resolved
//! relative to the directory holding the configuration file.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! sources:
//!   - kind: env
//!   - kind: json
//!     path: settings.json
//!     strict: true
//!   - kind: yaml
//!     path: local.yaml
//!     optional: true
//!   - kind: defaults
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SourceError};

/// Current configuration format version.
pub const CHAIN_CONFIG_VERSION: &str = "1.0";

/// One entry of a resolver chain.
///
/// # Examples
///
/// ```
/// use flag_resolver_sources::SourceConfig;
///
/// let source: SourceConfig = serde_yaml::from_str("kind: json\npath: a.json\n").unwrap();
/// assert!(matches!(source, SourceConfig::Json(ref f) if !f.strict && !f.optional));
/// assert_eq!(source.name(), "json:a.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Environment variables named by each flag's tag.
    Env,
    /// Each flag's tag default.
    Defaults,
    /// A JSON document file.
    Json(FileSource),
    /// A YAML document file.
    Yaml(FileSource),
}

impl SourceConfig {
    /// Returns the name this source is registered under in a chain.
    pub fn name(&self) -> String {
        match self {
            SourceConfig::Env => "env".to_string(),
            SourceConfig::Defaults => "defaults".to_string(),
            SourceConfig::Json(file) => format!("json:{}", file.path.display()),
            SourceConfig::Yaml(file) => format!("yaml:{}", file.path.display()),
        }
    }
}

/// Settings for a file-backed source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSource {
    /// Document path; relative paths are resolved against the base directory.
    pub path: PathBuf,
    /// Reject document keys that match no declared flag.
    #[serde(default)]
    pub strict: bool,
    /// Skip the source when the file does not exist.
    #[serde(default)]
    pub optional: bool,
}

impl FileSource {
    /// Creates a non-strict, mandatory file source.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            strict: false,
            optional: false,
        }
    }
}

/// Top-level chain configuration.
///
/// # Examples
///
/// ```no_run
/// use flag_resolver_sources::ChainConfig;
///
/// let config = ChainConfig::load("resolvers.yaml").unwrap();
/// for source in &config.sources {
///     println!("{}", source.name());
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Sources in consultation order.
    pub sources: Vec<SourceConfig>,
}

impl Default for ChainConfig {
    /// Environment first, then tag defaults.
    fn default() -> Self {
        Self {
            version: CHAIN_CONFIG_VERSION.to_string(),
            sources: vec![SourceConfig::Env, SourceConfig::Defaults],
        }
    }
}

impl ChainConfig {
    /// Parses and validates configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`YamlError`](SourceError::YamlError) if parsing fails or
    /// [`InvalidConfig`](SourceError::InvalidConfig) if validation fails.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](SourceError::IoError) if the file cannot be read,
    /// [`YamlError`](SourceError::YamlError) if parsing fails, or
    /// [`InvalidConfig`](SourceError::InvalidConfig) if validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](SourceError::IoError) if the file cannot be
    /// written, or [`YamlError`](SourceError::YamlError) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks the version and that at least one source is listed.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfig`](SourceError::InvalidConfig) describing the
    /// first problem.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(SourceError::InvalidConfig("version cannot be empty".into()));
        }
        if self.version != CHAIN_CONFIG_VERSION {
            return Err(SourceError::InvalidConfig(format!(
                "unsupported version {:?} (expected {CHAIN_CONFIG_VERSION:?})",
                self.version
            )));
        }
        if self.sources.is_empty() {
            return Err(SourceError::InvalidConfig("at least one source is required".into()));
        }
        for source in &self.sources {
            if let SourceConfig::Json(file) | SourceConfig::Yaml(file) = source {
                if file.path.as_os_str().is_empty() {
                    return Err(SourceError::InvalidConfig(format!(
                        "{} source has an empty path",
                        source.name().trim_end_matches(':')
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
sources:
  - kind: env
  - kind: json
    path: settings.json
    strict: true
  - kind: yaml
    path: /etc/tool/local.yml
    optional: true
  - kind: defaults
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config = ChainConfig::from_yaml_str(sample_yaml()).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.sources.len(), 4);
        assert_eq!(config.sources[0], SourceConfig::Env);
        assert_eq!(
            config.sources[1],
            SourceConfig::Json(FileSource {
                path: "settings.json".into(),
                strict: true,
                optional: false,
            })
        );
        assert!(matches!(&config.sources[2], SourceConfig::Yaml(f) if f.optional && !f.strict));
        assert_eq!(config.sources[3], SourceConfig::Defaults);
    }

    #[test]
    fn test_default_config() {
        let config = ChainConfig::default();
        assert!(config.validate().is_ok());
        let names: Vec<String> = config.sources.iter().map(SourceConfig::name).collect();
        assert_eq!(names, vec!["env", "defaults"]);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let yaml = "version: \"1.0\"\nsources:\n  - kind: consul\n";
        assert!(matches!(
            ChainConfig::from_yaml_str(yaml),
            Err(SourceError::YamlError(_))
        ));
    }

    #[test]
    fn test_empty_sources_rejected() {
        let yaml = "version: \"1.0\"\nsources: []\n";
        let err = ChainConfig::from_yaml_str(yaml).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid chain configuration: at least one source is required"
        );
    }

    #[test]
    fn test_version_checked() {
        let empty = "version: \"\"\nsources: [{kind: env}]\n";
        assert!(matches!(
            ChainConfig::from_yaml_str(empty),
            Err(SourceError::InvalidConfig(_))
        ));
        let future = "version: \"2.0\"\nsources: [{kind: env}]\n";
        assert!(matches!(
            ChainConfig::from_yaml_str(future),
            Err(SourceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_path_rejected() {
        let yaml = "version: \"1.0\"\nsources:\n  - kind: json\n    path: \"\"\n";
        let err = ChainConfig::from_yaml_str(yaml).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid chain configuration: json source has an empty path"
        );
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = std::env::temp_dir().join(format!("fr_sources_config_rt_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chain.yaml");

        let original = ChainConfig::from_yaml_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = ChainConfig::load(&path).unwrap();
        assert_eq!(loaded, original);

        std::fs::remove_dir_all(&dir).ok();
    }
}
