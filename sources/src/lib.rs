//! File-backed flag value sources and configured resolver chains.
//!
//! This crate adds the pieces of a resolution setup that touch the
//! filesystem: YAML documents alongside the JSON support in
//! [`flag_resolver_core`], a YAML [`ChainConfig`] that lists the sources of a
//! chain, and a [`ChainBuilder`] that loads them.
//!
//! # Quick start
//!
//! ```no_run
//! use flag_resolver_core::{Application, Context, Flag};
//! use flag_resolver_sources::ChainBuilder;
//!
//! let app = Application::new("tool").with_flag(Flag::new("port").with_default("80"));
//!
//! let chain = ChainBuilder::new()
//!     .env()
//!     .yaml_file("/etc/tool/config.yaml")
//!     .defaults()
//!     .build()
//!     .unwrap();
//! chain.validate(&app).unwrap();
//!
//! for resolved in chain.resolve_context(&Context::new(&app)).unwrap() {
//!     println!("{} = {} ({})", resolved.flag, resolved.value, resolved.origin);
//! }
//! ```

mod builder;
mod config;
mod error;
mod yaml;

pub use builder::ChainBuilder;
pub use config::{CHAIN_CONFIG_VERSION, ChainConfig, FileSource, SourceConfig};
pub use error::{Result, SourceError};
pub use yaml::{DocumentFormat, load_document, strict_yaml_resolver, yaml_document, yaml_resolver};
