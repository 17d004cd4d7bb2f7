//! Configuration loading
//!
//!     `defaults/mkly.default.toml` is embedded into the crate so that the documented defaults
//!     and runtime behavior stay in sync. Callers layer their own files and overrides on top
//!     with [`Loader`] before deserializing into [`MklyConfig`], which
//!     [`CompileOptions::from_config`](crate::mkly::compile::CompileOptions::from_config)
//!     turns into compile options.

use crate::mkly::style::variables::VariableMode;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../../defaults/mkly.default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct MklyConfig {
    pub limits: LimitsConfig,
    pub output: OutputConfig,
}

/// Resource ceilings applied while parsing and rendering.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub max_source_bytes: usize,
    pub max_blocks: usize,
    pub max_nesting: usize,
    pub max_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub source_map: bool,
    pub variable_mode: VariableMode,
    pub wrap: bool,
}

/// Layers user configuration over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files are an error at build time.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer a configuration file if it exists.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. `output.wrap = false` from the command line.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<MklyConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<MklyConfig, ConfigError> {
    Loader::new().build()
}
