//! Environment sources.
//!
//! # Responsibilities
//! - Produce string-keyed, single-valued maps from files or the process
//! - Map read failures to `ConfigError::SourceUnavailable`
//!
//! # Design Decisions
//! - Sources never interpret values; typing happens in the loader
//! - Reading a `.env` file does not export it into the process environment
//! - Parse errors never echo the offending line (it may hold a credential)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::loader::ConfigError;

/// A key/value source the configuration is decoded from.
pub trait EnvSource: Send + Sync {
    /// Short label for logs and errors, e.g. a file path.
    fn describe(&self) -> String;

    /// Read every key/value pair the source holds.
    fn read(&self) -> Result<HashMap<String, String>, ConfigError>;
}

impl<S: EnvSource + ?Sized> EnvSource for Box<S> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn read(&self) -> Result<HashMap<String, String>, ConfigError> {
        (**self).read()
    }
}

/// A dotenv-formatted file.
#[derive(Debug, Clone)]
pub struct DotenvFile {
    path: PathBuf,
}

impl DotenvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, error: dotenvy::Error) -> ConfigError {
        let reason = match error {
            dotenvy::Error::LineParse(_, index) => {
                format!("malformed line (parse error at index {})", index)
            }
            dotenvy::Error::Io(e) => e.to_string(),
            other => other.to_string(),
        };
        ConfigError::SourceUnavailable {
            origin: self.describe(),
            reason,
        }
    }
}

impl EnvSource for DotenvFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<HashMap<String, String>, ConfigError> {
        let entries = dotenvy::from_path_iter(&self.path).map_err(|e| self.unavailable(e))?;

        let mut values = HashMap::new();
        for entry in entries {
            let (key, value) = entry.map_err(|e| self.unavailable(e))?;
            values.insert(key, value);
        }

        tracing::debug!(
            path = %self.path.display(),
            keys = values.len(),
            "Environment file read"
        );
        Ok(values)
    }
}

/// The environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn describe(&self) -> String {
        "process environment".to_string()
    }

    fn read(&self) -> Result<HashMap<String, String>, ConfigError> {
        // Non-UTF-8 entries cannot hold any key we decode.
        Ok(std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect())
    }
}

/// A fixed in-memory map.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    values: HashMap<String, String>,
}

impl StaticSource {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set or replace one key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Remove one key.
    pub fn without(mut self, key: &str) -> Self {
        self.values.remove(key);
        self
    }
}

impl EnvSource for StaticSource {
    fn describe(&self) -> String {
        "static values".to_string()
    }

    fn read(&self) -> Result<HashMap<String, String>, ConfigError> {
        Ok(self.values.clone())
    }
}

/// Several sources merged in order; later layers override earlier keys.
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Box<dyn EnvSource>>,
}

impl LayeredSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(mut self, source: impl EnvSource + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }
}

impl EnvSource for LayeredSource {
    fn describe(&self) -> String {
        self.layers
            .iter()
            .map(|layer| layer.describe())
            .collect::<Vec<_>>()
            .join(" + ")
    }

    fn read(&self) -> Result<HashMap<String, String>, ConfigError> {
        let mut merged = HashMap::new();
        for layer in &self.layers {
            merged.extend(layer.read()?);
        }
        Ok(merged)
    }
}
