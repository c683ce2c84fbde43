//! Generation settings.
//!
//! Loaded from a JSON file; every field has a default so an empty object (or
//! no file at all) is a valid configuration.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::field::RestorePolicy;
use crate::path_de::{self, PathError};
use crate::strategy::Boxedness;
use crate::ty::TypeName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Variable holding the store in generated code.
    pub store: String,
    /// Variable holding the instance whose fields are persisted.
    pub instance: String,
    /// Expression naming the persistence engine used for nested types.
    pub engine: String,
    /// Converter type that means "no converter" on a field.
    pub no_converter: TypeName,
    /// Global restore policy; `default` means overwrite.
    pub restore_policy: RestorePolicy,
    pub scalar_boxedness: Boxedness,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: "store".to_string(),
            instance: "source".to_string(),
            engine: "Stowage".to_string(),
            no_converter: TypeName::from("stowage.NoConverter"),
            restore_policy: RestorePolicy::Default,
            scalar_boxedness: Boxedness::Unboxed,
            log_level: "warn".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: PathError,
    },
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        path_de::from_slice_with_path(&bytes).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn from_json_str(src: &str) -> Result<Self, PathError> {
        path_de::from_str_with_path(src)
    }
}
