//! Plugin error types.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for plugin operations.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Failed to load plugin file.
    #[error("Failed to load plugin from {path}: {reason}")]
    LoadError { path: PathBuf, reason: String },

    /// Location does not exist.
    #[error("Location not found: {0}")]
    NotFound(PathBuf),

    /// Location is neither a directory, a manifest, nor an archive.
    #[error("Unsupported location {0} (expected a directory, plugin.json, or .zip archive)")]
    UnsupportedLocation(PathBuf),

    /// Manifest parsing error.
    #[error("Failed to parse plugin manifest: {0}")]
    ManifestError(String),

    /// Manifest parsed but describes an unusable plugin.
    #[error("Invalid plugin manifest: {0}")]
    InvalidManifest(String),

    /// Archive could not be read.
    #[error("Invalid plugin archive: {0}")]
    ArchiveError(String),

    /// WASM runtime error.
    #[error("WASM runtime error: {0}")]
    WasmError(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<wasmtime::Error> for PluginError {
    fn from(err: wasmtime::Error) -> Self {
        PluginError::WasmError(format!("{:#}", err))
    }
}

impl From<walkdir::Error> for PluginError {
    fn from(err: walkdir::Error) -> Self {
        PluginError::LoadError {
            path: err.path().map(PathBuf::from).unwrap_or_default(),
            reason: err.to_string(),
        }
    }
}

/// Result type for plugin operations.
pub type Result<T> = std::result::Result<T, PluginError>;
