//! Plugin manifest declaring the command types a module provides.

use std::collections::HashSet;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::{PluginError, Result};

/// File name the locator looks for inside directories and archives.
pub const PLUGIN_MANIFEST_FILE_NAME: &str = "plugin.json";

/// Plugin manifest containing metadata and the declared commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin metadata.
    pub plugin: PluginMetadata,

    /// Command types implemented by the module, in declaration order.
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

/// Plugin metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Plugin name.
    pub name: String,

    /// Plugin version.
    pub version: String,

    /// Plugin description.
    #[serde(default)]
    pub description: Option<String>,

    /// Plugin author.
    #[serde(default)]
    pub author: Option<String>,

    /// Path to the WASM file (relative to manifest).
    #[serde(default = "default_wasm_path")]
    pub wasm: String,
}

fn default_wasm_path() -> String {
    "plugin.wasm".to_string()
}

/// One command type exported by the module.
///
/// The id prefixes the module exports backing the command:
/// `<id>_describe`, `<id>_execute` and the optional `<id>_init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub id: String,
}

impl PluginManifest {
    /// Loads a manifest from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a manifest from JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PluginError::ManifestError(e.to_string()))
    }

    /// Converts the manifest to JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PluginError::ManifestError(e.to_string()))
    }

    /// Creates a minimal manifest with just name and version.
    pub fn minimal(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            plugin: PluginMetadata::new(name, version),
            commands: Vec::new(),
        }
    }

    /// Adds a command declaration.
    pub fn with_command(mut self, id: impl Into<String>) -> Self {
        self.commands.push(CommandSpec { id: id.into() });
        self
    }

    /// Checks that the manifest describes a loadable plugin.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(PluginError::InvalidManifest(reason));

        if self.plugin.name.trim().is_empty() {
            return invalid("plugin.name is empty".to_string());
        }
        if self.plugin.version.trim().is_empty() {
            return invalid(format!("plugin `{}` has an empty version", self.plugin.name));
        }

        let wasm = Path::new(self.plugin.wasm.trim());
        if wasm.as_os_str().is_empty()
            || wasm.is_absolute()
            || wasm.components().any(|c| matches!(c, Component::ParentDir))
        {
            return invalid(format!(
                "plugin `{}` wasm path is unsafe: {}",
                self.plugin.name, self.plugin.wasm
            ));
        }

        if self.commands.is_empty() {
            return invalid(format!("plugin `{}` declares no commands", self.plugin.name));
        }

        let mut seen = HashSet::new();
        for command in &self.commands {
            if !is_export_identifier(&command.id) {
                return invalid(format!(
                    "plugin `{}` has an invalid command id `{}`",
                    self.plugin.name, command.id
                ));
            }
            if !seen.insert(command.id.as_str()) {
                return invalid(format!(
                    "plugin `{}` declares command `{}` twice",
                    self.plugin.name, command.id
                ));
            }
        }

        Ok(())
    }
}

impl PluginMetadata {
    /// Creates new plugin metadata.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            author: None,
            wasm: default_wasm_path(),
        }
    }

    /// Sets the module path.
    pub fn with_wasm(mut self, wasm: impl Into<String>) -> Self {
        self.wasm = wasm.into();
        self
    }
}

fn is_export_identifier(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
