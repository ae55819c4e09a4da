//! Conch Plugin - WASM command plugins for Conch.
//!
//! Plugins are WASM modules described by a `plugin.json` manifest. Each
//! manifest names the command types the module implements; the runtime
//! compiles the module and exposes every declared command as a
//! [`conch_core::CommandFactory`].
//!
//! Loading a plugin runs third-party code inside the shell's process.
//! Traps are contained and reported, but plugins are otherwise trusted.

mod archive;
mod command;
mod error;
mod host;
mod manifest;
mod runtime;
mod source;

#[cfg(test)]
mod fixtures;

pub use command::{WasmCommand, WasmCommandFactory};
pub use error::{PluginError, Result};
pub use host::{HOST_MODULE, HostFunctions, HostState};
pub use manifest::{CommandSpec, PLUGIN_MANIFEST_FILE_NAME, PluginManifest, PluginMetadata};
pub use runtime::PluginRuntime;
