//! WASM plugin runtime using wasmtime.

use std::sync::Arc;

use conch_core::{CommandFactory, Discovery, LocationFailure, LocationSet, Locator};
use tracing::{debug, info, warn};
use wasmtime::{Engine, Linker, Module};

use crate::command::WasmCommandFactory;
use crate::error::PluginError;
use crate::host::{HostFunctions, HostState};
use crate::source::{self, PluginBundle};

/// Discovers command types in WASM plugins.
///
/// Every discovery pass builds a new engine and linker scoped to exactly the
/// given locations and recompiles every module, so nothing loaded by an
/// earlier pass survives into the next one.
///
/// Plugins run in-process. A trap inside a plugin is turned into an error
/// for the caller; this is failure containment, not a security boundary.
#[derive(Debug, Default)]
pub struct PluginRuntime {}

impl PluginRuntime {
    /// Creates a new plugin runtime.
    pub fn new() -> Self {
        Self {}
    }

    fn compile(
        engine: &Engine,
        linker: &Arc<Linker<HostState>>,
        bundle: PluginBundle,
    ) -> Result<Vec<Box<dyn CommandFactory>>, PluginError> {
        let module = Module::new(engine, &bundle.module_bytes)?;
        let plugin = &bundle.manifest.plugin;

        info!(
            plugin = %plugin.name,
            version = %plugin.version,
            manifest = %bundle.origin.display(),
            commands = bundle.manifest.commands.len(),
            "plugin loaded"
        );

        Ok(bundle
            .manifest
            .commands
            .iter()
            .map(|command| {
                Box::new(WasmCommandFactory::new(
                    &plugin.name,
                    &command.id,
                    engine,
                    Arc::clone(linker),
                    module.clone(),
                )) as Box<dyn CommandFactory>
            })
            .collect())
    }
}

impl Locator for PluginRuntime {
    fn discover(&self, locations: &LocationSet) -> Discovery {
        let mut discovery = Discovery::default();

        let engine = Engine::default();
        let mut linker = Linker::new(&engine);
        if let Err(err) = HostFunctions::link(&mut linker) {
            let err = PluginError::from(err);
            warn!(error = %err, "failed to define host functions");
            discovery.failures = locations
                .iter()
                .map(|location| LocationFailure::new(location, err.to_string()))
                .collect();
            return discovery;
        }
        let linker = Arc::new(linker);

        for location in locations.iter() {
            debug!(location = %location.display(), "scanning location");

            for bundle in source::load_location(location) {
                let outcome = bundle.and_then(|bundle| {
                    let origin = bundle.origin.clone();
                    Self::compile(&engine, &linker, bundle).map_err(|e| (origin, e))
                });

                match outcome {
                    Ok(factories) => discovery.factories.extend(factories),
                    Err((path, err)) => {
                        warn!(path = %path.display(), error = %err, "plugin skipped");
                        discovery.failures.push(LocationFailure::new(path, err.to_string()));
                    }
                }
            }
        }

        debug!(
            types = discovery.factories.len(),
            failures = discovery.failures.len(),
            "discovery finished"
        );
        discovery
    }
}
