//! Commands backed by a WASM module instance.

use std::sync::Arc;

use conch_core::{Channels, Command, CommandError, CommandFactory};
use tracing::debug;
use wasmtime::{Engine, Linker, Module, Store, TypedFunc};

use crate::host::{self, HostState};

/// A command type declared in a plugin manifest.
///
/// Every call to [`CommandFactory::instantiate`] creates a new store and
/// module instance, so instances never share guest memory.
pub struct WasmCommandFactory {
    type_name: String,
    command_id: String,
    engine: Engine,
    linker: Arc<Linker<HostState>>,
    module: Module,
}

impl WasmCommandFactory {
    pub(crate) fn new(
        plugin_name: &str,
        command_id: &str,
        engine: &Engine,
        linker: Arc<Linker<HostState>>,
        module: Module,
    ) -> Self {
        Self {
            type_name: format!("{}::{}", plugin_name, command_id),
            command_id: command_id.to_string(),
            engine: engine.clone(),
            linker,
            module,
        }
    }

    fn export(&self, suffix: &str) -> String {
        format!("{}_{}", self.command_id, suffix)
    }

    fn build(&self) -> wasmtime::Result<WasmCommand> {
        let mut store = Store::new(&self.engine, HostState::default());
        let instance = self.linker.instantiate(&mut store, &self.module)?;

        if let Some(init) = instance.get_func(&mut store, &self.export("init")) {
            let status = init.typed::<(), i32>(&store)?.call(&mut store, ())?;
            if status != 0 {
                return Err(wasmtime::Error::msg(format!(
                    "`{}` returned status {}",
                    self.export("init"),
                    status
                )));
            }
        }

        let describe = instance.get_typed_func::<(), i64>(&mut store, &self.export("describe"))?;
        let execute = instance.get_typed_func::<(), i32>(&mut store, &self.export("execute"))?;

        // The description is packed as `(ptr << 32) | len`.
        let packed = describe.call(&mut store, ())? as u64;
        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| wasmtime::Error::msg("guest does not export `memory`"))?;
        let data = memory.data(&store);
        let range = host::guest_range(data.len(), (packed >> 32) as u32, packed as u32)?;
        let description = String::from_utf8(data[range].to_vec())?;

        debug!(type_name = %self.type_name, %description, "wasm command instantiated");

        Ok(WasmCommand {
            type_name: self.type_name.clone(),
            description,
            store,
            execute,
        })
    }
}

impl CommandFactory for WasmCommandFactory {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn instantiate(&self) -> Result<Box<dyn Command>, CommandError> {
        match self.build() {
            Ok(command) => Ok(Box::new(command)),
            Err(err) => Err(CommandError::with_source(
                format!("cannot instantiate `{}`", self.type_name),
                err,
            )),
        }
    }
}

/// A live instance of a WASM command.
pub struct WasmCommand {
    type_name: String,
    description: String,
    store: Store<HostState>,
    execute: TypedFunc<(), i32>,
}

impl Command for WasmCommand {
    fn description(&self) -> &str {
        &self.description
    }

    fn execute(&mut self, io: &mut Channels) -> Result<(), CommandError> {
        // Lend the session channels to the instance for the duration of the
        // call, then take them back whatever the outcome.
        std::mem::swap(self.store.data_mut().channels_mut(), io);
        let outcome = self.execute.call(&mut self.store, ());
        std::mem::swap(self.store.data_mut().channels_mut(), io);

        match outcome {
            Ok(0) => Ok(()),
            Ok(status) => Err(CommandError::new(format!(
                "`{}` exited with status {}",
                self.type_name, status
            ))),
            Err(trap) => Err(CommandError::with_source(
                format!("`{}` trapped", self.type_name),
                trap,
            )),
        }
    }
}
