//! Per-iteration snapshot of runnable commands.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::command::{Command, CommandFactory};
use crate::error::{CommandError, ConchError, Result};
use crate::locator::{LocationSet, Locator};

/// Instantiated commands, sorted by description.
///
/// A registry is never empty and never modified after it is built; the
/// session replaces it wholesale on every iteration.
pub struct Registry {
    commands: Vec<Box<dyn Command>>,
}

impl Registry {
    /// Discovers, instantiates and orders every available command.
    ///
    /// Skipped locations and types that fail to instantiate are reported on
    /// `errors`. Fails with [`ConchError::NoCommands`] when nothing usable
    /// remains.
    pub fn populate(
        locator: &dyn Locator,
        locations: &LocationSet,
        errors: &mut dyn Write,
    ) -> Result<Self> {
        let discovery = locator.discover(locations);

        for failure in &discovery.failures {
            warn!(
                location = %failure.location.display(),
                reason = %failure.reason,
                "location skipped"
            );
            writeln!(
                errors,
                "[ERROR] (discover) skipping location {}: {}",
                failure.location.display(),
                failure.reason
            )?;
        }

        if discovery.factories.is_empty() {
            return Err(ConchError::NoCommands {
                searched: locations.len(),
            });
        }

        let mut commands = Vec::with_capacity(discovery.factories.len());
        for factory in &discovery.factories {
            match instantiate(factory.as_ref()) {
                Ok(command) => {
                    debug!(
                        type_name = factory.type_name(),
                        description = command.description(),
                        "command instantiated"
                    );
                    commands.push(command);
                }
                Err(err) => {
                    warn!(
                        type_name = factory.type_name(),
                        error = %err,
                        "command failed to instantiate"
                    );
                    writeln!(
                        errors,
                        "[ERROR] (populate) error instantiating command {}: {}",
                        factory.type_name(),
                        err.detail()
                    )?;
                }
            }
        }

        Self::from_commands(commands).ok_or(ConchError::NoCommands {
            searched: locations.len(),
        })
    }

    /// Orders already-built commands; `None` if there are none.
    pub fn from_commands(mut commands: Vec<Box<dyn Command>>) -> Option<Self> {
        if commands.is_empty() {
            return None;
        }

        // `sort_by` is stable, so equal descriptions keep discovery order.
        commands.sort_by(|a, b| a.description().cmp(b.description()));
        Some(Self { commands })
    }

    /// Number of commands; always at least one.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if there are no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Descriptions in menu order.
    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.description())
    }

    /// The command at a 0-based index.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Command + 'static)> {
        self.commands.get_mut(index).map(|command| command.as_mut())
    }
}

fn instantiate(
    factory: &dyn CommandFactory,
) -> std::result::Result<Box<dyn Command>, CommandError> {
    panic::catch_unwind(AssertUnwindSafe(|| factory.instantiate()))
        .unwrap_or_else(|payload| Err(CommandError::panicked(payload)))
}
