//! The command capability every plugin provides.

use crate::channels::Channels;
use crate::error::CommandError;

/// An interactive action offered in the menu.
///
/// Each command requests its own input and prints its own output through the
/// channels it is handed. Implementations may keep state, but a fresh instance
/// is created on every discovery pass.
pub trait Command {
    /// A user-friendly explanation of what the command does.
    ///
    /// Must be side-effect free and stable for the life of the instance.
    fn description(&self) -> &str;

    /// Runs the command to completion.
    fn execute(&mut self, io: &mut Channels) -> Result<(), CommandError>;
}

/// A discovered command type that can produce instances on demand.
pub trait CommandFactory {
    /// Identifies the type in diagnostics.
    fn type_name(&self) -> &str;

    /// Creates a new instance with no arguments.
    fn instantiate(&self) -> Result<Box<dyn Command>, CommandError>;
}
