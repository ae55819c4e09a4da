//! Conch Core - Core types and traits for the Conch shell.
//!
//! Defines the command capability shared by the host and its plugins, the
//! discovery contract, and the per-iteration command registry.

mod channels;
mod command;
mod error;
mod locator;
mod registry;

pub use channels::Channels;
pub use command::{Command, CommandFactory};
pub use error::{CommandError, ConchError, LocationFailure, Result};
pub use locator::{Discovery, LocationSet, Locator};
pub use registry::Registry;
