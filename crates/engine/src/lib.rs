//! Conch Engine - Menu dispatch and the interactive session loop.

pub mod dispatcher;
mod session;

pub use dispatcher::InvalidSelection;
pub use session::{Session, SessionState};
