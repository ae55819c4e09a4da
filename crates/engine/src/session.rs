//! The interactive menu loop.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

use conch_core::{
    Channels, Command, CommandError, ConchError, LocationSet, Locator, Registry, Result,
};
use tracing::{debug, info, warn};

use crate::dispatcher;

const STARTUP_BANNER: &str = "Starting console";
const TERMINATION_BANNER: &str = "Terminating console";
const INSTRUCTIONS: &str = "Please choose one of the available commands or press ENTER to exit";
const SEPARATOR: &str = "##############################################";

/// Where the loop is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Showing the menu and dispatching selections.
    Running,

    /// The user asked to leave; nothing more will be dispatched.
    Terminated,
}

/// Drives discovery, the menu, and command dispatch until the user exits.
///
/// The loop is single-threaded: it owns the channels and lends them to one
/// command at a time. Failures inside a command are reported on the error
/// channel and never end the session; only running out of commands does.
pub struct Session<L> {
    /// Finds command types on every iteration.
    locator: L,

    /// Where to look; fixed for the life of the session.
    locations: LocationSet,

    /// Menu, prompt and command I/O.
    io: Channels,

    /// Diagnostics, kept apart from normal output.
    errors: Box<dyn Write>,

    state: SessionState,
}

impl<L: Locator> Session<L> {
    /// Creates a new session.
    pub fn new(
        locator: L,
        locations: LocationSet,
        io: Channels,
        errors: Box<dyn Write>,
    ) -> Self {
        Self {
            locator,
            locations,
            io,
            errors,
            state: SessionState::Running,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs until the user submits an empty line or input ends.
    ///
    /// Returns an error only for conditions the session cannot recover from,
    /// such as having no commands to offer.
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.io.output(), "{}\n", STARTUP_BANNER)?;

        while self.step()? == SessionState::Running {}

        writeln!(self.io.output(), "{}", TERMINATION_BANNER)?;
        self.io.output().flush()?;
        Ok(())
    }

    /// Performs one iteration: rediscover, show the menu, handle one line.
    pub fn step(&mut self) -> Result<SessionState> {
        if self.state == SessionState::Terminated {
            return Ok(self.state);
        }

        // A fresh snapshot every pass; the previous one is dropped here.
        let mut registry =
            Registry::populate(&self.locator, &self.locations, self.errors.as_mut())?;
        self.print_menu(&registry)?;

        let line = self.io.read_line().map_err(ConchError::Input)?;
        let selection = line.as_deref().map(str::trim).unwrap_or_default();

        if selection.is_empty() {
            debug!("empty selection, terminating");
            self.state = SessionState::Terminated;
            return Ok(self.state);
        }

        match dispatcher::resolve(selection, &mut registry) {
            Ok(command) => {
                writeln!(self.io.output())?;
                self.dispatch(command)?;
            }
            Err(invalid) => {
                debug!(selection, "invalid selection");
                writeln!(self.errors, "[ERROR] {}", invalid)?;
                self.errors.flush()?;
            }
        }

        writeln!(self.io.output(), "\n{}\n\n", SEPARATOR)?;
        Ok(self.state)
    }

    fn print_menu(&mut self, registry: &Registry) -> Result<()> {
        let out = self.io.output();

        writeln!(out, "{}\n", INSTRUCTIONS)?;
        for line in dispatcher::render(registry) {
            writeln!(out, "{}", line)?;
        }
        writeln!(out)?;
        out.flush()?;

        Ok(())
    }

    fn dispatch(&mut self, command: &mut dyn Command) -> Result<()> {
        let description = command.description().to_string();
        info!(command = %description, "running command");

        let io = &mut self.io;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| command.execute(io)))
            .unwrap_or_else(|payload| Err(CommandError::panicked(payload)));
        self.io.output().flush()?;

        if let Err(err) = outcome {
            warn!(command = %description, error = %err, "command failed");
            writeln!(
                self.errors,
                "[ERROR] Error running command <{}>. Exception was",
                description
            )?;
            writeln!(self.errors, "{:?}", miette::Report::new(err))?;
            self.errors.flush()?;
        }

        Ok(())
    }
}
