//! The input/output pair shared by the session and every command it runs.

use std::io::{self, BufRead, Write};

/// Line-oriented input and text output owned by a session.
///
/// One `Channels` value lives for the whole run. It is lent to whichever
/// party is active: the session loop while it renders the menu and reads a
/// selection, then the dispatched command for the duration of `execute`.
pub struct Channels {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl Channels {
    /// Creates channels over the given reader and writer.
    pub fn new(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Self { input, output }
    }

    /// Channels bound to the process stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdin().lock()), Box::new(io::stdout()))
    }

    /// Channels that read nothing and discard all output.
    ///
    /// Used as a placeholder while the real pair is lent out.
    pub fn detached() -> Self {
        Self::new(Box::new(io::empty()), Box::new(io::sink()))
    }

    /// Reads one line without its line ending.
    ///
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD. Returns
    /// `None` once the input is exhausted.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }

        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }

        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// The output stream.
    pub fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }
}

impl Default for Channels {
    fn default() -> Self {
        Self::detached()
    }
}
