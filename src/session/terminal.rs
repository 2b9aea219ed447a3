//! Terminal access for a session.
//!
//! [`Terminal`] is the seam between the session and the device: raw mode,
//! width, the output stream and the input subscription. [`StdTerminal`] is
//! the real process terminal; tests substitute their own.

use std::io::{self, IsTerminal, Stdout, Write};

use crossterm::{cursor::Show, execute};
use tracing::{debug, warn};

use crate::error::Result;
use crate::input::{stdin_hub, InputSubscription};

/// The device a session runs on.
pub trait Terminal {
    fn enable_raw_mode(&mut self) -> io::Result<()>;

    fn disable_raw_mode(&mut self) -> io::Result<()>;

    /// Current width in columns, if the device can tell.
    fn columns(&self) -> Option<u16>;

    fn writer(&mut self) -> &mut dyn Write;

    /// Take exclusive ownership of the input byte stream.
    fn subscribe(&mut self) -> Result<InputSubscription>;
}

/// Process stdin/stdout.
///
/// Raw mode is skipped when stdin is not a TTY (piped input, CI). Dropping
/// the terminal while raw restores cooked mode and shows the cursor, so a
/// panic inside a widget still leaves a usable shell.
pub struct StdTerminal {
    stdout: Stdout,
    raw: bool,
}

impl StdTerminal {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            raw: false,
        }
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }
}

impl Default for StdTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for StdTerminal {
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        if self.raw {
            return Ok(());
        }
        if !io::stdin().is_terminal() {
            debug!("stdin is not a terminal; staying in cooked mode");
            return Ok(());
        }
        crossterm::terminal::enable_raw_mode()?;
        self.raw = true;
        Ok(())
    }

    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if self.raw {
            crossterm::terminal::disable_raw_mode()?;
            self.raw = false;
        }
        Ok(())
    }

    fn columns(&self) -> Option<u16> {
        crossterm::terminal::size()
            .ok()
            .map(|(cols, _)| cols)
            .filter(|&cols| cols > 0)
    }

    fn writer(&mut self) -> &mut dyn Write {
        &mut self.stdout
    }

    fn subscribe(&mut self) -> Result<InputSubscription> {
        stdin_hub().subscribe()
    }
}

impl Drop for StdTerminal {
    fn drop(&mut self) {
        if !self.raw {
            return;
        }
        // Best effort; the session normally restored everything already.
        if let Err(err) = crossterm::terminal::disable_raw_mode() {
            warn!(error = %err, "failed to leave raw mode on drop");
        }
        let _ = execute!(self.stdout, Show);
    }
}
