//! Colored terminal output honoring `--quiet` and `--verbose`.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Writes user-facing messages to stdout/stderr.
///
/// Errors always print; everything else is suppressed by `quiet`, and
/// [`OutputManager::verbose`] lines need `verbose`.
#[derive(Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    stdout: Arc<StandardStream>,
    stderr: Arc<StandardStream>,
}

impl std::fmt::Debug for OutputManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputManager")
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

impl OutputManager {
    /// Creates an output manager. Colors follow whether the stream is a terminal.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        let choice = |is_tty: bool| {
            if is_tty && std::env::var_os("NO_COLOR").is_none() {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            }
        };
        Self {
            verbose,
            quiet,
            stdout: Arc::new(StandardStream::stdout(choice(io::stdout().is_terminal()))),
            stderr: Arc::new(StandardStream::stderr(choice(io::stderr().is_terminal()))),
        }
    }

    fn write(
        stream: &StandardStream,
        color: Option<Color>,
        bold: bool,
        label: &str,
        message: &str,
    ) -> io::Result<()> {
        let mut lock = stream.lock();
        if !label.is_empty() {
            lock.set_color(ColorSpec::new().set_fg(color).set_bold(bold))?;
            write!(lock, "{}", label)?;
            lock.reset()?;
            write!(lock, " ")?;
        }
        writeln!(lock, "{}", message)?;
        lock.flush()
    }

    /// Detail line, only with `--verbose`.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.verbose || self.quiet {
            return Ok(());
        }
        Self::write(&self.stdout, Some(Color::Cyan), false, "·", message)
    }

    /// Warning on stderr.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        Self::write(&self.stderr, Some(Color::Yellow), true, "warning:", message)
    }

    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        Self::write(&self.stdout, Some(Color::Green), true, "✓", message)
    }

    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        Self::write(&self.stdout, Some(Color::Blue), true, "→", message)
    }

    /// Bold section header.
    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut lock = self.stdout.lock();
        lock.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(lock, "{}", title)?;
        lock.reset()?;
        lock.flush()
    }

    pub fn indent(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        Self::write(&self.stdout, None, false, "", &format!("  {}", message))
    }

    /// Error on stderr. Printed even with `--quiet`.
    pub fn error(&self, message: &str) -> io::Result<()> {
        Self::write(&self.stderr, Some(Color::Red), true, "error:", message)
    }
}
