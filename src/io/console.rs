//! Process console streams

use crate::error::{StreamError, StreamResult};
use crate::io::stream::{InputStream, OutputStream, Style};
use colored::Colorize;
use std::fmt;
use std::io::{self, BufRead, Read, Write};

/// Which standard stream a [`ConsoleOutput`] writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    Stdout,
    Stderr,
}

/// Output stream writing to stdout or stderr, applying colors
#[derive(Debug)]
pub struct ConsoleOutput {
    target: ConsoleTarget,
}

impl ConsoleOutput {
    /// Console output on stdout
    pub fn stdout() -> Self {
        ConsoleOutput {
            target: ConsoleTarget::Stdout,
        }
    }

    /// Console output on stderr
    pub fn stderr() -> Self {
        ConsoleOutput {
            target: ConsoleTarget::Stderr,
        }
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }

    fn emit(&self, text: &str) -> io::Result<()> {
        match self.target {
            ConsoleTarget::Stdout => io::stdout().lock().write_all(text.as_bytes()),
            ConsoleTarget::Stderr => io::stderr().lock().write_all(text.as_bytes()),
        }
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::stdout()
    }
}

impl OutputStream for ConsoleOutput {
    fn write_styled(&mut self, args: fmt::Arguments<'_>, style: Style) -> StreamResult<()> {
        let text = args.to_string();
        if style.is_plain() {
            return self.emit(&text).map_err(StreamError::from);
        }

        // `colored` drops the escape codes itself when colors are disabled
        let mut styled = text.as_str().normal();
        if let Some(color) = style.color {
            styled = styled.color(color);
        }
        if style.bold {
            styled = styled.bold();
        }
        self.emit(&styled.to_string()).map_err(StreamError::from)
    }

    fn flush(&mut self) -> StreamResult<()> {
        match self.target {
            ConsoleTarget::Stdout => io::stdout().flush()?,
            ConsoleTarget::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }
}

/// Input stream reading from stdin
#[derive(Debug, Default)]
pub struct ConsoleInput;

impl ConsoleInput {
    pub fn new() -> Self {
        ConsoleInput
    }
}

impl InputStream for ConsoleInput {
    fn read_line(&mut self) -> StreamResult<String> {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(StreamError::exhausted());
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }

    fn read(&mut self, bytes: usize) -> StreamResult<String> {
        let mut buf = vec![0u8; bytes];
        io::stdin().lock().read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(StreamError::invalid_text)
    }
}

/// Enable or disable ANSI colors for every console stream
pub fn set_colors_enabled(enabled: bool) {
    colored::control::set_override(enabled);
}
