//! In-memory streams

use crate::error::{StreamError, StreamResult};
use crate::io::stream::{InputStream, OutputStream, Style};
use std::fmt::{self, Write as _};

/// Output stream collecting everything written into a string
#[derive(Debug, Default, Clone)]
pub struct MemoryOutput {
    buffer: String,
}

impl MemoryOutput {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> &str {
        &self.buffer
    }

    /// Written text split into lines
    pub fn lines(&self) -> Vec<String> {
        self.buffer.lines().map(str::to_string).collect()
    }

    /// Forget everything written so far
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl OutputStream for MemoryOutput {
    fn write_styled(&mut self, args: fmt::Arguments<'_>, _style: Style) -> StreamResult<()> {
        self.buffer
            .write_fmt(args)
            .map_err(|e| StreamError(std::io::Error::new(std::io::ErrorKind::Other, e)))
    }
}

/// Input stream reading from a preloaded string
#[derive(Debug, Default, Clone)]
pub struct MemoryInput {
    data: String,
    position: usize,
}

impl MemoryInput {
    /// Input made of raw text
    pub fn new(data: impl Into<String>) -> Self {
        MemoryInput {
            data: data.into(),
            position: 0,
        }
    }

    /// Input made of lines, each terminated with a line break
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut data = String::new();
        for line in lines {
            data.push_str(line.as_ref());
            data.push('\n');
        }
        Self::new(data)
    }

    /// Text not read yet
    pub fn remaining(&self) -> &str {
        &self.data[self.position..]
    }
}

impl InputStream for MemoryInput {
    fn read_line(&mut self) -> StreamResult<String> {
        let rest = self.remaining();
        if rest.is_empty() {
            return Err(StreamError::exhausted());
        }

        let (line, consumed) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], idx + 1),
            None => (rest, rest.len()),
        };
        let line = line.strip_suffix('\r').unwrap_or(line).to_string();
        self.position += consumed;
        Ok(line)
    }

    fn read(&mut self, bytes: usize) -> StreamResult<String> {
        let rest = self.remaining();
        if rest.len() < bytes {
            return Err(StreamError::exhausted());
        }

        if !rest.is_char_boundary(bytes) {
            return Err(StreamError::invalid_text(format!(
                "reading {} bytes would split a character",
                bytes
            )));
        }
        let chunk = rest[..bytes].to_string();
        self.position += bytes;
        Ok(chunk)
    }
}
