//! File-backed streams

use crate::error::{StreamError, StreamResult};
use crate::io::stream::{InputStream, OutputStream, Style};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Output stream appending plain text to a file
#[derive(Debug)]
pub struct FileOutput {
    writer: BufWriter<File>,
}

impl FileOutput {
    /// Open `path` for appending, creating it when missing
    pub fn append(path: &Path) -> StreamResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(FileOutput {
            writer: BufWriter::new(file),
        })
    }

    /// Open `path` truncated
    pub fn create(path: &Path) -> StreamResult<Self> {
        let file = File::create(path)?;
        Ok(FileOutput {
            writer: BufWriter::new(file),
        })
    }
}

impl OutputStream for FileOutput {
    fn write_styled(&mut self, args: fmt::Arguments<'_>, _style: Style) -> StreamResult<()> {
        self.writer.write_fmt(args).map_err(StreamError::from)
    }

    fn flush(&mut self) -> StreamResult<()> {
        self.writer.flush().map_err(StreamError::from)
    }
}

impl Drop for FileOutput {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Input stream reading from a file
#[derive(Debug)]
pub struct FileInput {
    reader: BufReader<File>,
}

impl FileInput {
    pub fn open(path: &Path) -> StreamResult<Self> {
        let file = File::open(path)?;
        Ok(FileInput {
            reader: BufReader::new(file),
        })
    }
}

impl InputStream for FileInput {
    fn read_line(&mut self) -> StreamResult<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(StreamError::exhausted());
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }

    fn read(&mut self, bytes: usize) -> StreamResult<String> {
        let mut buf = vec![0u8; bytes];
        self.reader.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(StreamError::invalid_text)
    }
}
