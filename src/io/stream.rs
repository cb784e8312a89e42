//! Stream capability traits and text styles

use crate::error::StreamResult;
use colored::Color;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Styling hints attached to a write.
///
/// Sinks that are not a terminal ignore them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub color: Option<Color>,
    pub bold: bool,
}

impl Style {
    /// No color, no emphasis
    pub fn plain() -> Self {
        Style::default()
    }

    /// A colored style
    pub fn color(color: Color) -> Self {
        Style {
            color: Some(color),
            bold: false,
        }
    }

    /// Same style, bold
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Whether this style carries no hints at all
    pub fn is_plain(&self) -> bool {
        self.color.is_none() && !self.bold
    }
}

/// Something a command can write text to
pub trait OutputStream {
    /// Write formatted text with style hints
    fn write_styled(&mut self, args: fmt::Arguments<'_>, style: Style) -> StreamResult<()>;

    /// Flush buffered output, if any
    fn flush(&mut self) -> StreamResult<()> {
        Ok(())
    }

    /// Write formatted text without style
    fn print(&mut self, args: fmt::Arguments<'_>) -> StreamResult<()> {
        self.write_styled(args, Style::plain())
    }

    /// Write formatted text followed by a line break
    fn println(&mut self, args: fmt::Arguments<'_>) -> StreamResult<()> {
        self.write_styled(args, Style::plain())?;
        self.write_styled(format_args!("\n"), Style::plain())
    }
}

/// Something a command can read text from
pub trait InputStream {
    /// Read one line, without its line terminator
    fn read_line(&mut self) -> StreamResult<String>;

    /// Read exactly `bytes` bytes of UTF-8 text.
    ///
    /// Fails with `InvalidData` when those bytes are not valid UTF-8 on
    /// their own, for example when they end inside a character.
    fn read(&mut self, bytes: usize) -> StreamResult<String>;
}

/// Output stream shared between the runner and its commands
pub type SharedOutput = Rc<RefCell<dyn OutputStream>>;

/// Input stream shared between the runner and its commands
pub type SharedInput = Rc<RefCell<dyn InputStream>>;

/// Wrap an output stream for sharing
pub fn shared_output<O: OutputStream + 'static>(stream: O) -> SharedOutput {
    Rc::new(RefCell::new(stream))
}

/// Wrap an input stream for sharing
pub fn shared_input<I: InputStream + 'static>(stream: I) -> SharedInput {
    Rc::new(RefCell::new(stream))
}
