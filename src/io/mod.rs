//! Input and output streams
//!
//! Commands never touch stdout or stdin directly. They write through an
//! [`OutputStream`] and read through an [`InputStream`], so the console can be
//! swapped for a file or an in-memory buffer (in tests, for instance).

pub mod console;
pub mod file;
pub mod memory;
pub mod stream;

// Re-export main types
pub use console::*;
pub use file::*;
pub use memory::*;
pub use stream::*;
