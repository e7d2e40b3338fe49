//! Source input

use std::io;
use std::path::Path;

/// Reads a source file into memory.
pub fn read_source(path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("failed to read `{}`: {e}", path.display()),
        )
    })
}
