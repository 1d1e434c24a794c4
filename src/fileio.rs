//! Whole-file text reading.

use std::fs;
use std::io;
use std::path::Path;

/// Read a file into a string, stripping trailing newlines.
///
/// A path that does not name an existing regular file yields an empty
/// string. Interior newlines are preserved.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or is not UTF-8.
pub fn read_text<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let path = path.as_ref();
    if !path.is_file() {
        return Ok(String::new());
    }

    let contents = fs::read_to_string(path)?;
    Ok(contents.trim_end_matches('\n').to_owned())
}
