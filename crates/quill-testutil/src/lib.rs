//! Utilities shared by quill tests.
//!
//! Two halves: programmatic [`tree`] builders, because the parser is not
//! part of this repository and tests construct compilation units directly;
//! and a minimal [`classbytes`] emitter plus [`jar`] writer, so classpath
//! scenarios run hermetically without a JDK.

pub mod classbytes;
pub mod tree;

use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a jar with the given `(entry name, bytes)` pairs.
pub fn jar(path: &Path, entries: &[(&str, Vec<u8>)]) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();
    for (name, bytes) in entries {
        writer
            .start_file(*name, options)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        writer.write_all(bytes)?;
    }
    writer
        .finish()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    Ok(())
}
