use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::Output;
use crate::error::{Error, Result};

/// Writes each line followed by `\n`.
pub fn write_lines<W: Write>(lines: &[String], out: W) -> std::io::Result<()> {
    let mut out = BufWriter::new(out);
    for line in lines {
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

/// Sends `lines` to stdout or replaces the target file.
///
/// Files are written to a temporary sibling first and renamed into place, so a
/// failure never leaves a truncated report behind.
pub fn emit(lines: &[String], output: &Output) -> Result<()> {
    match output {
        Output::Stdout => {
            let stdout = std::io::stdout().lock();
            write_lines(lines, stdout)?;
        }
        Output::File(path) => {
            let dir = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            let mut tmp = NamedTempFile::new_in(dir).map_err(Error::path(dir))?;
            write_lines(lines, tmp.as_file_mut()).map_err(Error::path(tmp.path()))?;
            tmp.persist(path)
                .map_err(|e| Error::path(path)(e.error))?;
        }
    }
    debug!(lines = lines.len(), %output, "report written");
    Ok(())
}
