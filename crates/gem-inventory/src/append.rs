use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{InventoryError, Result};

/// An append-only CSV log opened for writing new rows.
pub(crate) struct AppendLog {
    pub file: File,
    /// Header of the existing log; `None` when the file is new or empty.
    pub header: Option<Vec<String>>,
}

/// Open `path` for appending, creating it if needed.
///
/// A non-empty file whose last line is unterminated gets a newline first, so
/// appended rows never merge into it.
pub(crate) fn open_log(path: &Path) -> Result<AppendLog> {
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| InventoryError::io(path, e))?;
    let len = file
        .metadata()
        .map_err(|e| InventoryError::io(path, e))?
        .len();
    if len == 0 {
        return Ok(AppendLog { file, header: None });
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))
        .and_then(|_| file.read_exact(&mut last))
        .map_err(|e| InventoryError::io(path, e))?;
    if last[0] != b'\n' {
        log::debug!("{}: terminating last line before append", path.display());
        file.write_all(b"\n")
            .map_err(|e| InventoryError::io(path, e))?;
    }

    let mut reader = csv::Reader::from_path(path).map_err(|e| InventoryError::csv(path, e))?;
    let header: Vec<String> = reader
        .headers()
        .map_err(|e| InventoryError::csv(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    Ok(AppendLog {
        file,
        header: Some(header),
    })
}
