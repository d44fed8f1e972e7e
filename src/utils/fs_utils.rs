// File system utilities

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::utils::error::{ReqmError, Result};

/// Write `content` to `path` atomically: the data goes to a temporary file
/// in the same directory which then replaces the target
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ReqmError::io(dir, e))?;
    }

    let mut file = NamedTempFile::new_in(dir).map_err(|e| ReqmError::io(dir, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| ReqmError::io(file.path(), e))?;
    file.persist(path).map_err(|e| ReqmError::io(path, e.error))?;
    Ok(())
}
