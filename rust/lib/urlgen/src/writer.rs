use std::fs;
use std::io::ErrorKind;

use tracing::info;

use crate::error::GenError;
use crate::GeneratedFile;

/// Whether the file on disk already holds exactly the generated content.
pub fn is_up_to_date(file: &GeneratedFile) -> Result<bool, GenError> {
    match fs::read_to_string(&file.path) {
        Ok(current) => Ok(current == file.content),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(GenError::io(&file.path, e)),
    }
}

/// Write `file` unless it is already up to date. Returns whether it wrote.
pub fn write_if_changed(file: &GeneratedFile) -> Result<bool, GenError> {
    if is_up_to_date(file)? {
        info!(path = %file.path.display(), "url table unchanged");
        return Ok(false);
    }
    if let Some(parent) = file.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GenError::io(parent, e))?;
    }
    fs::write(&file.path, &file.content).map_err(|e| GenError::io(&file.path, e))?;
    info!(path = %file.path.display(), bytes = file.content.len(), "url table written");
    Ok(true)
}
