use std::io;
use std::path::Path;

/// Read the whole file, returning it only if it differs from `previous`.
pub(super) fn read_if_changed(path: &Path, previous: Option<&str>) -> io::Result<Option<String>> {
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    if previous == Some(content.as_ref()) {
        Ok(None)
    } else {
        Ok(Some(content.into_owned()))
    }
}
