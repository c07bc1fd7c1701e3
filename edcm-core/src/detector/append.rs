use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::warn;

/// Read the complete lines of `path` past `offset`.
///
/// Returns the content and the offset just past the last complete line. A file shorter than
/// `offset` has been truncated or replaced and is read again from the start.
pub(super) fn read_from(path: &Path, offset: u64) -> io::Result<(String, u64)> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();

    let start = if len < offset {
        warn!(
            path = %path.display(),
            offset,
            len,
            "File shrank below read offset, reading from start"
        );
        0
    } else {
        offset
    };
    if len == start {
        return Ok((String::new(), start));
    }

    file.seek(SeekFrom::Start(start))?;
    let mut buf = Vec::new();
    // Bytes appended after the metadata call are left for the next poll.
    file.take(len - start).read_to_end(&mut buf)?;

    let complete = buf.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1);
    buf.truncate(complete);
    let content = String::from_utf8_lossy(&buf).into_owned();
    Ok((content, start + complete as u64))
}
