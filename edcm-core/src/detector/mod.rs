//! Change detection for watched files.
//!
//! [`detect`] takes a file and the token returned by the previous call and yields whatever is
//! newly observable plus the next token. Two strategies exist:
//!
//! - [`ReadStrategy::Append`] for journals the game only appends to. The token is a byte offset
//!   and only complete lines past it are returned.
//! - [`ReadStrategy::Rewrite`] for files the game rewrites wholesale (`Market.json`). The token is
//!   the previous content and the whole file is returned whenever it differs.
//!
//! Reads are blocking; async callers should run them on the blocking pool.

mod append;
mod rewrite;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// How a watched file is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadStrategy {
    Append,
    Rewrite,
}

impl std::fmt::Display for ReadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadStrategy::Append => write!(f, "append"),
            ReadStrategy::Rewrite => write!(f, "rewrite"),
        }
    }
}

/// Opaque read-state token. `ReadState::default()` is the token for a file never read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadState(State);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum State {
    #[default]
    Fresh,
    Offset(u64),
    Content(String),
}

impl ReadState {
    /// Byte offset reached by an append-mode reader.
    pub fn offset(&self) -> u64 {
        match &self.0 {
            State::Offset(offset) => *offset,
            _ => 0,
        }
    }
}

/// Result of one detection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detected {
    /// Newly observable content; empty when nothing changed.
    pub content: String,
    pub state: ReadState,
}

impl Detected {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// The file could not be opened or read. The caller keeps its token and retries later.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DetectError {
    /// The file does not exist (yet).
    pub fn is_not_found(&self) -> bool {
        match self {
            DetectError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
        }
    }
}

/// Read what changed in `path` since `previous`.
pub fn detect(
    strategy: ReadStrategy,
    path: &Path,
    previous: &ReadState,
) -> Result<Detected, DetectError> {
    let io_err = |source| DetectError::Io {
        path: path.to_path_buf(),
        source,
    };
    match strategy {
        ReadStrategy::Append => {
            let (content, offset) = append::read_from(path, previous.offset()).map_err(io_err)?;
            Ok(Detected {
                content,
                state: ReadState(State::Offset(offset)),
            })
        }
        ReadStrategy::Rewrite => {
            let last = match &previous.0 {
                State::Content(content) => Some(content.as_str()),
                _ => None,
            };
            match rewrite::read_if_changed(path, last).map_err(io_err)? {
                Some(content) => Ok(Detected {
                    content: content.clone(),
                    state: ReadState(State::Content(content)),
                }),
                None => Ok(Detected {
                    content: String::new(),
                    state: previous.clone(),
                }),
            }
        }
    }
}
