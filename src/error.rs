//! Error type for structural failures.
//!
//! Malformed queries and missing dictionary terms are never represented here;
//! they resolve locally to empty results (see [`crate::query`]). This type is
//! reserved for I/O and on-disk corruption, which are always fatal.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum IndexError {
    Io(io::Error),
    MissingInput(String),
    CorruptDictionary(String),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::Io(e) => write!(f, "I/O error: {e}"),
            IndexError::MissingInput(path) => write!(f, "missing input: {path}"),
            IndexError::CorruptDictionary(msg) => write!(f, "corrupt dictionary: {msg}"),
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndexError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for IndexError {
    fn from(e: io::Error) -> Self {
        IndexError::Io(e)
    }
}
