use std::io;

use codec::CodecError;
use thiserror::Error;

/// Errors surfaced by the set engine.
///
/// No error is swallowed: an I/O or codec failure aborts the in-flight
/// operation and propagates. Writes are non-transactional, so a failure
/// mid-insert may leave the file with an orphan node or a stale count;
/// callers treat that as fatal for the file.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("set is empty")]
    EmptySet,
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("integrity violation: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, Error>;
