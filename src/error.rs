use crate::Key;
use std::error::Error;
use std::fmt;

/// Caller-visible failures of the sampling contract.
///
/// Precondition violations leave the index untouched; the failed operation is
/// a no-op. Broken internal invariants are defects and panic instead of
/// surfacing here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    /// `insert` of a key that is currently live.
    KeyConflict(Key),
    /// `delete` or `update` of a key that is not currently live.
    UnknownKey(Key),
    /// `sample` on an index with no live items or zero total weight.
    EmptyDomain,
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::KeyConflict(key) => write!(f, "key {} is already live", key),
            SampleError::UnknownKey(key) => write!(f, "key {} is not live", key),
            SampleError::EmptyDomain => write!(f, "nothing to sample: no item carries weight"),
        }
    }
}

impl Error for SampleError {}
