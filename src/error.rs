//! Error taxonomy.
//!
//! Every public function in this crate returns `Result<_, anyhow::Error>`, matching the
//! teacher's (`text-file-sort`) style exactly. Internally each failure is tagged with an
//! [`ErrorKind`] via `anyhow::Context`, so a caller who needs to distinguish, say,
//! `InsufficientMemory` from a plain I/O failure can `err.downcast_ref::<ErrorKind>()` without
//! the rest of the crate having to thread a bespoke error enum through every `?`.

use thiserror::Error;

/// Which stage-independent condition triggered a failure.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A precondition on the public entry point was violated (empty path, `merge_at_once < 2`,
    /// `avail_mem < 3 * sizeof(T)`), detected before any I/O happens.
    #[error("invalid argument")]
    InvalidArgument,
    /// The derived chunk length or merge buffer size rounds down to less than one record.
    #[error("insufficient memory for the requested configuration")]
    InsufficientMemory,
    /// A file's size is not a multiple of the record width.
    #[error("file size is not a multiple of the record width")]
    CorruptSize,
    /// A file could not be opened for reading or writing.
    #[error("failed to open file")]
    OpenFailed,
    /// A read, write, rename, or remove failed mid-operation.
    #[error("I/O operation failed")]
    IoError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn downcast_recovers_kind() {
        let err: anyhow::Error = anyhow::anyhow!("boom").context(ErrorKind::CorruptSize);
        assert_eq!(err.downcast_ref::<ErrorKind>(), Some(&ErrorKind::CorruptSize));
    }
}
