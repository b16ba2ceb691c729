use std::io;

/// Failures while creating, attaching to, or operating on the shared region.
///
/// None of these are retryable: the offending process is expected to log
/// the error and exit.
#[derive(Debug, thiserror::Error)]
pub enum ShmError {
    #[error("shared region I/O failed")]
    Io(#[from] io::Error),

    #[error("region is not a chroma shared block (bad magic)")]
    BadMagic,

    #[error("region format version {found}, supported version {expected}")]
    VersionMismatch { found: u64, expected: u64 },

    #[error("region capacity {0} is not a power of two")]
    BadCapacity(u64),

    #[error("record size mismatch: region holds {found}-byte records, expected {expected}")]
    RecordSizeMismatch { found: u64, expected: u64 },
}

/// Failures of a single blocking receive.
#[derive(Debug, thiserror::Error)]
pub enum RecvError {
    /// The wait was aborted by a delivered signal. The caller decides
    /// whether to re-enter the loop or begin shutdown.
    #[error("wait interrupted by signal")]
    Interrupted,

    #[error("semaphore operation failed")]
    Io(#[from] io::Error),
}
