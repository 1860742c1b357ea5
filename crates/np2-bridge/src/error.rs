use thiserror::Error;

/// Virtual filesystem failures.
///
/// [`FsError::Io`] intentionally stores a human-readable `String` rather than
/// `std::io::Error` so wasm32 implementations can surface errors originating
/// from JavaScript/DOM APIs without a platform-specific error type.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("filesystem error: {0}")]
    Io(String),
}

/// Errors surfaced by the host-facing bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A disk attach referenced an image name absent from the virtual
    /// filesystem. The operation has no effect.
    #[error("{0}: invalid disk image name")]
    InvalidImageName(String),

    #[error(transparent)]
    Fs(#[from] FsError),
}
