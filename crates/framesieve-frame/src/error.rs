/// Errors that can occur while decoding or demultiplexing a frame stream.
///
/// Every variant is fatal to the run: the wire format carries no
/// synchronization marker, so there is no safe way to scan forward for the
/// next frame boundary after a framing violation.
#[derive(Debug, thiserror::Error)]
pub enum DemuxError {
    /// The stream ended partway through a 12-byte header.
    #[error("truncated header (got {got} of 12 bytes)")]
    TruncatedHeader { got: usize },

    /// The header declared a payload length above the configured maximum.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The stream ended before the declared payload was complete.
    #[error("truncated payload (got {got} of {expected} bytes)")]
    TruncatedPayload { expected: usize, got: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DemuxError>;
