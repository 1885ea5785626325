//! Wire-level error kinds: recv/send failure, malformed lines, and
//! over-length payloads.

#[derive(thiserror::Error, Debug)]
pub enum WireError {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
    #[error("peer closed the connection")]
    Eof,
    #[error("malformed command line")]
    MalformedLine,
    #[error("unknown command id {0}")]
    UnknownCommandId(u8),
    #[error("payload exceeds limit ({actual} > {limit} bytes)")]
    PayloadTooLong { limit: usize, actual: usize },
}
