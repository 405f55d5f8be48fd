//! Error types for the progress renderer and the stream attacher

use thiserror::Error;

/// Failure while consuming a progress stream.
///
/// Every variant is fatal for the invocation that produced it: the renderer
/// never skips a chunk it could not decode.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// A chunk did not parse as a sequence of JSON values
    #[error("malformed progress chunk: {0}")]
    Json(#[from] serde_json::Error),

    /// The `aux` payload of a build trace was not valid base64
    #[error("build trace payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded build trace was not a valid status message
    #[error("malformed build trace message: {0}")]
    Trace(#[from] prost::DecodeError),

    /// A build trace item had no string `aux` payload
    #[error("build trace item has no payload")]
    MissingTracePayload,

    /// Reading the stream or writing to the terminal failed
    #[error("progress stream I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while attaching the local terminal to a remote stream.
#[derive(Debug, Error)]
pub enum AttachError {
    /// The remote stream reported an error before it ended
    #[error("remote stream failed: {0}")]
    Remote(#[source] std::io::Error),

    /// Switching the local terminal mode or writing to it failed
    #[error("terminal error: {0}")]
    Terminal(#[source] std::io::Error),
}
