//! Error types returned by report delivery.

use std::time::Duration;
use thiserror::Error;

/// Failure modes of a [`Transport`](crate::Transport) delivery attempt.
///
/// The reporter treats every variant identically: the error is logged, the
/// batch is abandoned, and its size is folded into the dropped-span count.
/// The variants exist so concrete transports can say what actually happened.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// The collector connection could not be established or was lost
    /// mid-request.
    #[error("collector connection failed: {0}")]
    Connection(String),

    /// The collector did not answer within the configured read timeout.
    #[error("collector request timed out after {0:?}")]
    Timeout(Duration),

    /// The collector answered with something other than a report
    /// acknowledgement.
    #[error("malformed collector response: {0}")]
    MalformedResponse(String),

    /// Other failure modes not covered by the variants above.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}
