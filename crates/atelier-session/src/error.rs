//! Error types for the session coordination layer.

use thiserror::Error;

/// Failure surfaced by the realtime transport while opening or closing a
/// channel subscription. The registry does not retry; retry policy belongs to
/// the transport implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("subscription error: {0}")]
    Subscription(String),

    #[error("internal transport error: {0}")]
    Internal(String),
}
