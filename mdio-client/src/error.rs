//! Errors surfaced to callers of [`crate::client::Client`].

/// Everything that can go wrong submitting a program and collecting its
/// reply (§7).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The run aborted; carries the negative errno from the reply's
    /// `ERROR` attribute.
    #[error("device returned error {0}")]
    Device(i32),
    /// The reply stream ended without a `DONE` part.
    #[error("reply truncated before DONE")]
    Truncated,
    /// The transport itself failed before a reply could be assembled.
    #[error("transport error: {0}")]
    Transport(String),
}
