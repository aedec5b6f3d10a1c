//! Error types for the actor runtime.

/// Errors from [`ask`](crate::ask) request/reply exchanges.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AskError {
    /// No reply arrived within the allowed wait.
    #[error("ask timed out")]
    Timeout,

    /// The recipient dropped the reply channel without answering —
    /// usually because it stopped, or because the request itself was
    /// dropped on a full mailbox.
    #[error("reply channel dropped")]
    Dropped,
}
