//! Unified error type for the quadpong server.

use quadpong_actor::AskError;
use quadpong_protocol::ProtocolError;
use quadpong_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuadpongError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A request/reply exchange with an actor failed.
    #[error(transparent)]
    Ask(#[from] AskError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let top: QuadpongError = err.into();
        assert!(matches!(top, QuadpongError::Transport(_)));
        assert!(top.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let top: QuadpongError = err.into();
        assert!(matches!(top, QuadpongError::Protocol(_)));
    }

    #[test]
    fn test_from_ask_error() {
        let top: QuadpongError = AskError::Timeout.into();
        assert!(matches!(top, QuadpongError::Ask(_)));
    }
}
