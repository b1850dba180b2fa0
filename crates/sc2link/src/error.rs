//! Unified error type for sc2link.

use sc2link_channel::ChannelError;
use sc2link_protocol::ProtocolError;
use sc2link_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `sc2link` crate you deal with this single error type
/// instead of importing errors from each layer. Channel errors that only
/// carry a protocol or transport error are unwrapped on conversion, so a
/// malformed reply is always `S2Error::Protocol` no matter which layer
/// noticed it.
#[derive(Debug, thiserror::Error)]
pub enum S2Error {
    /// A transport-level error (oversized frame, socket failure).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (invalid request, malformed response).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A channel-level error (connection lost, unavailable, desync, shut
    /// down).
    #[error(transparent)]
    Channel(ChannelError),
}

impl From<ChannelError> for S2Error {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Protocol(e) => Self::Protocol(e),
            ChannelError::Transport(e) => Self::Transport(e),
            other => Self::Channel(other),
        }
    }
}

impl S2Error {
    /// The socket dropped while this call was waiting for its reply.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Channel(ChannelError::ConnectionLost { .. }))
    }

    /// The retry budget is spent; call `S2Client::reconnect` to try again.
    pub fn is_channel_unavailable(&self) -> bool {
        matches!(self, Self::Channel(ChannelError::ChannelUnavailable { .. }))
    }

    pub fn is_desync(&self) -> bool {
        matches!(self, Self::Channel(ChannelError::ProtocolDesync { .. }))
    }

    pub fn is_malformed_response(&self) -> bool {
        matches!(self, Self::Protocol(ProtocolError::MalformedResponse(_)))
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Channel(ChannelError::Shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc2link_protocol::RequestId;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let s2_err: S2Error = err.into();
        assert!(matches!(s2_err, S2Error::Transport(_)));
        assert!(s2_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidArgument("test is required".into());
        let s2_err: S2Error = err.into();
        assert!(matches!(s2_err, S2Error::Protocol(_)));
        assert_eq!(s2_err.to_string(), "test is required");
    }

    #[test]
    fn test_channel_protocol_error_is_flattened() {
        let err = ChannelError::Protocol(ProtocolError::MalformedResponse(
            "map name is required".into(),
        ));
        let s2_err: S2Error = err.into();
        assert!(s2_err.is_malformed_response());
    }

    #[test]
    fn test_channel_transport_error_is_flattened() {
        let err = ChannelError::Transport(TransportError::FrameTooLarge {
            size: 10,
            max: 5,
        });
        let s2_err: S2Error = err.into();
        assert!(matches!(s2_err, S2Error::Transport(_)));
    }

    #[test]
    fn test_channel_errors_keep_their_kind() {
        let lost: S2Error =
            ChannelError::ConnectionLost { id: RequestId(4) }.into();
        assert!(lost.is_connection_lost());
        assert!(!lost.is_channel_unavailable());

        let gone: S2Error =
            ChannelError::ChannelUnavailable { attempts: 3 }.into();
        assert!(gone.is_channel_unavailable());

        let shut: S2Error = ChannelError::Shutdown.into();
        assert!(shut.is_shutdown());
    }
}
