//! Error types for the channel layer.

use sc2link_protocol::{ProtocolError, RequestId};
use sc2link_transport::TransportError;

/// Errors a caller can see from the channel.
///
/// Individual connect failures never show up here: the retry loop absorbs
/// them and only reports [`ChannelError::ChannelUnavailable`] once the
/// budget is spent.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The socket closed or failed while this call was waiting for its
    /// reply. The request may already have taken effect on the engine, so
    /// it is not resent.
    #[error("connection lost while call {id} was pending")]
    ConnectionLost { id: RequestId },

    /// Every connection attempt in the retry budget failed. Terminal until
    /// the channel is explicitly reconnected.
    #[error("channel unavailable after {attempts} failed connection attempts")]
    ChannelUnavailable { attempts: u32 },

    /// A reply carried a different correlation id than the pending call.
    /// The stream can no longer be trusted, so the socket is torn down.
    #[error("protocol desync: expected reply to {expected}, got {actual}")]
    ProtocolDesync {
        expected: RequestId,
        actual: RequestId,
    },

    /// Encoding the request or validating the reply failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A transport failure that is not a connection loss, e.g. an
    /// oversized frame.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The channel has been shut down.
    #[error("channel is shut down")]
    Shutdown,
}
