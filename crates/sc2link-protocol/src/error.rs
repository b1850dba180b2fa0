//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the problem is in the bytes or in the
//! shape of a value, never in the network. None of these are worth
//! retrying: resending the same request cannot fix a schema mismatch.

/// Errors that can occur while building, encoding, or decoding messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(String),

    /// Deserialization failed (turning bytes into a Rust value).
    #[error("decode failed: {0}")]
    Decode(String),

    /// A request builder was missing a required piece.
    ///
    /// The message is the exact precondition text, e.g.
    /// `"one of map data is required"`.
    #[error("{0}")]
    InvalidArgument(String),

    /// A reply decoded but does not have the expected shape.
    ///
    /// The message names what is missing, e.g. `"map name is required"`.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ProtocolError {
    pub(crate) fn required(label: &str) -> Self {
        Self::MalformedResponse(format!("{label} is required"))
    }

    /// The bare reason carried by this error, without the variant prefix.
    pub fn reason(&self) -> &str {
        match self {
            Self::Encode(s)
            | Self::Decode(s)
            | Self::InvalidArgument(s)
            | Self::MalformedResponse(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_message() {
        let err = ProtocolError::required("map name");
        assert_eq!(err.reason(), "map name is required");
        assert_eq!(err.to_string(), "malformed response: map name is required");
    }

    #[test]
    fn test_invalid_argument_displays_bare_text() {
        let err = ProtocolError::InvalidArgument("test is required".into());
        assert_eq!(err.to_string(), "test is required");
    }
}
