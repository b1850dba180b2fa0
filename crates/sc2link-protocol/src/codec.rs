//! Codecs: how wire-schema values become frames and back.
//!
//! The [`Codec`] trait is the serialization strategy. [`ProtobufCodec`] is
//! the default and the only one a real engine understands. [`BincodeCodec`]
//! (feature `bincode`) and [`JsonCodec`] (feature `json`) carry the same
//! messages for fake engines and debugging.
//!
//! [`WireCodec`] sits on top and speaks in requests and responses: it
//! lowers a typed [`Request`] into one frame and turns one frame back into
//! a validated [`Response`]. It is pure and does no I/O.

use prost::Message as _;
use serde::{Serialize, de::DeserializeOwned};

use crate::response::ResponseType;
use crate::types::RequestId;
use crate::{ProtocolError, Request, Response, wire};

/// A wire-schema message: encodable as protobuf and through serde.
pub trait WireMessage: prost::Message + Default + Serialize + DeserializeOwned {}

impl<T> WireMessage for T where T: prost::Message + Default + Serialize + DeserializeOwned {}

/// A codec that can encode wire messages to bytes and decode bytes back.
///
/// - `Send + Sync` → shared with the channel's actor task.
/// - `'static` → owns everything it needs.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a message into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: WireMessage>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a message.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// truncated, or don't match the expected type.
    fn decode<T: WireMessage>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// ProtobufCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] producing the engine's own protobuf encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufCodec;

impl Codec for ProtobufCodec {
    fn encode<T: WireMessage>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        Ok(value.encode_to_vec())
    }

    fn decode<T: WireMessage>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        T::decode(data).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// BincodeCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] using `bincode`: fixed-width integers, length-prefixed
/// sequences, and enum variants tagged by index.
#[cfg(feature = "bincode")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

#[cfg(feature = "bincode")]
impl Codec for BincodeCodec {
    fn encode<T: WireMessage>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        bincode::serialize(value).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    fn decode<T: WireMessage>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        bincode::deserialize(data).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Absent optional fields decode to `None` and absent lists to empty,
/// matching the engine schema's defaults.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: WireMessage>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    fn decode<T: WireMessage>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// WireCodec
// ---------------------------------------------------------------------------

/// Request/response translation over a [`Codec`].
///
/// ## Example
///
/// ```rust
/// use sc2link_protocol::{Request, RequestId, ResponseType, WireCodec, wire};
///
/// let codec = WireCodec::protobuf();
///
/// // Client side: one request, one frame.
/// let frame = codec.encode_request(RequestId(1), &Request::QuickSave).unwrap();
///
/// // Engine side: read it and answer.
/// let req = codec.decode_request(&frame).unwrap();
/// let reply = wire::Response::reply(req.id, wire::ResponseBody::QuickSave(wire::Empty {}));
/// let bytes = codec.encode_response(&reply).unwrap();
///
/// // Client side again.
/// let resp = codec.decode_response(&bytes, ResponseType::QuickSave).unwrap();
/// assert_eq!(resp.id(), RequestId(1));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WireCodec<C = ProtobufCodec> {
    codec: C,
}

impl WireCodec {
    /// A codec speaking the engine's protobuf encoding.
    pub fn protobuf() -> Self {
        Self {
            codec: ProtobufCodec,
        }
    }
}

impl<C: Codec> WireCodec<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Encodes `request` tagged with `id` into one frame.
    pub fn encode_request(
        &self,
        id: RequestId,
        request: &Request,
    ) -> Result<Vec<u8>, ProtocolError> {
        self.codec.encode(&request.to_wire(id))
    }

    /// Decodes one frame into the raw wire reply, without validating its
    /// body. Undecodable bytes are reported as a malformed response.
    pub fn decode_frame(&self, data: &[u8]) -> Result<wire::Response, ProtocolError> {
        self.codec.decode(data).map_err(|e| {
            ProtocolError::MalformedResponse(format!("undecodable frame: {}", e.reason()))
        })
    }

    /// Decodes and validates one frame as a reply of kind `expected`.
    pub fn decode_response(
        &self,
        data: &[u8],
        expected: ResponseType,
    ) -> Result<Response, ProtocolError> {
        Response::from_wire(self.decode_frame(data)?, expected)
    }

    /// Engine side: decodes one request frame.
    pub fn decode_request(&self, data: &[u8]) -> Result<wire::Request, ProtocolError> {
        self.codec.decode(data)
    }

    /// Engine side: encodes one reply frame.
    pub fn encode_response(
        &self,
        response: &wire::Response,
    ) -> Result<Vec<u8>, ProtocolError> {
        self.codec.encode(response)
    }
}
