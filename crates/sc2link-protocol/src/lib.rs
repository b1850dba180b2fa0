//! Wire protocol for sc2link.
//!
//! This crate defines the "language" the client and the engine speak:
//!
//! - **Requests** ([`Request`] and its builders): typed commands.
//! - **Responses** ([`Response`], [`ResponseKind`]): typed, validated replies.
//! - **Wire schema** ([`wire`]): the exact shape that goes into a frame.
//! - **Codecs** ([`Codec`], [`ProtobufCodec`], [`WireCodec`]): how those
//!   shapes become bytes. Protobuf is what the engine speaks; bincode and
//!   JSON codecs sit behind the `bincode` and `json` features.
//! - **Errors** ([`ProtocolError`]): what can go wrong building, encoding,
//!   or decoding.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about sockets or retries. It only turns
//! one request into one frame and one frame into one response.
//!
//! ```text
//! Request ─→ wire::Request ─→ bytes ═══ engine ═══ bytes ─→ wire::Response ─→ Response
//! ```

mod codec;
mod error;
mod request;
mod response;
mod types;
pub mod wire;

pub use codec::{Codec, ProtobufCodec, WireCodec, WireMessage};
#[cfg(feature = "bincode")]
pub use codec::BincodeCodec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use request::{
    DebugTestProcess, DebugTestProcessBuilder, MapSource, Participation,
    Request, RequestCreateGame, RequestCreateGameBuilder, RequestJoinGame,
    RequestJoinGameBuilder,
};
pub use response::{
    Response, ResponseCreateGame, ResponseGameInfo, ResponseJoinGame,
    ResponseKind, ResponsePing, ResponseStep, ResponseType,
};
pub use types::{
    BattlenetMap, CreateGameError, Difficulty, GameStatus, InterfaceOptions,
    JoinGameError, LocalMap, PlayerInfo, PlayerSetup, PlayerType, Race,
    RequestId, TestProcess,
};
