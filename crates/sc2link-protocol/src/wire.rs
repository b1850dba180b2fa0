//! The engine's wire schema.
//!
//! These are the s2clientprotocol messages this client speaks, declared
//! with `prost` so they encode to exactly the bytes the engine expects on
//! `/sc2api`. Field numbers are the engine's. Every scalar is `optional`
//! (proto2), so an absent field reads back as the schema default through
//! the generated getter (`resp.status()`, `ping.data_build()`), and
//! repeated fields are plain vectors where absent means empty.
//!
//! Only the parts of the schema this client uses are declared; fields the
//! engine sends that are not listed here are skipped on decode.
//!
//! Callers normally never touch this module directly: [`crate::Request`]
//! lowers itself into a [`Request`] here, and [`crate::Response`] is
//! validated out of a [`Response`]. Fake engines in tests use it the other
//! way round.
//!
//! ```text
//! Request  { request: oneof 1..=20, id: 97 }
//! Response { response: oneof 1..=20, id: 97, error: 98, status: 99 }
//! ```
//!
//! The structs also derive serde so the optional bincode and JSON codecs
//! can carry them.

use serde::{Deserialize, Serialize};

use crate::types::{
    CreateGameError, Difficulty, GameStatus, JoinGameError, PlayerType, Race,
    TestProcess,
};

/// A message with no fields, used for every request and reply that carries
/// nothing but its kind.
#[derive(Clone, Copy, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct Empty {}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct Request {
    #[prost(oneof = "RequestBody", tags = "1, 2, 5, 6, 7, 8, 9, 12, 19, 20")]
    #[serde(default)]
    pub request: Option<RequestBody>,
    #[prost(uint32, optional, tag = "97")]
    #[serde(default)]
    pub id: Option<u32>,
}

#[derive(Clone, PartialEq, prost::Oneof, Serialize, Deserialize)]
pub enum RequestBody {
    #[prost(message, tag = "1")]
    CreateGame(CreateGame),
    #[prost(message, tag = "2")]
    JoinGame(JoinGame),
    #[prost(message, tag = "5")]
    LeaveGame(Empty),
    #[prost(message, tag = "6")]
    QuickSave(Empty),
    #[prost(message, tag = "7")]
    QuickLoad(Empty),
    #[prost(message, tag = "8")]
    Quit(Empty),
    #[prost(message, tag = "9")]
    GameInfo(Empty),
    #[prost(message, tag = "12")]
    Step(Step),
    #[prost(message, tag = "19")]
    Ping(Empty),
    #[prost(message, tag = "20")]
    Debug(DebugRequest),
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct CreateGame {
    #[prost(oneof = "Map", tags = "1, 2")]
    #[serde(default)]
    pub map: Option<Map>,
    #[prost(message, repeated, tag = "3")]
    #[serde(default)]
    pub player_setup: Vec<PlayerSetup>,
    #[prost(bool, optional, tag = "4")]
    #[serde(default)]
    pub disable_fog: Option<bool>,
    #[prost(uint32, optional, tag = "5")]
    #[serde(default)]
    pub random_seed: Option<u32>,
    #[prost(bool, optional, tag = "6")]
    #[serde(default)]
    pub realtime: Option<bool>,
}

#[derive(Clone, PartialEq, prost::Oneof, Serialize, Deserialize)]
pub enum Map {
    #[prost(message, tag = "1")]
    LocalMap(LocalMap),
    #[prost(string, tag = "2")]
    BattlenetMapName(String),
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct LocalMap {
    #[prost(string, optional, tag = "1")]
    #[serde(default)]
    pub map_path: Option<String>,
    #[prost(bytes = "vec", optional, tag = "7")]
    #[serde(default)]
    pub map_data: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct PlayerSetup {
    #[prost(enumeration = "PlayerType", optional, tag = "1")]
    #[serde(default)]
    pub player_type: Option<i32>,
    #[prost(enumeration = "Race", optional, tag = "2")]
    #[serde(default)]
    pub race: Option<i32>,
    #[prost(enumeration = "Difficulty", optional, tag = "3")]
    #[serde(default)]
    pub difficulty: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct JoinGame {
    #[prost(oneof = "Participation", tags = "1, 2")]
    #[serde(default)]
    pub participation: Option<Participation>,
    #[prost(message, optional, tag = "3")]
    #[serde(default)]
    pub options: Option<InterfaceOptions>,
}

#[derive(Clone, PartialEq, prost::Oneof, Serialize, Deserialize)]
pub enum Participation {
    #[prost(enumeration = "Race", tag = "1")]
    Race(i32),
    #[prost(uint32, tag = "2")]
    ObservedPlayerId(u32),
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct InterfaceOptions {
    #[prost(bool, optional, tag = "1")]
    #[serde(default)]
    pub raw: Option<bool>,
    #[prost(bool, optional, tag = "2")]
    #[serde(default)]
    pub score: Option<bool>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct Step {
    #[prost(uint32, optional, tag = "1")]
    #[serde(default)]
    pub count: Option<u32>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct DebugRequest {
    #[prost(message, repeated, tag = "1")]
    #[serde(default)]
    pub debug: Vec<DebugCommand>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct DebugCommand {
    #[prost(oneof = "DebugCommandKind", tags = "5")]
    #[serde(default)]
    pub command: Option<DebugCommandKind>,
}

#[derive(Clone, PartialEq, prost::Oneof, Serialize, Deserialize)]
pub enum DebugCommandKind {
    #[prost(message, tag = "5")]
    TestProcess(DebugTestProcess),
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct DebugTestProcess {
    #[prost(enumeration = "TestProcess", optional, tag = "1")]
    #[serde(default)]
    pub test: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    #[serde(default)]
    pub delay_ms: Option<i32>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct Response {
    #[prost(oneof = "ResponseBody", tags = "1, 2, 5, 6, 7, 8, 9, 12, 19, 20")]
    #[serde(default)]
    pub response: Option<ResponseBody>,
    #[prost(uint32, optional, tag = "97")]
    #[serde(default)]
    pub id: Option<u32>,
    /// Engine-level errors, e.g. a request sent in the wrong game state.
    #[prost(string, repeated, tag = "98")]
    #[serde(default)]
    pub error: Vec<String>,
    #[prost(enumeration = "GameStatus", optional, tag = "99")]
    #[serde(default)]
    pub status: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Oneof, Serialize, Deserialize)]
pub enum ResponseBody {
    #[prost(message, tag = "1")]
    CreateGame(ResponseCreateGame),
    #[prost(message, tag = "2")]
    JoinGame(ResponseJoinGame),
    #[prost(message, tag = "5")]
    LeaveGame(Empty),
    #[prost(message, tag = "6")]
    QuickSave(Empty),
    #[prost(message, tag = "7")]
    QuickLoad(Empty),
    #[prost(message, tag = "8")]
    Quit(Empty),
    #[prost(message, tag = "9")]
    GameInfo(ResponseGameInfo),
    #[prost(message, tag = "12")]
    Step(ResponseStep),
    #[prost(message, tag = "19")]
    Ping(ResponsePing),
    #[prost(message, tag = "20")]
    Debug(Empty),
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct ResponseCreateGame {
    #[prost(enumeration = "CreateGameError", optional, tag = "1")]
    #[serde(default)]
    pub error: Option<i32>,
    #[prost(string, optional, tag = "2")]
    #[serde(default)]
    pub error_details: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct ResponseJoinGame {
    #[prost(uint32, optional, tag = "1")]
    #[serde(default)]
    pub player_id: Option<u32>,
    #[prost(enumeration = "JoinGameError", optional, tag = "2")]
    #[serde(default)]
    pub error: Option<i32>,
    #[prost(string, optional, tag = "3")]
    #[serde(default)]
    pub error_details: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct ResponseGameInfo {
    #[prost(string, optional, tag = "1")]
    #[serde(default)]
    pub map_name: Option<String>,
    #[prost(string, repeated, tag = "6")]
    #[serde(default)]
    pub mod_names: Vec<String>,
    #[prost(string, optional, tag = "2")]
    #[serde(default)]
    pub local_map_path: Option<String>,
    #[prost(message, repeated, tag = "3")]
    #[serde(default)]
    pub player_info: Vec<PlayerInfo>,
    #[prost(message, optional, tag = "5")]
    #[serde(default)]
    pub options: Option<InterfaceOptions>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct PlayerInfo {
    #[prost(uint32, optional, tag = "1")]
    #[serde(default)]
    pub player_id: Option<u32>,
    #[prost(enumeration = "PlayerType", optional, tag = "2")]
    #[serde(default)]
    pub player_type: Option<i32>,
    #[prost(enumeration = "Race", optional, tag = "3")]
    #[serde(default)]
    pub race_requested: Option<i32>,
    #[prost(enumeration = "Race", optional, tag = "4")]
    #[serde(default)]
    pub race_actual: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct ResponseStep {
    #[prost(uint32, optional, tag = "1")]
    #[serde(default)]
    pub simulation_loop: Option<u32>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct ResponsePing {
    #[prost(string, optional, tag = "1")]
    #[serde(default)]
    pub game_version: Option<String>,
    #[prost(string, optional, tag = "2")]
    #[serde(default)]
    pub data_version: Option<String>,
    #[prost(uint32, optional, tag = "3")]
    #[serde(default)]
    pub data_build: Option<u32>,
    #[prost(uint32, optional, tag = "4")]
    #[serde(default)]
    pub base_build: Option<u32>,
}

impl Response {
    /// A reply echoing `id` with the given body and status `Launched`.
    /// Handy for fake engines.
    pub fn reply(id: Option<u32>, body: ResponseBody) -> Self {
        Self {
            response: Some(body),
            id,
            error: Vec::new(),
            status: Some(GameStatus::Launched.into()),
        }
    }
}

impl From<crate::types::InterfaceOptions> for InterfaceOptions {
    fn from(o: crate::types::InterfaceOptions) -> Self {
        Self {
            raw: Some(o.raw),
            score: Some(o.score),
        }
    }
}

impl From<InterfaceOptions> for crate::types::InterfaceOptions {
    fn from(o: InterfaceOptions) -> Self {
        Self {
            raw: o.raw(),
            score: o.score(),
        }
    }
}

/// Reads an optional enumeration field. Values the engine added after
/// this client was built read as absent.
pub(crate) fn enumeration<E: TryFrom<i32>>(value: Option<i32>) -> Option<E> {
    value.and_then(|v| E::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_ping_request_matches_engine_bytes() {
        let req = Request {
            request: Some(RequestBody::Ping(Empty {})),
            id: Some(1),
        };
        assert_eq!(req.encode_to_vec(), [0x9a, 0x01, 0x00, 0x88, 0x06, 0x01]);
    }

    #[test]
    fn test_absent_scalars_read_as_schema_defaults() {
        let resp = Response::decode(&[][..]).unwrap();
        assert_eq!(resp.id(), 0);
        assert_eq!(resp.status(), GameStatus::Launched);
        assert!(resp.error.is_empty());
        assert!(resp.response.is_none());
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        // ResponsePing with an extra field 9 (varint 5) the schema does not list.
        let bytes = [0x18, 0x07, 0x48, 0x05];
        let ping = ResponsePing::decode(&bytes[..]).unwrap();
        assert_eq!(ping.data_build, Some(7));
    }

    #[test]
    fn test_unknown_enum_value_reads_as_absent() {
        assert_eq!(enumeration::<Race>(Some(42)), None);
        assert_eq!(enumeration::<Race>(Some(2)), Some(Race::Zerg));
        assert_eq!(enumeration::<Race>(None), None);
    }

    #[test]
    fn test_interface_options_default_to_off() {
        let opts: crate::types::InterfaceOptions = InterfaceOptions::default().into();
        assert!(!opts.raw);
        assert!(!opts.score);
    }
}
