//! Typed responses and their validation out of the wire schema.
//!
//! [`Response::from_wire`] is the only way to build a [`Response`]. It
//! checks that the body is the variant the request asked for and that every
//! required field is present, and fails with
//! [`ProtocolError::MalformedResponse`] naming the first missing field.
//! Optional fields stay `Option`; nothing is filled in with a made-up
//! value. Repeated fields that the engine leaves out are empty, and the
//! status falls back to the schema default.

use std::fmt;
use std::time::SystemTime;

use crate::types::{
    CreateGameError, GameStatus, InterfaceOptions, JoinGameError, PlayerInfo,
    RequestId,
};
use crate::wire::enumeration;
use crate::{ProtocolError, wire};

/// Which kind of reply a request expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseType {
    CreateGame,
    JoinGame,
    LeaveGame,
    QuickSave,
    QuickLoad,
    Quit,
    GameInfo,
    Step,
    Ping,
    Debug,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateGame => "create game",
            Self::JoinGame => "join game",
            Self::LeaveGame => "leave game",
            Self::QuickSave => "quick save",
            Self::QuickLoad => "quick load",
            Self::Quit => "quit",
            Self::GameInfo => "game info",
            Self::Step => "step",
            Self::Ping => "ping",
            Self::Debug => "debug",
        };
        f.write_str(name)
    }
}

/// A decoded, validated reply from the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    id: RequestId,
    status: GameStatus,
    errors: Vec<String>,
    received_at: SystemTime,
    kind: ResponseKind,
}

/// The typed body of a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseKind {
    CreateGame(ResponseCreateGame),
    JoinGame(ResponseJoinGame),
    LeaveGame,
    QuickSave,
    QuickLoad,
    Quit,
    GameInfo(ResponseGameInfo),
    Step(ResponseStep),
    Ping(ResponsePing),
    Debug,
}

impl ResponseKind {
    pub fn response_type(&self) -> ResponseType {
        match self {
            Self::CreateGame(_) => ResponseType::CreateGame,
            Self::JoinGame(_) => ResponseType::JoinGame,
            Self::LeaveGame => ResponseType::LeaveGame,
            Self::QuickSave => ResponseType::QuickSave,
            Self::QuickLoad => ResponseType::QuickLoad,
            Self::Quit => ResponseType::Quit,
            Self::GameInfo(_) => ResponseType::GameInfo,
            Self::Step(_) => ResponseType::Step,
            Self::Ping(_) => ResponseType::Ping,
            Self::Debug => ResponseType::Debug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCreateGame {
    pub error: Option<CreateGameError>,
    pub error_details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseJoinGame {
    pub player_id: Option<u32>,
    pub error: Option<JoinGameError>,
    pub error_details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseGameInfo {
    pub map_name: String,
    pub mod_names: Vec<String>,
    pub local_map_path: Option<String>,
    pub players_info: Vec<PlayerInfo>,
    pub interface_options: InterfaceOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseStep {
    pub simulation_loop: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePing {
    pub game_version: String,
    pub data_version: String,
    pub data_build: u32,
    pub base_build: u32,
}

impl Response {
    /// Validates a wire reply against the variant the request expects.
    ///
    /// A missing `id` decodes as `RequestId(0)`, the wire default; the
    /// channel treats it as a mismatch.
    ///
    /// # Errors
    /// [`ProtocolError::MalformedResponse`] if the body is absent, is a
    /// different variant, or lacks a required field.
    pub fn from_wire(
        wire: wire::Response,
        expected: ResponseType,
    ) -> Result<Self, ProtocolError> {
        let missing = || {
            ProtocolError::MalformedResponse(format!(
                "provided argument doesn't have {expected} response"
            ))
        };
        let id = RequestId(wire.id());
        let status = wire.status();
        let body = wire.response.ok_or_else(missing)?;

        let kind = match (expected, body) {
            (ResponseType::CreateGame, wire::ResponseBody::CreateGame(r)) => {
                ResponseKind::CreateGame(ResponseCreateGame {
                    error: enumeration(r.error),
                    error_details: r.error_details,
                })
            }
            (ResponseType::JoinGame, wire::ResponseBody::JoinGame(r)) => {
                ResponseKind::JoinGame(ResponseJoinGame {
                    player_id: r.player_id,
                    error: enumeration(r.error),
                    error_details: r.error_details,
                })
            }
            (ResponseType::LeaveGame, wire::ResponseBody::LeaveGame(_)) => {
                ResponseKind::LeaveGame
            }
            (ResponseType::QuickSave, wire::ResponseBody::QuickSave(_)) => {
                ResponseKind::QuickSave
            }
            (ResponseType::QuickLoad, wire::ResponseBody::QuickLoad(_)) => {
                ResponseKind::QuickLoad
            }
            (ResponseType::Quit, wire::ResponseBody::Quit(_)) => ResponseKind::Quit,
            (ResponseType::GameInfo, wire::ResponseBody::GameInfo(r)) => {
                ResponseKind::GameInfo(game_info_from_wire(r)?)
            }
            (ResponseType::Step, wire::ResponseBody::Step(r)) => {
                ResponseKind::Step(ResponseStep {
                    simulation_loop: r.simulation_loop,
                })
            }
            (ResponseType::Ping, wire::ResponseBody::Ping(r)) => {
                ResponseKind::Ping(ping_from_wire(r)?)
            }
            (ResponseType::Debug, wire::ResponseBody::Debug(_)) => ResponseKind::Debug,
            _ => return Err(missing()),
        };

        Ok(Self {
            id,
            status,
            errors: wire.error,
            received_at: SystemTime::now(),
            kind,
        })
    }

    /// The correlation id echoed by the engine.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// The engine status. A reply without one reads as
    /// [`GameStatus::Launched`].
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Engine-level error strings. Empty on success.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Wall-clock time at which the reply was decoded.
    pub fn received_at(&self) -> SystemTime {
        self.received_at
    }

    pub fn kind(&self) -> &ResponseKind {
        &self.kind
    }

    pub fn into_kind(self) -> ResponseKind {
        self.kind
    }

    pub fn response_type(&self) -> ResponseType {
        self.kind.response_type()
    }
}

fn game_info_from_wire(
    r: wire::ResponseGameInfo,
) -> Result<ResponseGameInfo, ProtocolError> {
    let map_name = r.map_name.ok_or_else(|| ProtocolError::required("map name"))?;
    let interface_options = r
        .options
        .ok_or_else(|| ProtocolError::required("interface options"))?
        .into();
    if r.player_info.is_empty() {
        return Err(ProtocolError::required("players info"));
    }
    let players_info = r
        .player_info
        .into_iter()
        .map(|p| -> Result<PlayerInfo, ProtocolError> {
            Ok(PlayerInfo {
                player_id: p
                    .player_id
                    .ok_or_else(|| ProtocolError::required("player id"))?,
                player_type: enumeration(p.player_type),
                race_requested: enumeration(p.race_requested),
                race_actual: enumeration(p.race_actual),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResponseGameInfo {
        map_name,
        mod_names: r.mod_names,
        local_map_path: r.local_map_path,
        players_info,
        interface_options,
    })
}

fn ping_from_wire(r: wire::ResponsePing) -> Result<ResponsePing, ProtocolError> {
    Ok(ResponsePing {
        game_version: r
            .game_version
            .ok_or_else(|| ProtocolError::required("game version"))?,
        data_version: r
            .data_version
            .ok_or_else(|| ProtocolError::required("data version"))?,
        data_build: r
            .data_build
            .ok_or_else(|| ProtocolError::required("data build"))?,
        base_build: r
            .base_build
            .ok_or_else(|| ProtocolError::required("base build"))?,
    })
}
