//! Value types shared by requests, responses, and the wire schema.
//!
//! Everything here is a plain data holder. The engine enums carry the
//! engine's own numbering and double as `prost` enumerations for the wire
//! schema.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// The correlation identifier linking a request to its response.
///
/// Assigned by the channel, monotonically increasing from 1. `0` is what
/// a reply without an id decodes to, so it never matches a real request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RequestId(pub u32);

impl RequestId {
    /// The first id a channel hands out.
    pub const FIRST: RequestId = RequestId(1);

    /// Returns the id that follows this one, wrapping past `u32::MAX`
    /// back to [`RequestId::FIRST`].
    pub fn next(self) -> RequestId {
        match self.0.checked_add(1) {
            Some(n) => RequestId(n),
            None => Self::FIRST,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Engine enums
// ---------------------------------------------------------------------------

/// The engine's lifecycle status, reported on every response.
///
/// A reply that leaves the status out reads as `Launched`, the schema
/// default.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    prost::Enumeration, Serialize, Deserialize,
)]
#[repr(i32)]
pub enum GameStatus {
    Launched = 1,
    InitGame = 2,
    InGame = 3,
    InReplay = 4,
    Ended = 5,
    Quit = 6,
    Unknown = 99,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    prost::Enumeration, Serialize, Deserialize,
)]
#[repr(i32)]
pub enum Race {
    Terran = 1,
    Zerg = 2,
    Protoss = 3,
    Random = 4,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    prost::Enumeration, Serialize, Deserialize,
)]
#[repr(i32)]
pub enum Difficulty {
    VeryEasy = 1,
    Easy = 2,
    Medium = 3,
    MediumHard = 4,
    Hard = 5,
    Harder = 6,
    VeryHard = 7,
    CheatVision = 8,
    CheatMoney = 9,
    CheatInsane = 10,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    prost::Enumeration, Serialize, Deserialize,
)]
#[repr(i32)]
pub enum PlayerType {
    Participant = 1,
    Computer = 2,
    Observer = 3,
}

/// How the engine process should misbehave for a debug test request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    prost::Enumeration, Serialize, Deserialize,
)]
#[repr(i32)]
pub enum TestProcess {
    Hang = 1,
    Crash = 2,
    Exit = 3,
}

/// Why the engine refused to create a game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    prost::Enumeration, Serialize, Deserialize,
)]
#[repr(i32)]
pub enum CreateGameError {
    MissingMap = 1,
    InvalidMapPath = 2,
    InvalidMapData = 3,
    InvalidMapName = 4,
    InvalidMapHandle = 5,
    MissingPlayerSetup = 6,
    InvalidPlayerSetup = 7,
    MultiplayerUnsupported = 8,
}

/// Why the engine refused to join a game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    prost::Enumeration, Serialize, Deserialize,
)]
#[repr(i32)]
pub enum JoinGameError {
    MissingParticipation = 1,
    InvalidObservedPlayerId = 2,
    MissingOptions = 3,
    MissingPorts = 4,
    GameFull = 5,
    LaunchError = 6,
    FeatureUnsupported = 7,
    NoSpaceForUser = 8,
    MapDoesNotExist = 9,
    CannotOpenMap = 10,
    ChecksumError = 11,
    NetworkError = 12,
    OtherError = 13,
}

// ---------------------------------------------------------------------------
// Game setup
// ---------------------------------------------------------------------------

/// A map published on Battle.net, referenced by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BattlenetMap(pub String);

impl BattlenetMap {
    pub fn of(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// A map file on the engine's disk, optionally with its bytes inlined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalMap {
    pub path: PathBuf,
    pub data: Option<Vec<u8>>,
}

impl LocalMap {
    pub fn of(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: None,
        }
    }

    /// Ships the map contents along with the path.
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(data);
        self
    }
}

/// One slot in a game being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerSetup {
    pub player_type: PlayerType,
    pub race: Option<Race>,
    pub difficulty: Option<Difficulty>,
}

impl PlayerSetup {
    pub fn participant() -> Self {
        Self {
            player_type: PlayerType::Participant,
            race: None,
            difficulty: None,
        }
    }

    pub fn observer() -> Self {
        Self {
            player_type: PlayerType::Observer,
            race: None,
            difficulty: None,
        }
    }

    /// A built-in AI opponent.
    pub fn computer(race: Race, difficulty: Difficulty) -> Self {
        Self {
            player_type: PlayerType::Computer,
            race: Some(race),
            difficulty: Some(difficulty),
        }
    }
}

/// Which data interfaces the engine should expose to this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InterfaceOptions {
    pub raw: bool,
    pub score: bool,
}

impl InterfaceOptions {
    pub fn raw() -> Self {
        Self {
            raw: true,
            score: false,
        }
    }

    pub fn with_score(mut self) -> Self {
        self.score = true;
        self
    }
}

/// A player as described by a game info reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerInfo {
    pub player_id: u32,
    pub player_type: Option<PlayerType>,
    pub race_requested: Option<Race>,
    pub race_actual: Option<Race>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_next_increments() {
        assert_eq!(RequestId::FIRST.next(), RequestId(2));
    }

    #[test]
    fn test_request_id_next_wraps_past_zero() {
        assert_eq!(RequestId(u32::MAX).next(), RequestId::FIRST);
    }

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId(7).to_string(), "#7");
    }

    #[test]
    fn test_enums_use_engine_numbering() {
        assert_eq!(i32::from(GameStatus::Unknown), 99);
        assert_eq!(i32::from(Race::Random), 4);
        assert_eq!(Difficulty::try_from(10), Ok(Difficulty::CheatInsane));
        assert_eq!(GameStatus::default(), GameStatus::Launched);
    }

    #[test]
    fn test_computer_setup_carries_race_and_difficulty() {
        let setup = PlayerSetup::computer(Race::Zerg, Difficulty::Hard);
        assert_eq!(setup.player_type, PlayerType::Computer);
        assert_eq!(setup.race, Some(Race::Zerg));
        assert_eq!(setup.difficulty, Some(Difficulty::Hard));
    }

    #[test]
    fn test_local_map_with_data() {
        let map = LocalMap::of("maps/Simple64.SC2Map").with_data(vec![1, 2]);
        assert_eq!(map.path, PathBuf::from("maps/Simple64.SC2Map"));
        assert_eq!(map.data, Some(vec![1, 2]));
    }
}
