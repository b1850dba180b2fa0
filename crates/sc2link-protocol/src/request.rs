//! Typed requests and their builders.
//!
//! A [`Request`] is an immutable command. Requests with required parts are
//! built through a builder whose `build()` checks every precondition and
//! fails with [`ProtocolError::InvalidArgument`] carrying the exact
//! precondition text, so a half-specified command can never reach the
//! wire.

use crate::response::ResponseType;
use crate::types::{
    BattlenetMap, InterfaceOptions, LocalMap, PlayerSetup, Race, RequestId,
    TestProcess,
};
use crate::{ProtocolError, wire};

/// A command for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    CreateGame(RequestCreateGame),
    JoinGame(RequestJoinGame),
    LeaveGame,
    QuickSave,
    QuickLoad,
    Quit,
    GameInfo,
    /// Advance the simulation by `count` game loops.
    Step { count: u32 },
    Ping,
    Debug(DebugTestProcess),
}

impl Request {
    /// The response variant the engine must answer this request with.
    pub fn response_type(&self) -> ResponseType {
        match self {
            Self::CreateGame(_) => ResponseType::CreateGame,
            Self::JoinGame(_) => ResponseType::JoinGame,
            Self::LeaveGame => ResponseType::LeaveGame,
            Self::QuickSave => ResponseType::QuickSave,
            Self::QuickLoad => ResponseType::QuickLoad,
            Self::Quit => ResponseType::Quit,
            Self::GameInfo => ResponseType::GameInfo,
            Self::Step { .. } => ResponseType::Step,
            Self::Ping => ResponseType::Ping,
            Self::Debug(_) => ResponseType::Debug,
        }
    }

    /// Lowers this request into the wire schema, tagged with `id`.
    pub fn to_wire(&self, id: RequestId) -> wire::Request {
        let body = match self {
            Self::CreateGame(r) => wire::RequestBody::CreateGame(r.to_wire()),
            Self::JoinGame(r) => wire::RequestBody::JoinGame(r.to_wire()),
            Self::LeaveGame => wire::RequestBody::LeaveGame(wire::Empty {}),
            Self::QuickSave => wire::RequestBody::QuickSave(wire::Empty {}),
            Self::QuickLoad => wire::RequestBody::QuickLoad(wire::Empty {}),
            Self::Quit => wire::RequestBody::Quit(wire::Empty {}),
            Self::GameInfo => wire::RequestBody::GameInfo(wire::Empty {}),
            Self::Step { count } => wire::RequestBody::Step(wire::Step {
                count: Some(*count),
            }),
            Self::Ping => wire::RequestBody::Ping(wire::Empty {}),
            Self::Debug(d) => wire::RequestBody::Debug(wire::DebugRequest {
                debug: vec![wire::DebugCommand {
                    command: Some(wire::DebugCommandKind::TestProcess(d.to_wire())),
                }],
            }),
        };
        wire::Request {
            request: Some(body),
            id: Some(id.0),
        }
    }
}

impl From<RequestCreateGame> for Request {
    fn from(r: RequestCreateGame) -> Self {
        Self::CreateGame(r)
    }
}

impl From<RequestJoinGame> for Request {
    fn from(r: RequestJoinGame) -> Self {
        Self::JoinGame(r)
    }
}

impl From<DebugTestProcess> for Request {
    fn from(d: DebugTestProcess) -> Self {
        Self::Debug(d)
    }
}

// ---------------------------------------------------------------------------
// CreateGame
// ---------------------------------------------------------------------------

/// Where the game should be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapSource {
    Battlenet(BattlenetMap),
    Local(LocalMap),
}

/// Asks the engine to create a new game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestCreateGame {
    map: MapSource,
    player_setups: Vec<PlayerSetup>,
    disable_fog: bool,
    realtime: bool,
    random_seed: Option<u32>,
}

impl RequestCreateGame {
    pub fn builder() -> RequestCreateGameBuilder {
        RequestCreateGameBuilder::default()
    }

    pub fn map(&self) -> &MapSource {
        &self.map
    }

    pub fn player_setups(&self) -> &[PlayerSetup] {
        &self.player_setups
    }

    pub fn is_disable_fog(&self) -> bool {
        self.disable_fog
    }

    pub fn is_realtime(&self) -> bool {
        self.realtime
    }

    pub fn random_seed(&self) -> Option<u32> {
        self.random_seed
    }

    fn to_wire(&self) -> wire::CreateGame {
        let map = match &self.map {
            MapSource::Battlenet(BattlenetMap(name)) => {
                wire::Map::BattlenetMapName(name.clone())
            }
            MapSource::Local(local) => wire::Map::LocalMap(wire::LocalMap {
                map_path: Some(local.path.to_string_lossy().into_owned()),
                map_data: local.data.clone(),
            }),
        };
        wire::CreateGame {
            map: Some(map),
            player_setup: self
                .player_setups
                .iter()
                .map(|s| wire::PlayerSetup {
                    player_type: Some(s.player_type.into()),
                    race: s.race.map(Into::into),
                    difficulty: s.difficulty.map(Into::into),
                })
                .collect(),
            disable_fog: Some(self.disable_fog),
            random_seed: self.random_seed,
            realtime: Some(self.realtime),
        }
    }
}

/// Builder for [`RequestCreateGame`].
///
/// The map is set with either [`on_battlenet_map`](Self::on_battlenet_map)
/// or [`on_local_map`](Self::on_local_map); whichever is called last wins.
#[derive(Debug, Clone, Default)]
pub struct RequestCreateGameBuilder {
    map: Option<MapSource>,
    player_setups: Vec<PlayerSetup>,
    disable_fog: bool,
    realtime: bool,
    random_seed: Option<u32>,
}

impl RequestCreateGameBuilder {
    pub fn on_battlenet_map(mut self, map: BattlenetMap) -> Self {
        self.map = Some(MapSource::Battlenet(map));
        self
    }

    pub fn on_local_map(mut self, map: LocalMap) -> Self {
        self.map = Some(MapSource::Local(map));
        self
    }

    /// Appends player slots. May be called more than once.
    pub fn with_player_setup(
        mut self,
        setups: impl IntoIterator<Item = PlayerSetup>,
    ) -> Self {
        self.player_setups.extend(setups);
        self
    }

    pub fn disable_fog(mut self) -> Self {
        self.disable_fog = true;
        self
    }

    pub fn realtime(mut self) -> Self {
        self.realtime = true;
        self
    }

    pub fn random_seed(mut self, seed: u32) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// # Errors
    /// - `"one of map data is required"` when no map was chosen
    /// - `"player setup must have at least one element"` when no slots
    ///   were added
    pub fn build(self) -> Result<RequestCreateGame, ProtocolError> {
        let map = self.map.ok_or_else(|| {
            ProtocolError::InvalidArgument("one of map data is required".into())
        })?;
        if self.player_setups.is_empty() {
            return Err(ProtocolError::InvalidArgument(
                "player setup must have at least one element".into(),
            ));
        }
        Ok(RequestCreateGame {
            map,
            player_setups: self.player_setups,
            disable_fog: self.disable_fog,
            realtime: self.realtime,
            random_seed: self.random_seed,
        })
    }
}

// ---------------------------------------------------------------------------
// JoinGame
// ---------------------------------------------------------------------------

/// How this client takes part in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participation {
    Player(Race),
    Observer { observed_player_id: u32 },
}

/// Asks the engine to join the game it created or is hosting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestJoinGame {
    participation: Participation,
    options: InterfaceOptions,
}

impl RequestJoinGame {
    pub fn builder() -> RequestJoinGameBuilder {
        RequestJoinGameBuilder::default()
    }

    pub fn participation(&self) -> Participation {
        self.participation
    }

    pub fn options(&self) -> InterfaceOptions {
        self.options
    }

    fn to_wire(&self) -> wire::JoinGame {
        let participation = match self.participation {
            Participation::Player(race) => wire::Participation::Race(race.into()),
            Participation::Observer { observed_player_id } => {
                wire::Participation::ObservedPlayerId(observed_player_id)
            }
        };
        wire::JoinGame {
            participation: Some(participation),
            options: Some(self.options.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestJoinGameBuilder {
    participation: Option<Participation>,
    options: Option<InterfaceOptions>,
}

impl RequestJoinGameBuilder {
    pub fn as_participant(mut self, race: Race) -> Self {
        self.participation = Some(Participation::Player(race));
        self
    }

    pub fn as_observer(mut self, observed_player_id: u32) -> Self {
        self.participation = Some(Participation::Observer { observed_player_id });
        self
    }

    pub fn with_options(mut self, options: InterfaceOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn build(self) -> Result<RequestJoinGame, ProtocolError> {
        let participation = self.participation.ok_or_else(|| {
            ProtocolError::InvalidArgument("participation is required".into())
        })?;
        let options = self.options.ok_or_else(|| {
            ProtocolError::InvalidArgument("interface options is required".into())
        })?;
        Ok(RequestJoinGame {
            participation,
            options,
        })
    }
}

// ---------------------------------------------------------------------------
// Debug
// ---------------------------------------------------------------------------

/// Makes the engine process hang, crash, or exit. Used to exercise
/// connection-loss handling against a real engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugTestProcess {
    test: TestProcess,
    delay_ms: i32,
}

impl DebugTestProcess {
    pub fn builder() -> DebugTestProcessBuilder {
        DebugTestProcessBuilder::default()
    }

    pub fn test(&self) -> TestProcess {
        self.test
    }

    pub fn delay_ms(&self) -> i32 {
        self.delay_ms
    }

    fn to_wire(self) -> wire::DebugTestProcess {
        wire::DebugTestProcess {
            test: Some(self.test.into()),
            delay_ms: Some(self.delay_ms),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DebugTestProcessBuilder {
    test: Option<TestProcess>,
    delay_ms: Option<i32>,
}

impl DebugTestProcessBuilder {
    pub fn with(mut self, test: TestProcess) -> Self {
        self.test = Some(test);
        self
    }

    pub fn delay_ms(mut self, delay_ms: i32) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    /// Fails with `"test is required"` if no test was chosen. An unset
    /// delay is sent as `0`.
    pub fn build(self) -> Result<DebugTestProcess, ProtocolError> {
        let test = self.test.ok_or_else(|| {
            ProtocolError::InvalidArgument("test is required".into())
        })?;
        Ok(DebugTestProcess {
            test,
            delay_ms: self.delay_ms.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, PlayerType};

    fn create_game() -> RequestCreateGameBuilder {
        RequestCreateGame::builder()
            .on_battlenet_map(BattlenetMap::of("Lava Flow"))
            .with_player_setup([
                PlayerSetup::participant(),
                PlayerSetup::computer(Race::Zerg, Difficulty::Easy),
            ])
    }

    #[test]
    fn test_create_game_requires_map() {
        let err = RequestCreateGame::builder()
            .with_player_setup([PlayerSetup::participant()])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidArgument("one of map data is required".into())
        );
    }

    #[test]
    fn test_create_game_requires_player_setup() {
        let err = RequestCreateGame::builder()
            .on_local_map(LocalMap::of("Simple64.SC2Map"))
            .build()
            .unwrap_err();
        assert_eq!(err.reason(), "player setup must have at least one element");
    }

    #[test]
    fn test_create_game_last_map_wins() {
        let req = create_game()
            .on_local_map(LocalMap::of("Simple64.SC2Map"))
            .build()
            .unwrap();
        assert!(matches!(req.map(), MapSource::Local(_)));

        let Some(wire::Map::LocalMap(local)) = req.to_wire().map else {
            panic!("expected a local map");
        };
        assert_eq!(local.map_path.as_deref(), Some("Simple64.SC2Map"));
    }

    #[test]
    fn test_create_game_serializes_all_fields() {
        let req = create_game()
            .disable_fog()
            .realtime()
            .random_seed(42)
            .build()
            .unwrap();

        let wire = Request::from(req).to_wire(RequestId(3));
        assert_eq!(wire.id, Some(3));
        let Some(wire::RequestBody::CreateGame(cg)) = wire.request else {
            panic!("expected create game body");
        };
        assert_eq!(
            cg.map,
            Some(wire::Map::BattlenetMapName("Lava Flow".into()))
        );
        assert_eq!(cg.disable_fog, Some(true));
        assert_eq!(cg.realtime, Some(true));
        assert_eq!(cg.random_seed, Some(42));
        assert_eq!(cg.player_setup.len(), 2);
        assert_eq!(cg.player_setup[1].player_type(), PlayerType::Computer);
        assert_eq!(cg.player_setup[1].difficulty(), Difficulty::Easy);
        assert_eq!(cg.player_setup[0].race, None);
    }

    #[test]
    fn test_create_game_flags_default_to_false() {
        let req = create_game().build().unwrap();
        let wire = req.to_wire();
        assert_eq!(wire.disable_fog, Some(false));
        assert_eq!(wire.realtime, Some(false));
        assert_eq!(wire.random_seed, None);
    }

    #[test]
    fn test_join_game_requires_participation_then_options() {
        let err = RequestJoinGame::builder().build().unwrap_err();
        assert_eq!(err.reason(), "participation is required");

        let err = RequestJoinGame::builder()
            .as_participant(Race::Protoss)
            .build()
            .unwrap_err();
        assert_eq!(err.reason(), "interface options is required");
    }

    #[test]
    fn test_join_game_as_observer() {
        let req = RequestJoinGame::builder()
            .as_observer(2)
            .with_options(InterfaceOptions::raw())
            .build()
            .unwrap();
        let wire = req.to_wire();
        assert_eq!(
            wire.participation,
            Some(wire::Participation::ObservedPlayerId(2))
        );
        assert_eq!(wire.options, Some(InterfaceOptions::raw().into()));
    }

    #[test]
    fn test_debug_test_process_requires_test() {
        let err = DebugTestProcess::builder().build().unwrap_err();
        assert_eq!(err.reason(), "test is required");
    }

    #[test]
    fn test_debug_test_process_default_delay_is_zero() {
        let d = DebugTestProcess::builder()
            .with(TestProcess::Exit)
            .build()
            .unwrap();
        let wire = d.to_wire();
        assert_eq!(wire.test(), TestProcess::Exit);
        assert_eq!(wire.delay_ms, Some(0));
    }

    #[test]
    fn test_debug_request_wraps_one_test_process_command() {
        let d = DebugTestProcess::builder()
            .with(TestProcess::Hang)
            .delay_ms(250)
            .build()
            .unwrap();
        let wire = Request::from(d).to_wire(RequestId(1));
        let Some(wire::RequestBody::Debug(debug)) = wire.request else {
            panic!("expected debug body");
        };
        assert_eq!(debug.debug.len(), 1);
        let Some(wire::DebugCommandKind::TestProcess(tp)) = &debug.debug[0].command
        else {
            panic!("expected test process command");
        };
        assert_eq!(tp.delay_ms, Some(250));
    }

    #[test]
    fn test_response_type_matches_request() {
        assert_eq!(Request::Ping.response_type(), ResponseType::Ping);
        assert_eq!(
            Request::Step { count: 2 }.response_type(),
            ResponseType::Step
        );
        assert_eq!(Request::GameInfo.response_type(), ResponseType::GameInfo);
    }
}
