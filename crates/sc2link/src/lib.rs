//! # sc2link
//!
//! Async client for the SC2 engine API.
//!
//! sc2link keeps one WebSocket open to the engine and lets any number of
//! tasks share it. Requests are sent one at a time in the order they were
//! made, every reply is checked against the request it answers, and a
//! dropped socket is reopened within a bounded retry budget.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sc2link::prelude::*;
//!
//! # async fn run() -> Result<(), S2Error> {
//! let client = S2Client::builder().host("127.0.0.1").port(8167).build();
//!
//! let create = RequestCreateGame::builder()
//!     .on_battlenet_map(BattlenetMap::of("Lava Flow"))
//!     .with_player_setup([
//!         PlayerSetup::participant(),
//!         PlayerSetup::computer(Race::Zerg, Difficulty::Easy),
//!     ])
//!     .build()?;
//! client.call(create).await?;
//!
//! let info = client.game_info().await?;
//! println!("playing on {}", info.map_name);
//!
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Crate | What it does |
//! |---|---|
//! | `sc2link-transport` | one message-framed socket (WebSocket or in-memory) |
//! | `sc2link-protocol` | typed requests and responses, wire schema, codecs |
//! | `sc2link-channel` | connection lifecycle, retry, request/reply correlation |

mod client;
mod error;

pub use client::{S2Client, S2ClientBuilder};
pub use error::S2Error;

pub use sc2link_channel as channel;
pub use sc2link_protocol as protocol;
pub use sc2link_transport as transport;

/// Everything needed to build a client and issue requests.
pub mod prelude {
    pub use crate::{S2Client, S2ClientBuilder, S2Error};
    pub use sc2link_channel::{ChannelConfig, ChannelError, ConnectionState};
    pub use sc2link_protocol::{
        BattlenetMap, DebugTestProcess, Difficulty, GameStatus,
        InterfaceOptions, LocalMap, PlayerInfo, PlayerSetup, PlayerType,
        ProtocolError, Race, Request, RequestCreateGame, RequestJoinGame,
        Response, ResponseKind, TestProcess,
    };
    pub use sc2link_transport::TransportError;
}
