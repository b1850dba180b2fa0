//! Connection lifecycle and request/response correlation for sc2link.
//!
//! This crate sits between the typed protocol and the raw transport. It
//! turns "send this request, give me its reply" into a safe operation over
//! a socket that may drop at any time:
//!
//! - [`ConnectionManager`] owns the single socket. It connects with a
//!   bounded retry budget and tears the old socket down before opening a
//!   new one.
//! - [`Correlator`] runs one task that takes calls in order, keeps at most
//!   one of them on the wire, and checks every reply's id against it.
//!
//! # Failure model
//!
//! | What happened                       | Caller sees                          | Socket      |
//! |-------------------------------------|--------------------------------------|-------------|
//! | socket dropped mid-call             | [`ChannelError::ConnectionLost`]     | reopened    |
//! | socket dropped between calls        | nothing                              | reopened    |
//! | request write failed outright       | nothing; sent once on a new socket   | reopened    |
//! | every connect attempt failed        | [`ChannelError::ChannelUnavailable`] | none        |
//! | reply id differs from the call's    | [`ChannelError::ProtocolDesync`]     | reopened    |
//! | reply missing a required field      | [`ChannelError::Protocol`]           | kept        |
//! | request larger than the frame limit | [`ChannelError::Transport`]          | kept        |
//!
//! A lost call is never resent. The engine may already have acted on it.

mod config;
mod correlator;
mod error;
mod manager;
mod state;

pub use config::{ChannelConfig, DEFAULT_PATH};
pub use correlator::Correlator;
pub use error::ChannelError;
pub use manager::ConnectionManager;
pub use state::{ChannelStats, ConnectionState, RetryBudget};
