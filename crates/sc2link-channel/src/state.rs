//! Connection state machine and retry budget.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// The lifecycle state of the logical channel.
///
/// ```text
///              open attempt            success
/// Disconnected ───────────→ Connecting ───────→ Connected
///      ↑                     │    ↺ retry          │
///      └─── budget spent ────┘                     │
///      └────────────── socket error / close ───────┘ (then Connecting again)
///
/// any ── shutdown ──→ Closing ──→ Closed
/// ```
///
/// Owned by the [`ConnectionManager`](crate::ConnectionManager); everyone
/// else only observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
    /// Terminal. The channel has released its socket and will not reopen.
    Closed,
}

impl ConnectionState {
    /// Returns `true` once shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// RetryBudget
// ---------------------------------------------------------------------------

/// A bounded number of connection attempts.
///
/// Each attempt consumes one unit. A successful connect refills it; an
/// empty budget means the channel is unavailable until someone refills it
/// explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    max: u32,
    remaining: u32,
}

impl RetryBudget {
    pub fn new(max: u32) -> Self {
        Self {
            max,
            remaining: max,
        }
    }

    /// Takes one attempt from the budget. Returns `false` if none are left.
    pub fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    pub fn reset(&mut self) {
        self.remaining = self.max;
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Attempts consumed since the last refill.
    pub fn used(&self) -> u32 {
        self.max - self.remaining
    }
}

// ---------------------------------------------------------------------------
// ChannelStats
// ---------------------------------------------------------------------------

/// Counters describing what a channel has done so far.
#[derive(Debug, Default)]
pub struct ChannelStats {
    connect_attempts: AtomicU64,
    connects: AtomicU64,
    calls_dispatched: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ChannelStats {
    /// Connection attempts made, successful or not.
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts.load(Ordering::Relaxed)
    }

    /// Connections successfully established.
    pub fn connects(&self) -> u64 {
        self.connects.load(Ordering::Relaxed)
    }

    /// Requests written to a socket.
    pub fn calls_dispatched(&self) -> u64 {
        self.calls_dispatched.load(Ordering::Relaxed)
    }

    /// Requests currently awaiting a reply. Never more than one.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The highest `in_flight` value ever observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::Acquire)
    }

    pub(crate) fn record_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_connect(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn begin_call(&self) {
        self.calls_dispatched.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.max_in_flight.fetch_max(now, Ordering::AcqRel);
    }

    pub(crate) fn end_call(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
