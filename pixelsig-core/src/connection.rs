//! Connection abstractions shared by the registry and the transport
//!
//! The core never touches a socket directly: each accepted connection
//! is represented by a [`PeerSender`], the outbound half of the
//! transport. Sends are synchronous and fire-and-forget (the server
//! backs them with a channel drained by a writer task), which keeps
//! every registry critical section free of suspension points.

use std::fmt;

use crate::protocol::SignalMessage;
use crate::Result;

/// Outbound half of a signaling connection.
///
/// Owned exclusively by the registry entry that references it. `send`
/// fails (or is a no-op) once the connection is closed; `close` is
/// idempotent.
pub trait PeerSender: Send {
    fn send(&self, message: &SignalMessage) -> Result<()>;
    fn close(&self);
}

/// Role declared at connection establishment.
///
/// Derived from the `role` query parameter; no other authentication is
/// performed. Anything other than `role=streamer` (including absence or
/// garbage) is a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Streamer,
    Player,
}

impl PeerRole {
    #[must_use]
    pub fn from_query(role: Option<&str>) -> Self {
        match role {
            Some("streamer") => Self::Streamer,
            _ => Self::Player,
        }
    }
}

/// Token identifying one accepted transport connection.
///
/// Distinct from [`crate::PlayerId`]: player identities are protocol
/// visible, while connection ids exist so a close event arriving from a
/// superseded streamer socket can be told apart from a close of the
/// currently installed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub(crate) const fn first() -> Self {
        Self(1)
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a registered connection slot.
///
/// `Closing` never outlives a single event: teardown effects run to
/// completion before the next inbound event is processed, after which
/// the slot is `Absent` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Absent,
    Admitted,
    Closing,
}

/// Lifecycle events applied to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEvent {
    /// Admission completed (possibly evicting a predecessor first).
    Admit,
    /// Transport close, transport error, or forced supersession.
    /// All three take the same transition; the distinction is logged
    /// by the caller, not modeled here.
    Close,
    /// Teardown side effects have finished running.
    TeardownComplete,
}

impl SlotState {
    /// Pure lifecycle transition. Closing an absent slot stays absent,
    /// which is what makes duplicate disconnects no-ops.
    #[must_use]
    pub fn step(self, event: SlotEvent) -> Self {
        match (self, event) {
            (_, SlotEvent::Admit) => Self::Admitted,
            (Self::Admitted | Self::Closing, SlotEvent::Close) => Self::Closing,
            (Self::Absent, SlotEvent::Close) => Self::Absent,
            (Self::Closing, SlotEvent::TeardownComplete) => Self::Absent,
            (state, SlotEvent::TeardownComplete) => state,
        }
    }
}
