//! Connection registry: the authoritative table of who is connected
//!
//! One optional streamer slot plus a map of admitted players. The
//! registry owns identity allocation and single-streamer enforcement;
//! it never sends or parses messages itself. Callers (the relay) hold
//! the lock and run all teardown side effects before releasing it.

use std::collections::HashMap;

use crate::connection::{ConnectionId, PeerSender, SlotEvent, SlotState};
use crate::protocol::PlayerId;

struct StreamerSlot {
    id: ConnectionId,
    conn: Box<dyn PeerSender>,
}

pub struct Registry {
    streamer: Option<StreamerSlot>,
    streamer_state: SlotState,
    players: HashMap<PlayerId, Box<dyn PeerSender>>,
    next_player_id: PlayerId,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            streamer: None,
            streamer_state: SlotState::Absent,
            players: HashMap::new(),
            next_player_id: PlayerId::FIRST,
        }
    }

    /// Atomically evict any current streamer and install a new one.
    ///
    /// Returns the evicted connection so the caller can close it. The
    /// outgoing slot runs its full close transition before the new
    /// admission, exactly as if the transport had disconnected it.
    pub fn install_streamer(
        &mut self,
        id: ConnectionId,
        conn: Box<dyn PeerSender>,
    ) -> Option<Box<dyn PeerSender>> {
        let evicted = self.streamer.replace(StreamerSlot { id, conn });
        if evicted.is_some() {
            self.streamer_state = self
                .streamer_state
                .step(SlotEvent::Close)
                .step(SlotEvent::TeardownComplete);
        }
        self.streamer_state = self.streamer_state.step(SlotEvent::Admit);
        evicted.map(|slot| slot.conn)
    }

    /// Clear the streamer slot in response to a close event from the
    /// given connection.
    ///
    /// Returns `None` without touching the slot when it is already
    /// empty (duplicate disconnect) or held by a different connection
    /// (close event from a superseded socket arriving late).
    pub fn close_streamer(&mut self, id: ConnectionId) -> Option<Box<dyn PeerSender>> {
        match &self.streamer {
            Some(slot) if slot.id == id => {
                self.streamer_state = self.streamer_state.step(SlotEvent::Close);
                let conn = self.streamer.take().map(|slot| slot.conn);
                self.streamer_state = self.streamer_state.step(SlotEvent::TeardownComplete);
                conn
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn has_streamer(&self) -> bool {
        debug_assert_eq!(
            self.streamer_state == SlotState::Admitted,
            self.streamer.is_some()
        );
        self.streamer.is_some()
    }

    #[must_use]
    pub fn streamer(&self) -> Option<&dyn PeerSender> {
        self.streamer.as_ref().map(|slot| slot.conn.as_ref())
    }

    /// Admit a player, allocating the next identity.
    ///
    /// Identities strictly increase for the process lifetime and are
    /// never reused, even after disconnects.
    pub fn insert_player(&mut self, conn: Box<dyn PeerSender>) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id = id.next();
        self.players.insert(id, conn);
        id
    }

    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&dyn PeerSender> {
        self.players.get(&id).map(Box::as_ref)
    }

    /// Remove a player entry. Removing an absent entry is a no-op.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Box<dyn PeerSender>> {
        self.players.remove(&id)
    }

    /// Remove every player entry, returning them for teardown.
    pub fn drain_players(&mut self) -> Vec<(PlayerId, Box<dyn PeerSender>)> {
        self.players.drain().collect()
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
