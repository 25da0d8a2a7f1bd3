//! Relay facade: admission, message routing, and lifecycle handling
//!
//! All registry mutation happens inside synchronous critical sections
//! with no suspension points, so every event (admission, message,
//! disconnect) runs to completion before the next one is processed.
//! Sends are fire-and-forget pushes into per-connection outbound
//! queues; a send to a closed peer is logged at debug and ignored.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::connection::{ConnectionId, PeerRole, PeerSender};
use crate::protocol::{PlayerId, SignalMessage};
use crate::registry::Registry;

/// Outcome of admitting an accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Installed as the streamer. The token identifies this transport
    /// connection for its eventual close event.
    Streamer(ConnectionId),
    /// Admitted as a player with its assigned identity.
    Player(PlayerId),
    /// Rejected (no streamer available). The rejection notice has been
    /// queued and the connection closed; it never entered the registry.
    Rejected,
}

/// Shared handle to the signaling relay.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<Mutex<RelayInner>>,
}

struct RelayInner {
    registry: Registry,
    peer_connection_options: serde_json::Value,
    next_connection_id: ConnectionId,
}

impl RelayInner {
    fn allocate_connection_id(&mut self) -> ConnectionId {
        let id = self.next_connection_id;
        self.next_connection_id = id.next();
        id
    }
}

impl Relay {
    #[must_use]
    pub fn new(peer_connection_options: serde_json::Value) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RelayInner {
                registry: Registry::new(),
                peer_connection_options,
                next_connection_id: ConnectionId::first(),
            })),
        }
    }

    /// Admit an accepted connection under its declared role.
    ///
    /// Exactly one admission call is made per accepted connection; the
    /// caller routes subsequent events according to the returned
    /// [`Admission`].
    pub fn accept(&self, role: PeerRole, conn: Box<dyn PeerSender>) -> Admission {
        match role {
            PeerRole::Streamer => self.admit_streamer(conn),
            PeerRole::Player => self.admit_player(conn),
        }
    }

    fn admit_streamer(&self, conn: Box<dyn PeerSender>) -> Admission {
        let mut inner = self.inner.lock();
        let id = inner.allocate_connection_id();
        if let Some(old) = inner.registry.install_streamer(id, conn) {
            info!("closing existing streamer connection, superseded");
            old.close();
            for (player_id, player) in inner.registry.drain_players() {
                debug!(player = %player_id, "dropping player of superseded streamer");
                player.close();
            }
        }
        info!(connection = %id, "streamer connected");
        Admission::Streamer(id)
    }

    fn admit_player(&self, conn: Box<dyn PeerSender>) -> Admission {
        let mut inner = self.inner.lock();

        // Hard precondition: a player may exist only while a streamer does
        if !inner.registry.has_streamer() {
            info!("rejecting player: streamer not available");
            send_or_log(
                conn.as_ref(),
                &SignalMessage::Error {
                    message: "Streamer not available".to_string(),
                },
            );
            conn.close();
            return Admission::Rejected;
        }

        let player_id = inner.registry.insert_player(conn);
        let peer_connection_options = inner.peer_connection_options.clone();
        if let Some(player) = inner.registry.player(player_id) {
            send_or_log(
                player,
                &SignalMessage::Config {
                    player_id,
                    peer_connection_options,
                },
            );
        }
        if let Some(streamer) = inner.registry.streamer() {
            send_or_log(streamer, &SignalMessage::PlayerConnected { player_id });
        }
        info!(
            player = %player_id,
            total = inner.registry.player_count(),
            "player connected"
        );
        Admission::Player(player_id)
    }

    /// Route a message from the streamer to its addressed player.
    ///
    /// A message for a player that is no longer registered is dropped
    /// silently: the player disconnecting while the message was in
    /// flight is an expected race, not an error.
    pub fn on_streamer_message(&self, text: &str) {
        let message = match SignalMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("dropping streamer message: {e}");
                return;
            }
        };

        let inner = self.inner.lock();
        let Some(target) = message.player_id() else {
            debug!(
                msg_type = message.type_name(),
                "streamer message carries no target player, dropping"
            );
            return;
        };
        match inner.registry.player(target) {
            Some(player) => {
                debug!(msg_type = message.type_name(), player = %target, "streamer -> player");
                send_or_log(player, &message);
            }
            None => {
                debug!(player = %target, "dropping streamer message for absent player");
            }
        }
    }

    /// Route a message from a player to the streamer.
    ///
    /// The origin identity is stamped with the sender's assigned id,
    /// overwriting whatever the player claimed, so the streamer can
    /// always attribute inbound messages correctly.
    pub fn on_player_message(&self, id: PlayerId, text: &str) {
        let mut message = match SignalMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(player = %id, "dropping player message: {e}");
                return;
            }
        };
        message.set_player_id(id);

        let inner = self.inner.lock();
        match inner.registry.streamer() {
            Some(streamer) => {
                debug!(msg_type = message.type_name(), player = %id, "player -> streamer");
                send_or_log(streamer, &message);
            }
            None => {
                debug!(player = %id, "dropping player message: no streamer");
            }
        }
    }

    /// Handle the streamer's transport close (or error, which takes the
    /// same transition).
    ///
    /// Tears down every admitted player: no player may outlive the
    /// streamer it was admitted against. A close from a superseded
    /// connection, or a duplicate close, is a no-op.
    pub fn on_streamer_closed(&self, id: ConnectionId) {
        let mut inner = self.inner.lock();
        let Some(streamer) = inner.registry.close_streamer(id) else {
            return;
        };
        streamer.close();
        let players = inner.registry.drain_players();
        info!(
            connection = %id,
            players = players.len(),
            "streamer disconnected, dropping players"
        );
        for (_, player) in players {
            player.close();
        }
    }

    /// Handle a player's transport close (or error).
    ///
    /// Duplicate closes are no-ops; the streamer is notified once.
    pub fn on_player_closed(&self, id: PlayerId) {
        let mut inner = self.inner.lock();
        let Some(player) = inner.registry.remove_player(id) else {
            return;
        };
        player.close();
        info!(
            player = %id,
            remaining = inner.registry.player_count(),
            "player disconnected"
        );
        if let Some(streamer) = inner.registry.streamer() {
            send_or_log(streamer, &SignalMessage::PlayerDisconnected { player_id: id });
        }
    }

    /// Whether a streamer is currently connected (health reporting).
    #[must_use]
    pub fn has_streamer(&self) -> bool {
        self.inner.lock().registry.has_streamer()
    }

    /// Number of currently admitted players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.inner.lock().registry.player_count()
    }
}

fn send_or_log(peer: &dyn PeerSender, message: &SignalMessage) {
    if let Err(e) = peer.send(message) {
        debug!(msg_type = message.type_name(), "send failed: {e}");
    }
}
