//! Relay behavior tests driven through the public API
//!
//! A recording stub stands in for the WebSocket transport, so these
//! tests exercise admission, routing, and lifecycle handling without a
//! live listener.

use parking_lot::Mutex;
use std::sync::Arc;

use pixelsig_core::connection::{ConnectionId, PeerRole, PeerSender};
use pixelsig_core::protocol::{PlayerId, SignalMessage};
use pixelsig_core::relay::{Admission, Relay};

#[derive(Clone, Default)]
struct TestPeer {
    state: Arc<Mutex<TestPeerState>>,
}

#[derive(Default)]
struct TestPeerState {
    sent: Vec<SignalMessage>,
    closed: bool,
}

impl TestPeer {
    fn new() -> Self {
        Self::default()
    }

    fn boxed(&self) -> Box<dyn PeerSender> {
        Box::new(self.clone())
    }

    fn sent(&self) -> Vec<SignalMessage> {
        self.state.lock().sent.clone()
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl PeerSender for TestPeer {
    fn send(&self, message: &SignalMessage) -> pixelsig_core::Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(pixelsig_core::Error::ConnectionClosed);
        }
        state.sent.push(message.clone());
        Ok(())
    }

    fn close(&self) {
        self.state.lock().closed = true;
    }
}

fn ice_options() -> serde_json::Value {
    serde_json::json!({ "iceServers": [{ "urls": ["stun:stun.example.com:3478"] }] })
}

fn relay() -> Relay {
    Relay::new(ice_options())
}

fn connect_streamer(relay: &Relay) -> (TestPeer, ConnectionId) {
    let peer = TestPeer::new();
    match relay.accept(PeerRole::Streamer, peer.boxed()) {
        Admission::Streamer(id) => (peer, id),
        other => panic!("expected streamer admission, got {other:?}"),
    }
}

fn connect_player(relay: &Relay) -> (TestPeer, PlayerId) {
    let peer = TestPeer::new();
    match relay.accept(PeerRole::Player, peer.boxed()) {
        Admission::Player(id) => (peer, id),
        other => panic!("expected player admission, got {other:?}"),
    }
}

#[test]
fn test_player_admission_sends_config_and_notifies_streamer() {
    let relay = relay();
    let (streamer, _) = connect_streamer(&relay);
    let (player, id) = connect_player(&relay);

    assert_eq!(id, PlayerId::FIRST);
    assert_eq!(
        player.sent(),
        vec![SignalMessage::Config {
            player_id: PlayerId::FIRST,
            peer_connection_options: ice_options(),
        }]
    );
    assert_eq!(
        streamer.sent(),
        vec![SignalMessage::PlayerConnected {
            player_id: PlayerId::FIRST,
        }]
    );
}

#[test]
fn test_player_without_streamer_is_rejected_and_closed() {
    let relay = relay();
    let peer = TestPeer::new();

    let admission = relay.accept(PeerRole::Player, peer.boxed());

    assert_eq!(admission, Admission::Rejected);
    assert_eq!(
        peer.sent(),
        vec![SignalMessage::Error {
            message: "Streamer not available".to_string(),
        }]
    );
    assert!(peer.is_closed());
    assert_eq!(relay.player_count(), 0);
}

#[test]
fn test_streamer_message_reaches_only_addressed_player() {
    let relay = relay();
    let (_streamer, _) = connect_streamer(&relay);
    let (player1, _) = connect_player(&relay);
    let (player2, _) = connect_player(&relay);

    relay.on_streamer_message(r#"{"type":"offer","playerId":1,"sdp":"v=0 fake"}"#);

    let delivered = player1.sent();
    let offer = delivered.last().expect("player 1 should receive the offer");
    assert_eq!(offer.type_name(), "offer");
    assert_eq!(offer.player_id(), Some(PlayerId::FIRST));
    match offer {
        SignalMessage::Offer(sdp) => assert_eq!(sdp.sdp, "v=0 fake"),
        other => panic!("expected offer, got {other:?}"),
    }
    // player 2 only ever saw its admission config
    assert_eq!(player2.sent().len(), 1);
}

#[test]
fn test_player_disconnect_notifies_streamer_and_later_messages_drop() {
    let relay = relay();
    let (streamer, _) = connect_streamer(&relay);
    let (_player1, _) = connect_player(&relay);
    let (player2, id2) = connect_player(&relay);

    relay.on_player_closed(id2);

    assert!(streamer.sent().contains(&SignalMessage::PlayerDisconnected {
        player_id: id2,
    }));
    assert!(player2.is_closed());

    // Addressed to the departed player: silently dropped
    let before = streamer.sent().len();
    relay.on_streamer_message(r#"{"type":"offer","playerId":2,"sdp":"v=0"}"#);
    assert_eq!(streamer.sent().len(), before);
    assert_eq!(player2.sent().len(), 1);
}

#[test]
fn test_supersession_replaces_streamer_and_drops_players() {
    let relay = relay();
    let (old_streamer, old_id) = connect_streamer(&relay);
    let (player, _) = connect_player(&relay);

    let (new_streamer, _) = connect_streamer(&relay);

    assert!(old_streamer.is_closed());
    assert!(player.is_closed());
    assert_eq!(relay.player_count(), 0);
    assert!(relay.has_streamer());

    // The superseded socket's transport close arrives late; the
    // replacement must survive it.
    relay.on_streamer_closed(old_id);
    assert!(relay.has_streamer());

    // A fresh player admits against the new streamer
    let (fresh, fresh_id) = connect_player(&relay);
    assert_eq!(fresh_id.as_u32(), 2);
    assert_eq!(fresh.sent().len(), 1);
    assert!(new_streamer.sent().contains(&SignalMessage::PlayerConnected {
        player_id: fresh_id,
    }));
}

#[test]
fn test_streamer_disconnect_empties_player_map() {
    let relay = relay();
    let (_streamer, streamer_id) = connect_streamer(&relay);
    let (player1, _) = connect_player(&relay);
    let (player2, _) = connect_player(&relay);

    relay.on_streamer_closed(streamer_id);

    assert!(!relay.has_streamer());
    assert_eq!(relay.player_count(), 0);
    assert!(player1.is_closed());
    assert!(player2.is_closed());

    // Duplicate close is a no-op
    relay.on_streamer_closed(streamer_id);
    assert!(!relay.has_streamer());
}

#[test]
fn test_duplicate_player_disconnect_notifies_once() {
    let relay = relay();
    let (streamer, _) = connect_streamer(&relay);
    let (_player, id) = connect_player(&relay);

    relay.on_player_closed(id);
    relay.on_player_closed(id);

    let notifications = streamer
        .sent()
        .iter()
        .filter(|m| matches!(m, SignalMessage::PlayerDisconnected { .. }))
        .count();
    assert_eq!(notifications, 1);
}

#[test]
fn test_player_ids_increase_across_reconnect_cycles() {
    let relay = relay();
    let (_streamer, _) = connect_streamer(&relay);

    let mut last = 0;
    for _ in 0..5 {
        let (_peer, id) = connect_player(&relay);
        assert!(id.as_u32() > last);
        last = id.as_u32();
        relay.on_player_closed(id);
    }
    assert_eq!(last, 5);
}

#[test]
fn test_player_origin_is_stamped_over_claimed_identity() {
    let relay = relay();
    let (streamer, _) = connect_streamer(&relay);
    let (_player, id) = connect_player(&relay);

    relay.on_player_message(id, r#"{"type":"answer","playerId":999,"sdp":"v=0"}"#);

    let answer = streamer.sent().last().cloned().expect("streamer should receive the answer");
    assert_eq!(answer.type_name(), "answer");
    assert_eq!(answer.player_id(), Some(id));
}

#[test]
fn test_malformed_and_unknown_messages_are_dropped_without_closing() {
    let relay = relay();
    let (streamer, _) = connect_streamer(&relay);
    let (_player, id) = connect_player(&relay);

    relay.on_player_message(id, "garbage {{{");
    relay.on_player_message(id, r#"{"type":"selfDestruct"}"#);
    relay.on_player_message(id, r#"{"sdp":"v=0"}"#);
    assert_eq!(streamer.sent().len(), 1); // only the admission notice

    // The connection stays open and keeps routing
    relay.on_player_message(id, r#"{"type":"iceCandidate","candidate":{"candidate":"c"}}"#);
    assert_eq!(streamer.sent().len(), 2);
}

#[test]
fn test_streamer_message_without_target_is_dropped() {
    let relay = relay();
    let (_streamer, _) = connect_streamer(&relay);
    let (player, _) = connect_player(&relay);

    relay.on_streamer_message(r#"{"type":"offer","sdp":"v=0"}"#);
    assert_eq!(player.sent().len(), 1);
}

#[test]
fn test_player_message_after_streamer_left_is_dropped() {
    let relay = relay();
    let (_streamer, streamer_id) = connect_streamer(&relay);
    let (_player, id) = connect_player(&relay);

    relay.on_streamer_closed(streamer_id);

    // The player's socket task may still deliver a queued message
    relay.on_player_message(id, r#"{"type":"answer","sdp":"v=0"}"#);
    assert_eq!(relay.player_count(), 0);
}

#[test]
fn test_at_most_one_streamer_under_repeated_connects() {
    let relay = relay();
    let mut streamers = Vec::new();
    for _ in 0..4 {
        streamers.push(connect_streamer(&relay));
    }

    let (last, _) = streamers.last().cloned().expect("connected above");
    for (peer, _) in &streamers[..streamers.len() - 1] {
        assert!(peer.is_closed());
    }
    assert!(!last.is_closed());
    assert!(relay.has_streamer());
}
