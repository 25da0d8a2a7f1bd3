//! Wire protocol for the signaling channel
//!
//! Every message is a flat JSON object with a mandatory `type` tag.
//! Session descriptions and ICE candidates are opaque payloads: the
//! relay forwards them without interpreting their contents, and
//! unrecognized fields inside known message types survive forwarding.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Viewer identity assigned at admission.
///
/// Identities start at 1 and strictly increase for the lifetime of the
/// process; they are never reused, so a stale identity in an in-flight
/// message can never collide with a later connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(u32);

impl PlayerId {
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A session description exchanged between streamer and player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescription {
    pub sdp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An ICE candidate exchanged between streamer and player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Signaling message types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SignalMessage {
    /// Admission ack carrying the player's identity and negotiation options
    #[serde(rename_all = "camelCase")]
    Config {
        player_id: PlayerId,
        peer_connection_options: serde_json::Value,
    },
    /// New player admitted (server -> streamer)
    #[serde(rename_all = "camelCase")]
    PlayerConnected { player_id: PlayerId },
    /// Player left (server -> streamer)
    #[serde(rename_all = "camelCase")]
    PlayerDisconnected { player_id: PlayerId },
    /// Session description offer
    Offer(SessionDescription),
    /// Session description answer
    Answer(SessionDescription),
    /// ICE candidate exchange
    IceCandidate(IceCandidate),
    /// Admission rejected (server -> player)
    Error { message: String },
}

/// Tags accepted by [`SignalMessage::parse`]. Anything else is reported
/// as an unknown type rather than a malformed payload.
const KNOWN_TYPES: &[&str] = &[
    "config",
    "playerConnected",
    "playerDisconnected",
    "offer",
    "answer",
    "iceCandidate",
    "error",
];

impl SignalMessage {
    /// Parse an inbound envelope.
    ///
    /// Distinguishes unparseable payloads ([`Error::MalformedMessage`])
    /// from well-formed objects carrying an unrecognized `type` tag
    /// ([`Error::UnknownMessageType`]); the router drops both.
    pub fn parse(text: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| Error::MalformedMessage(e.to_string()))?;
        let ty = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| Error::MalformedMessage("missing \"type\" field".to_string()))?
            .to_string();

        serde_json::from_value(value).map_err(|e| {
            if KNOWN_TYPES.contains(&ty.as_str()) {
                Error::MalformedMessage(format!("{ty}: {e}"))
            } else {
                Error::UnknownMessageType(ty)
            }
        })
    }

    /// Serialize for the wire.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The wire-level `type` tag.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::PlayerConnected { .. } => "playerConnected",
            Self::PlayerDisconnected { .. } => "playerDisconnected",
            Self::Offer(_) => "offer",
            Self::Answer(_) => "answer",
            Self::IceCandidate(_) => "iceCandidate",
            Self::Error { .. } => "error",
        }
    }

    /// The player this message addresses or originates from, if any.
    #[must_use]
    pub fn player_id(&self) -> Option<PlayerId> {
        match self {
            Self::Config { player_id, .. }
            | Self::PlayerConnected { player_id }
            | Self::PlayerDisconnected { player_id } => Some(*player_id),
            Self::Offer(sdp) | Self::Answer(sdp) => sdp.player_id,
            Self::IceCandidate(candidate) => candidate.player_id,
            Self::Error { .. } => None,
        }
    }

    /// Stamp the originating player's identity, overwriting whatever the
    /// sender claimed. Used when relaying player messages to the
    /// streamer so attribution is always trustworthy.
    pub fn set_player_id(&mut self, id: PlayerId) {
        match self {
            Self::Config { player_id, .. }
            | Self::PlayerConnected { player_id }
            | Self::PlayerDisconnected { player_id } => *player_id = id,
            Self::Offer(sdp) | Self::Answer(sdp) => sdp.player_id = Some(id),
            Self::IceCandidate(candidate) => candidate.player_id = Some(id),
            Self::Error { .. } => {}
        }
    }
}
