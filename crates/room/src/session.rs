//! Session metadata.

use std::fmt;

use chrono::{DateTime, Utc};
use majlis_telemetry::{ParticipantId, RoomId};
use serde::{Deserialize, Serialize};

use crate::event::ConnectionState;

/// Role the local client plays in the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientRole {
    /// May publish audio.
    Host,
    /// Listen only.
    #[default]
    Audience,
}

impl fmt::Display for ClientRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Host => "host",
            Self::Audience => "audience",
        })
    }
}

/// One client's attachment to one room, from `join` to `leave`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Room joined.
    pub room_id: RoomId,
    /// Local participant.
    pub participant_id: ParticipantId,
    /// Current state; never `Disconnected` while the session exists.
    pub state: ConnectionState,
    /// When `join` was called.
    pub created_at: DateTime<Utc>,
    /// Role at the time of the snapshot.
    pub role: ClientRole,
    /// Whether local tracks are published.
    pub tracks_published: bool,
}

impl Session {
    pub(crate) fn connecting(
        room_id: RoomId,
        participant_id: ParticipantId,
        role: ClientRole,
    ) -> Self {
        Self {
            room_id,
            participant_id,
            state: ConnectionState::Connecting,
            created_at: Utc::now(),
            role,
            tracks_published: false,
        }
    }
}
