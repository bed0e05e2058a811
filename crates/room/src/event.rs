//! Typed room events.
//!
//! Every event name maps to exactly one [`RoomEvent`] variant, so listeners
//! match on the payload instead of guessing its shape.

use std::fmt;
use std::str::FromStr;

use majlis_eventbus::Event;
use majlis_telemetry::{ActivitySample, ParticipantId, QualitySample};
use serde::{Deserialize, Serialize};

use crate::error::RoomError;

/// Connection state of a [`RoomClient`](crate::RoomClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    /// No session.
    #[default]
    Disconnected,
    /// `join` is waiting out the simulated connect delay.
    Connecting,
    /// Session active, telemetry flowing.
    Connected,
}

impl ConnectionState {
    /// Upper-case state name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event names a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// Speaking activity samples.
    Activity,
    /// Network quality samples.
    Quality,
    /// Session lifecycle transitions.
    ConnectionStateChange,
    /// A participant entered the room.
    UserJoined,
    /// A participant left the room.
    UserLeft,
    /// A participant started publishing audio.
    UserPublished,
    /// A participant stopped publishing audio.
    UserUnpublished,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Activity,
        Self::Quality,
        Self::ConnectionStateChange,
        Self::UserJoined,
        Self::UserLeft,
        Self::UserPublished,
        Self::UserUnpublished,
    ];

    /// Wire name of the event.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Quality => "quality",
            Self::ConnectionStateChange => "connection-state-change",
            Self::UserJoined => "user-joined",
            Self::UserLeft => "user-left",
            Self::UserPublished => "user-published",
            Self::UserUnpublished => "user-unpublished",
        }
    }

    /// Roster kinds the client never emits itself; the roster owner
    /// publishes them through [`RoomClient::bus`](crate::RoomClient::bus).
    #[must_use]
    pub fn is_roster(self) -> bool {
        matches!(
            self,
            Self::UserJoined | Self::UserLeft | Self::UserPublished | Self::UserUnpublished
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = RoomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| RoomError::UnknownEvent(s.to_owned()))
    }
}

/// Payload delivered to room listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum RoomEvent {
    /// One activity tick.
    Activity(ActivitySample),
    /// One quality tick.
    Quality(QualitySample),
    /// Lifecycle transition.
    ConnectionStateChange {
        /// State before the transition.
        previous: ConnectionState,
        /// State after the transition.
        current: ConnectionState,
    },
    /// A participant entered the room.
    UserJoined {
        /// Who joined.
        participant: ParticipantId,
    },
    /// A participant left the room.
    UserLeft {
        /// Who left.
        participant: ParticipantId,
    },
    /// A participant started publishing audio.
    UserPublished {
        /// Who is publishing.
        participant: ParticipantId,
    },
    /// A participant stopped publishing audio.
    UserUnpublished {
        /// Who stopped.
        participant: ParticipantId,
    },
}

impl Event for RoomEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            Self::Activity(_) => EventKind::Activity,
            Self::Quality(_) => EventKind::Quality,
            Self::ConnectionStateChange { .. } => EventKind::ConnectionStateChange,
            Self::UserJoined { .. } => EventKind::UserJoined,
            Self::UserLeft { .. } => EventKind::UserLeft,
            Self::UserPublished { .. } => EventKind::UserPublished,
            Self::UserUnpublished { .. } => EventKind::UserUnpublished,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("activity", EventKind::Activity)]
    #[case("quality", EventKind::Quality)]
    #[case("connection-state-change", EventKind::ConnectionStateChange)]
    #[case("user-joined", EventKind::UserJoined)]
    #[case("user-left", EventKind::UserLeft)]
    #[case("user-published", EventKind::UserPublished)]
    #[case("user-unpublished", EventKind::UserUnpublished)]
    fn event_names_parse(#[case] name: &str, #[case] kind: EventKind) {
        assert_eq!(name.parse::<EventKind>().unwrap(), kind);
        assert_eq!(kind.to_string(), name);
    }

    #[test]
    fn unknown_event_name_is_rejected() {
        let err = "volume-indicator".parse::<EventKind>().unwrap_err();
        assert!(matches!(err, RoomError::UnknownEvent(ref name) if name == "volume-indicator"));
    }

    #[test]
    fn four_kinds_are_roster_kinds() {
        let roster: Vec<_> = EventKind::ALL.into_iter().filter(|k| k.is_roster()).collect();
        assert_eq!(roster.len(), 4);
        assert!(!EventKind::Activity.is_roster());
    }

    #[test]
    fn payload_kind_matches_variant() {
        let event = RoomEvent::ConnectionStateChange {
            previous: ConnectionState::Connecting,
            current: ConnectionState::Connected,
        };
        assert_eq!(event.kind(), EventKind::ConnectionStateChange);
        assert_eq!(
            RoomEvent::Activity(ActivitySample::default()).kind(),
            EventKind::Activity
        );
    }

    #[test]
    fn state_change_serializes_with_event_tag() {
        let event = RoomEvent::ConnectionStateChange {
            previous: ConnectionState::Disconnected,
            current: ConnectionState::Connecting,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "connection-state-change",
                "previous": "DISCONNECTED",
                "current": "CONNECTING",
            })
        );
    }
}
