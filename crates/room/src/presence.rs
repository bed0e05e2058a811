//! Per-participant presence folded from room events.
//!
//! [`PresenceBoard`] is the state a participant grid renders: volume,
//! speaking flag, network grade and publishing flag for each displayed
//! participant. It only tracks participants it was told about; samples
//! naming anyone else are ignored.

use std::sync::Arc;

use indexmap::IndexMap;
use majlis_eventbus::{EventBus, Subscription};
use majlis_telemetry::{ActivityLevel, NetworkQuality, ParticipantId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::event::{ConnectionState, EventKind, RoomEvent};

/// What the board knows about one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParticipantPresence {
    /// Last reported activity level.
    pub level: ActivityLevel,
    /// Last reported network grade; `UNKNOWN` until the first sample.
    pub quality: NetworkQuality,
    /// Whether the participant is publishing audio.
    pub publishing: bool,
}

impl ParticipantPresence {
    /// Whether the last level crosses the speaking threshold.
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.level.is_speaking()
    }
}

/// Presence for a set of displayed participants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceBoard {
    participants: IndexMap<ParticipantId, ParticipantPresence>,
    connection: ConnectionState,
}

impl PresenceBoard {
    /// Empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Board displaying `participants`, in the given order.
    pub fn with_participants<I, P>(participants: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ParticipantId>,
    {
        let mut board = Self::new();
        for participant in participants {
            board.track(participant);
        }
        board
    }

    /// Start displaying `participant`. Existing state is kept.
    pub fn track(&mut self, participant: impl Into<ParticipantId>) {
        self.participants.entry(participant.into()).or_default();
    }

    /// Stop displaying `participant`.
    pub fn untrack(&mut self, participant: &str) -> Option<ParticipantPresence> {
        self.participants.shift_remove(participant)
    }

    /// Presence of `participant`, if displayed.
    #[must_use]
    pub fn get(&self, participant: &str) -> Option<&ParticipantPresence> {
        self.participants.get(participant)
    }

    /// Displayed participants in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &ParticipantPresence)> {
        self.participants.iter()
    }

    /// Number of displayed participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether nobody is displayed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Displayed participants currently speaking.
    pub fn speakers(&self) -> impl Iterator<Item = &ParticipantId> {
        self.participants
            .iter()
            .filter(|(_, presence)| presence.is_speaking())
            .map(|(id, _)| id)
    }

    /// Last connection state seen.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    /// Fold one event into the board.
    pub fn apply(&mut self, event: &RoomEvent) {
        match event {
            RoomEvent::Activity(sample) => {
                for reading in &sample.readings {
                    if let Some(presence) = self.participants.get_mut(&reading.participant) {
                        presence.level = reading.level;
                    }
                }
            }
            RoomEvent::Quality(sample) => {
                for (id, grade) in &sample.grades {
                    if let Some(presence) = self.participants.get_mut(id) {
                        presence.quality = *grade;
                    }
                }
            }
            RoomEvent::ConnectionStateChange { current, .. } => {
                self.connection = *current;
                if *current == ConnectionState::Disconnected {
                    self.participants
                        .values_mut()
                        .for_each(|presence| *presence = ParticipantPresence::default());
                }
            }
            RoomEvent::UserJoined { participant } => self.track(participant.clone()),
            RoomEvent::UserLeft { participant } => {
                self.untrack(participant.as_str());
            }
            RoomEvent::UserPublished { participant } => self.set_publishing(participant, true),
            RoomEvent::UserUnpublished { participant } => self.set_publishing(participant, false),
        }
    }

    fn set_publishing(&mut self, participant: &ParticipantId, publishing: bool) {
        if let Some(presence) = self.participants.get_mut(participant) {
            presence.publishing = publishing;
        }
    }
}

/// A [`PresenceBoard`] kept current by a bus subscription.
///
/// Subscribes to every event kind on creation and unsubscribes on drop.
pub struct LivePresence {
    board: Arc<Mutex<PresenceBoard>>,
    bus: Arc<EventBus<RoomEvent>>,
    subscriptions: Vec<Subscription<EventKind>>,
}

impl LivePresence {
    /// Attach `board` to `bus`.
    #[must_use]
    pub fn attach(bus: &Arc<EventBus<RoomEvent>>, board: PresenceBoard) -> Self {
        let board = Arc::new(Mutex::new(board));
        let subscriptions = EventKind::ALL
            .into_iter()
            .map(|kind| {
                let board = Arc::clone(&board);
                bus.subscribe_fn(kind, move |event| board.lock().apply(event))
            })
            .collect();
        Self {
            board,
            bus: Arc::clone(bus),
            subscriptions,
        }
    }

    /// Copy of the current board.
    #[must_use]
    pub fn snapshot(&self) -> PresenceBoard {
        self.board.lock().clone()
    }

    /// Add a participant to the live board.
    pub fn track(&self, participant: impl Into<ParticipantId>) {
        self.board.lock().track(participant);
    }
}

impl std::fmt::Debug for LivePresence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivePresence")
            .field("board", &*self.board.lock())
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl Drop for LivePresence {
    fn drop(&mut self) {
        for subscription in &self.subscriptions {
            self.bus.unsubscribe_handle(subscription);
        }
    }
}

#[cfg(test)]
mod tests {
    use majlis_telemetry::{ActivityReading, ActivitySample, QualitySample};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn activity(pairs: &[(&str, u8)]) -> RoomEvent {
        RoomEvent::Activity(ActivitySample {
            readings: pairs
                .iter()
                .map(|(id, level)| ActivityReading {
                    participant: (*id).into(),
                    level: ActivityLevel::saturating(*level),
                })
                .collect(),
        })
    }

    fn quality(pairs: &[(&str, NetworkQuality)]) -> RoomEvent {
        RoomEvent::Quality(QualitySample {
            grades: pairs.iter().map(|(id, g)| ((*id).into(), *g)).collect(),
        })
    }

    fn board() -> PresenceBoard {
        PresenceBoard::with_participants(["me", "1", "3"])
    }

    #[rstest]
    #[case(0, false)]
    #[case(10, false)]
    #[case(11, true)]
    #[case(100, true)]
    fn speaking_threshold(#[case] level: u8, #[case] speaking: bool) {
        let mut board = board();
        board.apply(&activity(&[("me", level)]));
        assert_eq!(board.get("me").unwrap().is_speaking(), speaking);
    }

    #[test]
    fn unknown_participants_are_ignored() {
        let mut board = board();
        board.apply(&activity(&[("ghost", 90)]));
        board.apply(&quality(&[("ghost", NetworkQuality::Down)]));
        assert!(board.get("ghost").is_none());
        assert_eq!(board.len(), 3);
    }

    #[test]
    fn quality_defaults_to_unknown_and_keeps_last_value() {
        let mut board = board();
        assert_eq!(board.get("3").unwrap().quality, NetworkQuality::Unknown);

        board.apply(&quality(&[("3", NetworkQuality::Poor), ("1", NetworkQuality::Good)]));
        board.apply(&quality(&[("1", NetworkQuality::Excellent)]));
        assert_eq!(board.get("3").unwrap().quality, NetworkQuality::Poor);
        assert_eq!(board.get("1").unwrap().quality, NetworkQuality::Excellent);
    }

    #[test]
    fn speakers_follow_display_order() {
        let mut board = board();
        board.apply(&activity(&[("3", 40), ("me", 2), ("1", 70)]));
        let speakers: Vec<_> = board.speakers().map(ParticipantId::as_str).collect();
        assert_eq!(speakers, vec!["1", "3"]);
    }

    #[test]
    fn disconnect_resets_values_but_keeps_participants() {
        let mut board = board();
        board.apply(&activity(&[("me", 50)]));
        board.apply(&RoomEvent::ConnectionStateChange {
            previous: ConnectionState::Connected,
            current: ConnectionState::Disconnected,
        });
        assert_eq!(board.len(), 3);
        assert_eq!(*board.get("me").unwrap(), ParticipantPresence::default());
        assert_eq!(board.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn roster_events_track_and_flag() {
        let mut board = board();
        board.apply(&RoomEvent::UserJoined {
            participant: "7".into(),
        });
        board.apply(&RoomEvent::UserPublished {
            participant: "7".into(),
        });
        assert!(board.get("7").unwrap().publishing);

        board.apply(&RoomEvent::UserLeft {
            participant: "1".into(),
        });
        let ids: Vec<_> = board.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["me", "3", "7"]);
    }

    #[test]
    fn live_board_detaches_on_drop() {
        let bus = Arc::new(EventBus::new());
        let live = LivePresence::attach(&bus, board());
        assert_eq!(bus.listener_count(EventKind::Activity), 1);

        bus.publish(&activity(&[("1", 60)]));
        assert!(live.snapshot().get("1").unwrap().is_speaking());

        drop(live);
        assert!(EventKind::ALL.into_iter().all(|k| bus.listener_count(k) == 0));
    }
}
