//! Telemetry samples produced on every generator tick.
//!
//! Samples are ephemeral: they carry no identity beyond the tick that
//! produced them and are never persisted.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::ParticipantId;

/// Activity level above which a participant counts as speaking.
pub const SPEAKING_THRESHOLD: u8 = 10;

/// Synthetic speaking volume in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ActivityLevel(u8);

impl ActivityLevel {
    /// Highest representable level.
    pub const MAX: Self = Self(100);
    /// Silence.
    pub const SILENT: Self = Self(0);

    /// Build a level, saturating at [`ActivityLevel::MAX`].
    #[must_use]
    pub fn saturating(value: u8) -> Self {
        Self(value.min(Self::MAX.0))
    }

    /// Raw value.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Whether the level crosses [`SPEAKING_THRESHOLD`].
    #[must_use]
    pub fn is_speaking(self) -> bool {
        self.0 > SPEAKING_THRESHOLD
    }
}

impl TryFrom<u8> for ActivityLevel {
    type Error = LevelOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > Self::MAX.0 {
            Err(LevelOutOfRange(value))
        } else {
            Ok(Self(value))
        }
    }
}

impl From<ActivityLevel> for u8 {
    fn from(level: ActivityLevel) -> Self {
        level.0
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Rejected activity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("activity level {0} exceeds 100")]
pub struct LevelOutOfRange(pub u8);

/// Network quality grade, ordered from unknown to down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum NetworkQuality {
    /// No measurement yet.
    #[default]
    Unknown = 0,
    /// Excellent link.
    Excellent = 1,
    /// Good link.
    Good = 2,
    /// Noticeable packet loss.
    Poor = 3,
    /// Degraded link.
    Bad = 4,
    /// Barely usable link.
    VeryBad = 5,
    /// Link is down.
    Down = 6,
}

impl NetworkQuality {
    /// Every grade in ascending order.
    pub const ALL: [Self; 7] = [
        Self::Unknown,
        Self::Excellent,
        Self::Good,
        Self::Poor,
        Self::Bad,
        Self::VeryBad,
        Self::Down,
    ];

    /// Numeric grade, `0..=6`.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether the grade indicates user-visible degradation.
    #[must_use]
    pub fn is_degraded(self) -> bool {
        self >= Self::Poor
    }
}

impl TryFrom<u8> for NetworkQuality {
    type Error = UnknownGrade;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(UnknownGrade(value))
    }
}

impl fmt::Display for NetworkQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Poor => "POOR",
            Self::Bad => "BAD",
            Self::VeryBad => "VERY_BAD",
            Self::Down => "DOWN",
        };
        f.write_str(name)
    }
}

/// Rejected network grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("network quality grade {0} is outside 0..=6")]
pub struct UnknownGrade(pub u8);

/// One participant's level within an [`ActivitySample`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityReading {
    /// Who the level belongs to.
    pub participant: ParticipantId,
    /// Simulated volume.
    pub level: ActivityLevel,
}

impl ActivityReading {
    /// Shorthand for `self.level.is_speaking()`.
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.level.is_speaking()
    }
}

/// Speaking activity for the tracked participants at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivitySample {
    /// Readings in roster order.
    pub readings: Vec<ActivityReading>,
}

impl ActivitySample {
    /// Level reported for `participant`, if present.
    #[must_use]
    pub fn level_of(&self, participant: &str) -> Option<ActivityLevel> {
        self.readings
            .iter()
            .find(|r| r.participant == participant)
            .map(|r| r.level)
    }

    /// Participants whose level crosses the speaking threshold.
    pub fn speakers(&self) -> impl Iterator<Item = &ParticipantId> {
        self.readings
            .iter()
            .filter(|r| r.is_speaking())
            .map(|r| &r.participant)
    }
}

/// Network grades for the tracked participants at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QualitySample {
    /// Grades keyed by participant, in roster order.
    pub grades: IndexMap<ParticipantId, NetworkQuality>,
}

impl QualitySample {
    /// Grade reported for `participant`, if present.
    #[must_use]
    pub fn grade_of(&self, participant: &str) -> Option<NetworkQuality> {
        self.grades.get(participant).copied()
    }
}
