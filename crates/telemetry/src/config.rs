//! Simulator configuration.
//!
//! Defaults reproduce the voice-club mock: activity every 500 ms, quality
//! every 2 s, an 800 ms connect delay, and five remote participants with
//! fixed behaviour.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::id::ParticipantId;
use crate::sample::{ActivityLevel, NetworkQuality};

/// Default period of the activity stream.
pub const DEFAULT_ACTIVITY_INTERVAL: Duration = Duration::from_millis(500);
/// Default period of the quality stream.
pub const DEFAULT_QUALITY_INTERVAL: Duration = Duration::from_millis(2000);
/// Default simulated connect latency.
pub const DEFAULT_CONNECT_DELAY: Duration = Duration::from_millis(800);

/// How often a participant talks and how loud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeakingProfile {
    /// Chance per tick of producing a non-zero draw.
    pub probability: f64,
    /// Upper bound (inclusive) of the uniform draw.
    pub max_level: u8,
}

/// A probabilistic downgrade applied on top of a baseline grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Degradation {
    /// Chance per tick of reporting `grade` instead of the baseline.
    pub probability: f64,
    /// Grade reported while degraded.
    pub grade: NetworkQuality,
}

/// Network behaviour of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityProfile {
    /// Grade reported on an ordinary tick.
    pub baseline: NetworkQuality,
    /// Optional packet-loss simulation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degradation: Option<Degradation>,
}

impl QualityProfile {
    /// A participant whose grade never changes.
    #[must_use]
    pub fn steady(baseline: NetworkQuality) -> Self {
        Self {
            baseline,
            degradation: None,
        }
    }
}

/// Simulated behaviour of one participant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    /// `None` keeps the participant out of activity samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaking: Option<SpeakingProfile>,
    /// Network grade generation.
    pub quality: QualityProfile,
}

/// A remote participant known when the simulation starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantProfile {
    /// Participant identifier.
    pub id: ParticipantId,
    /// What the simulator generates for it.
    #[serde(flatten)]
    pub behavior: Behavior,
}

impl ParticipantProfile {
    fn new(id: &str, speaking: Option<(f64, u8)>, quality: QualityProfile) -> Self {
        Self {
            id: id.into(),
            behavior: Behavior {
                speaking: speaking.map(|(probability, max_level)| SpeakingProfile {
                    probability,
                    max_level,
                }),
                quality,
            },
        }
    }
}

/// Settings for the telemetry simulator and the simulated connect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Period of the activity stream.
    #[serde(rename = "activity_interval_ms", with = "millis")]
    pub activity_interval: Duration,
    /// Period of the quality stream.
    #[serde(rename = "quality_interval_ms", with = "millis")]
    pub quality_interval: Duration,
    /// Simulated network latency of `join`.
    #[serde(rename = "connect_delay_ms", with = "millis")]
    pub connect_delay: Duration,
    /// Seed for reproducible streams; `None` draws from the OS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Behaviour of the local participant.
    pub local: Behavior,
    /// Other participants tracked from the start of the session.
    pub remotes: Vec<ParticipantProfile>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        let degrading = QualityProfile {
            baseline: NetworkQuality::Excellent,
            degradation: Some(Degradation {
                probability: 0.2,
                grade: NetworkQuality::Poor,
            }),
        };
        Self {
            activity_interval: DEFAULT_ACTIVITY_INTERVAL,
            quality_interval: DEFAULT_QUALITY_INTERVAL,
            connect_delay: DEFAULT_CONNECT_DELAY,
            seed: None,
            local: Behavior {
                speaking: Some(SpeakingProfile {
                    probability: 0.5,
                    max_level: 100,
                }),
                quality: QualityProfile::steady(NetworkQuality::Excellent),
            },
            remotes: vec![
                ParticipantProfile::new(
                    "1",
                    Some((0.7, 80)),
                    QualityProfile::steady(NetworkQuality::Excellent),
                ),
                ParticipantProfile::new("2", None, QualityProfile::steady(NetworkQuality::Good)),
                ParticipantProfile::new("3", Some((0.3, 60)), degrading),
                ParticipantProfile::new(
                    "4",
                    None,
                    QualityProfile::steady(NetworkQuality::Excellent),
                ),
                ParticipantProfile::new("5", None, QualityProfile::steady(NetworkQuality::Bad)),
            ],
        }
    }
}

impl SimulatorConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Fix the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Override both stream periods.
    #[must_use]
    pub fn with_intervals(mut self, activity: Duration, quality: Duration) -> Self {
        self.activity_interval = activity;
        self.quality_interval = quality;
        self
    }

    /// Override the simulated connect latency.
    #[must_use]
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Replace the remote roster.
    #[must_use]
    pub fn with_remotes(mut self, remotes: Vec<ParticipantProfile>) -> Self {
        self.remotes = remotes;
        self
    }

    /// Check every invariant the generators rely on.
    ///
    /// A zero connect delay is allowed; zero stream periods are not.
    pub fn validate(&self) -> Result<()> {
        if self.activity_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                field: "activity_interval",
            });
        }
        if self.quality_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                field: "quality_interval",
            });
        }

        validate_behavior("<local>", &self.local)?;

        let mut seen = HashSet::new();
        for profile in &self.remotes {
            if !seen.insert(profile.id.as_str()) {
                return Err(ConfigError::DuplicateParticipant(profile.id.to_string()));
            }
            validate_behavior(profile.id.as_str(), &profile.behavior)?;
        }
        Ok(())
    }
}

fn validate_behavior(participant: &str, behavior: &Behavior) -> Result<()> {
    if let Some(speaking) = behavior.speaking {
        check_probability(participant, "speak_probability", speaking.probability)?;
        if speaking.max_level > ActivityLevel::MAX.get() {
            return Err(ConfigError::Level {
                participant: participant.to_owned(),
                value: speaking.max_level,
            });
        }
    }
    if let Some(degradation) = behavior.quality.degradation {
        check_probability(participant, "degradation_probability", degradation.probability)?;
    }
    Ok(())
}

fn check_probability(participant: &str, field: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability {
            participant: participant.to_owned(),
            field,
            value,
        })
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_are_valid_and_match_the_mock() {
        let config = SimulatorConfig::default();
        config.validate().unwrap();
        assert_eq!(config.activity_interval, Duration::from_millis(500));
        assert_eq!(config.quality_interval, Duration::from_secs(2));
        assert_eq!(config.connect_delay, Duration::from_millis(800));
        let ids: Vec<_> = config.remotes.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn json_overrides_merge_with_defaults() {
        let config = SimulatorConfig::from_json_str(
            r#"{ "activity_interval_ms": 100, "seed": 7, "remotes": [] }"#,
        )
        .unwrap();
        assert_eq!(config.activity_interval, Duration::from_millis(100));
        assert_eq!(config.quality_interval, DEFAULT_QUALITY_INTERVAL);
        assert_eq!(config.seed, Some(7));
        assert!(config.remotes.is_empty());
    }

    #[test]
    fn json_roundtrip_keeps_profiles() {
        let config = SimulatorConfig::default().with_seed(42);
        let json = serde_json::to_string(&config).unwrap();
        let back = SimulatorConfig::from_json_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn remote_profile_json_is_flat() {
        let json = r#"{
            "remotes": [
                { "id": "host", "speaking": { "probability": 1.0, "max_level": 90 },
                  "quality": { "baseline": "GOOD" } }
            ]
        }"#;
        let config = SimulatorConfig::from_json_str(json).unwrap();
        let host = &config.remotes[0];
        assert_eq!(host.id, "host");
        assert_eq!(host.behavior.quality, QualityProfile::steady(NetworkQuality::Good));
    }

    #[test]
    fn zero_stream_period_is_rejected() {
        let config = SimulatorConfig::default().with_intervals(Duration::ZERO, Duration::from_secs(1));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroInterval {
                field: "activity_interval"
            })
        ));
    }

    #[test]
    fn zero_connect_delay_is_allowed() {
        SimulatorConfig::default()
            .with_connect_delay(Duration::ZERO)
            .validate()
            .unwrap();
    }

    #[test]
    fn bad_probability_is_rejected() {
        let mut config = SimulatorConfig::default();
        config.remotes[2].behavior.quality.degradation = Some(Degradation {
            probability: -0.1,
            grade: NetworkQuality::Poor,
        });
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Probability { ref participant, .. } if participant == "3"));
    }

    #[test]
    fn level_above_hundred_is_rejected() {
        let mut config = SimulatorConfig::default();
        config.local.speaking = Some(SpeakingProfile {
            probability: 0.5,
            max_level: 120,
        });
        assert!(matches!(config.validate(), Err(ConfigError::Level { value: 120, .. })));
    }

    #[test]
    fn duplicate_remote_is_rejected() {
        let mut config = SimulatorConfig::default();
        let dup = config.remotes[0].clone();
        config.remotes.push(dup);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateParticipant(id)) if id == "1"
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            SimulatorConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
