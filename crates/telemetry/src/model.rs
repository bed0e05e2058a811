//! Pure sample generators.
//!
//! A [`Roster`] fixes the tracked participants when a session starts. Each
//! stream gets its own generator with its own RNG so the two streams stay
//! independent.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Behavior, QualityProfile, SimulatorConfig, SpeakingProfile};
use crate::id::ParticipantId;
use crate::sample::{ActivityLevel, ActivityReading, ActivitySample, QualitySample};

// Mixed into the seed so both streams don't replay the same draws.
const QUALITY_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Something that produces one sample per tick.
pub trait SampleGenerator: Send + 'static {
    /// What a tick produces.
    type Sample: Send + 'static;

    /// Stream name for logs and metrics.
    fn stream(&self) -> &'static str;

    /// Produce the next sample.
    fn next_sample(&mut self) -> Self::Sample;
}

/// Participants tracked for the lifetime of one session.
///
/// The local participant is always first. A remote profile that reuses the
/// local identifier is dropped so every id appears once.
#[derive(Debug, Clone)]
pub struct Roster {
    members: Vec<(ParticipantId, Behavior)>,
}

impl Roster {
    /// Build the roster for `local` from `config`.
    #[must_use]
    pub fn new(local: &ParticipantId, config: &SimulatorConfig) -> Self {
        let mut members = Vec::with_capacity(config.remotes.len() + 1);
        members.push((local.clone(), config.local));
        members.extend(
            config
                .remotes
                .iter()
                .filter(|p| p.id != *local)
                .map(|p| (p.id.clone(), p.behavior)),
        );
        Self { members }
    }

    /// Tracked identifiers in roster order.
    pub fn participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.members.iter().map(|(id, _)| id)
    }

    /// Whether `participant` is tracked.
    #[must_use]
    pub fn contains(&self, participant: &str) -> bool {
        self.members.iter().any(|(id, _)| *id == participant)
    }

    /// Number of tracked participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nobody is tracked. Never true for a roster built by [`Roster::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Generator for the activity stream.
    #[must_use]
    pub fn activity(&self, seed: Option<u64>) -> ActivityGenerator {
        ActivityGenerator {
            speakers: self
                .members
                .iter()
                .filter_map(|(id, b)| b.speaking.map(|s| (id.clone(), s)))
                .collect(),
            rng: rng_from(seed),
        }
    }

    /// Generator for the quality stream.
    #[must_use]
    pub fn quality(&self, seed: Option<u64>) -> QualityGenerator {
        QualityGenerator {
            links: self
                .members
                .iter()
                .map(|(id, b)| (id.clone(), b.quality))
                .collect(),
            rng: rng_from(seed.map(|s| s ^ QUALITY_SEED_SALT)),
        }
    }
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Draws speaking levels for participants with a [`SpeakingProfile`].
#[derive(Debug)]
pub struct ActivityGenerator {
    speakers: Vec<(ParticipantId, SpeakingProfile)>,
    rng: StdRng,
}

impl SampleGenerator for ActivityGenerator {
    type Sample = ActivitySample;

    fn stream(&self) -> &'static str {
        "activity"
    }

    fn next_sample(&mut self) -> ActivitySample {
        let Self { speakers, rng } = self;
        let readings = speakers
            .iter()
            .map(|(id, profile)| {
                let raw = if rng.random_bool(profile.probability) {
                    rng.random_range(0..=profile.max_level)
                } else {
                    0
                };
                ActivityReading {
                    participant: id.clone(),
                    level: ActivityLevel::saturating(raw),
                }
            })
            .collect();
        ActivitySample { readings }
    }
}

/// Assigns network grades to every tracked participant.
#[derive(Debug)]
pub struct QualityGenerator {
    links: Vec<(ParticipantId, QualityProfile)>,
    rng: StdRng,
}

impl SampleGenerator for QualityGenerator {
    type Sample = QualitySample;

    fn stream(&self) -> &'static str {
        "quality"
    }

    fn next_sample(&mut self) -> QualitySample {
        let Self { links, rng } = self;
        let grades = links
            .iter()
            .map(|(id, profile)| {
                let grade = match profile.degradation {
                    Some(d) if rng.random_bool(d.probability) => d.grade,
                    _ => profile.baseline,
                };
                (id.clone(), grade)
            })
            .collect();
        QualitySample { grades }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::config::{Degradation, ParticipantProfile};
    use crate::sample::NetworkQuality;

    fn me() -> ParticipantId {
        ParticipantId::from("me")
    }

    #[test]
    fn roster_puts_local_first_and_keeps_remote_order() {
        let roster = Roster::new(&me(), &SimulatorConfig::default());
        let ids: Vec<_> = roster.participants().map(ParticipantId::as_str).collect();
        assert_eq!(ids, vec!["me", "1", "2", "3", "4", "5"]);
        assert!(roster.contains("3"));
        assert!(!roster.contains("ghost"));
    }

    #[test]
    fn remote_reusing_local_id_is_dropped() {
        let roster = Roster::new(&ParticipantId::from("1"), &SimulatorConfig::default());
        assert_eq!(roster.len(), 5);
        assert_eq!(roster.participants().filter(|id| **id == "1").count(), 1);
    }

    #[test]
    fn activity_covers_only_speaking_profiles() {
        let roster = Roster::new(&me(), &SimulatorConfig::default());
        let sample = roster.activity(Some(1)).next_sample();
        let ids: Vec<_> = sample.readings.iter().map(|r| r.participant.as_str()).collect();
        assert_eq!(ids, vec!["me", "1", "3"]);
    }

    #[test]
    fn quality_covers_every_member_with_baselines() {
        let roster = Roster::new(&me(), &SimulatorConfig::default());
        let sample = roster.quality(Some(1)).next_sample();
        assert_eq!(sample.grades.len(), 6);
        assert_eq!(sample.grade_of("2"), Some(NetworkQuality::Good));
        assert_eq!(sample.grade_of("5"), Some(NetworkQuality::Bad));
        let three = sample.grade_of("3").unwrap();
        assert!(matches!(three, NetworkQuality::Excellent | NetworkQuality::Poor));
    }

    #[test]
    fn same_seed_replays_same_stream() {
        let roster = Roster::new(&me(), &SimulatorConfig::default());
        let mut a = roster.activity(Some(99));
        let mut b = roster.activity(Some(99));
        for _ in 0..20 {
            assert_eq!(a.next_sample(), b.next_sample());
        }
    }

    #[test]
    fn zero_probability_speaker_stays_silent() {
        let config = SimulatorConfig::default().with_remotes(vec![ParticipantProfile {
            id: "mute".into(),
            behavior: Behavior {
                speaking: Some(SpeakingProfile {
                    probability: 0.0,
                    max_level: 100,
                }),
                quality: QualityProfile::steady(NetworkQuality::Good),
            },
        }]);
        let roster = Roster::new(&me(), &config);
        let mut generator = roster.activity(Some(5));
        for _ in 0..50 {
            let sample = generator.next_sample();
            assert_eq!(sample.level_of("mute"), Some(ActivityLevel::SILENT));
        }
    }

    #[test]
    fn certain_degradation_always_downgrades() {
        let config = SimulatorConfig::default().with_remotes(vec![ParticipantProfile {
            id: "flaky".into(),
            behavior: Behavior {
                speaking: None,
                quality: QualityProfile {
                    baseline: NetworkQuality::Excellent,
                    degradation: Some(Degradation {
                        probability: 1.0,
                        grade: NetworkQuality::VeryBad,
                    }),
                },
            },
        }]);
        let mut generator = Roster::new(&me(), &config).quality(Some(3));
        for _ in 0..10 {
            assert_eq!(generator.next_sample().grade_of("flaky"), Some(NetworkQuality::VeryBad));
        }
    }

    #[test]
    fn degradation_happens_roughly_one_in_five() {
        let mut generator = Roster::new(&me(), &SimulatorConfig::default()).quality(Some(2024));
        let poor = (0..2000)
            .filter(|_| generator.next_sample().grade_of("3") == Some(NetworkQuality::Poor))
            .count();
        assert!((250..=550).contains(&poor), "poor ticks: {poor}");
    }

    proptest! {
        #[test]
        fn activity_levels_stay_within_profile_bounds(seed in any::<u64>(), ticks in 1usize..40) {
            let roster = Roster::new(&me(), &SimulatorConfig::default());
            let mut generator = roster.activity(Some(seed));
            for _ in 0..ticks {
                let sample = generator.next_sample();
                for reading in &sample.readings {
                    prop_assert!(roster.contains(reading.participant.as_str()));
                    prop_assert!(reading.level.get() <= 100);
                }
                prop_assert!(sample.level_of("1").unwrap().get() <= 80);
                prop_assert!(sample.level_of("3").unwrap().get() <= 60);
            }
        }

        #[test]
        fn quality_grades_stay_in_enum(seed in any::<u64>()) {
            let roster = Roster::new(&me(), &SimulatorConfig::default());
            let sample = roster.quality(Some(seed)).next_sample();
            for (id, grade) in &sample.grades {
                prop_assert!(roster.contains(id.as_str()));
                prop_assert!(grade.as_u8() <= 6);
            }
        }
    }
}
