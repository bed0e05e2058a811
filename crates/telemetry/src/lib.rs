#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Majlis Telemetry
//!
//! Synthetic audio-activity and network-quality telemetry for live rooms.
//!
//! This crate provides:
//! - [`ActivitySample`] / [`QualitySample`] -- what one tick produces
//! - [`SimulatorConfig`] -- periods, connect delay, and per-participant behaviour
//! - [`Roster`] and the pure generators behind each stream
//! - [`TelemetrySimulator`] -- the two periodic streams feeding a [`TelemetrySink`]
//! - [`MetricsRegistry`] -- in-memory counters and gauges
//!
//! The simulator has no failure modes of its own: generation is pure
//! computation and delivery is delegated to the sink.

pub mod config;
pub mod error;
pub mod id;
pub mod metrics;
pub mod model;
pub mod sample;
pub mod simulator;

pub use config::{
    Behavior, Degradation, ParticipantProfile, QualityProfile, SimulatorConfig, SpeakingProfile,
};
pub use error::{ConfigError, Result};
pub use id::{ParticipantId, RoomId};
pub use metrics::{Counter, Gauge, MetricsRegistry};
pub use model::{ActivityGenerator, QualityGenerator, Roster, SampleGenerator};
pub use sample::{
    ActivityLevel, ActivityReading, ActivitySample, NetworkQuality, QualitySample,
    SPEAKING_THRESHOLD,
};
pub use simulator::{TelemetrySimulator, TelemetrySink};
