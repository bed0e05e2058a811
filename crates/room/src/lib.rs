#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Majlis Room
//!
//! Simulated live-audio room connection.
//!
//! This crate provides:
//! - [`RoomClient`] -- join/leave lifecycle, role, local tracks, listeners
//! - [`RoomEvent`] / [`EventKind`] -- typed payloads and the names they travel under
//! - [`Session`] -- what a connected client knows about its room
//! - [`PresenceBoard`] / [`LivePresence`] -- per-participant state folded from events
//!
//! ```no_run
//! use majlis_room::{EventKind, RoomClient, RoomEvent};
//! use majlis_telemetry::SimulatorConfig;
//!
//! # async fn demo() -> majlis_room::Result<()> {
//! let client = RoomClient::new(SimulatorConfig::default())?;
//! client.on_fn(EventKind::Activity, |event| {
//!     if let RoomEvent::Activity(sample) = event {
//!         for id in sample.speakers() {
//!             println!("{id} is speaking");
//!         }
//!     }
//! });
//! client.join("room-1", "me").await?;
//! client.leave().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod event;
pub mod presence;
pub mod session;

pub use client::{ACTIVE_SESSIONS, JOIN_REJECTIONS, JOINS, LEAVES, RoomClient};
pub use error::{Result, RoomError};
pub use event::{ConnectionState, EventKind, RoomEvent};
pub use presence::{LivePresence, ParticipantPresence, PresenceBoard};
pub use session::{ClientRole, Session};
