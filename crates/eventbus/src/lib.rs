#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Majlis Event Bus
//!
//! Synchronous, in-process publish/subscribe keyed by event kind.
//!
//! This crate provides:
//! - [`Event`] -- trait tying a typed payload to the kind it is published under
//! - [`EventBus`] -- ordered callback register with per-listener panic isolation
//! - [`Subscription`] -- handle for removing exactly one registration
//!
//! The bus knows nothing about rooms or telemetry. Producers publish typed
//! payloads; the kind of the payload selects the listeners.

pub mod bus;

pub use bus::{Event, EventBus, Listener, Subscription, listener};
