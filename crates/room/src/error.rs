//! Error types for the room client.

use majlis_telemetry::{ConfigError, RoomId};
use thiserror::Error;

use crate::event::ConnectionState;

/// Result type for room operations.
pub type Result<T> = std::result::Result<T, RoomError>;

/// Errors surfaced by [`RoomClient`](crate::RoomClient).
#[derive(Error, Debug)]
pub enum RoomError {
    /// `join` was called while a session is connecting or connected.
    #[error("already in room '{room_id}' ({state})")]
    AlreadyJoined {
        /// Room of the existing session.
        room_id: RoomId,
        /// State of the existing session.
        state: ConnectionState,
    },

    /// `leave` ran while this `join` was still connecting.
    #[error("join to room '{room_id}' was aborted by leave")]
    JoinAborted {
        /// Room the aborted join targeted.
        room_id: RoomId,
    },

    /// The operation needs a connected session.
    #[error("not connected to a room")]
    NotJoined,

    /// Event name outside the supported set.
    #[error("unknown event name '{0}'")]
    UnknownEvent(String),

    /// The simulator configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
