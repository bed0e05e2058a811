//! The room client: session lifecycle on top of the event bus.
//!
//! ```text
//! DISCONNECTED --join--> CONNECTING --delay--> CONNECTED
//!      ^                     |                     |
//!      +-------leave---------+---------leave-------+
//! ```
//!
//! Every transition is published as [`RoomEvent::ConnectionStateChange`].
//! Telemetry starts after the `CONNECTED` event and is fully stopped before
//! the `DISCONNECTED` event, so listeners never see a sample outside a
//! session.
//!
//! Transition events are published under a dedicated ordering lock, taken
//! before the state lock, so listeners on every task see them in the order
//! the state changed. The state lock itself is never held while listeners
//! run.

use std::sync::Arc;

use majlis_eventbus::{EventBus, Listener, Subscription};
use majlis_telemetry::{
    ActivitySample, MetricsRegistry, ParticipantId, QualitySample, RoomId, SimulatorConfig,
    TelemetrySimulator, TelemetrySink,
};
use parking_lot::Mutex;

use crate::error::{Result, RoomError};
use crate::event::{ConnectionState, EventKind, RoomEvent};
use crate::session::{ClientRole, Session};

/// Sessions that reached `CONNECTED`.
pub const JOINS: &str = "room.joins";
/// Sessions ended by `leave`, including aborted connects.
pub const LEAVES: &str = "room.leaves";
/// `join` calls refused because a session already existed.
pub const JOIN_REJECTIONS: &str = "room.join_rejections";
/// Sessions currently `CONNECTED`.
pub const ACTIVE_SESSIONS: &str = "room.active_sessions";

#[derive(Debug, Default)]
struct Lifecycle {
    state: ConnectionState,
    session: Option<Session>,
    simulator: Option<TelemetrySimulator>,
    role: ClientRole,
    // Bumped by every join and leave; a pending join that finds a different
    // value after its delay has been superseded.
    epoch: u64,
}

/// Caller-owned handle to one simulated room connection.
///
/// Dropping the client cancels running telemetry without emitting
/// `DISCONNECTED`; call [`leave`](Self::leave) or [`dispose`](Self::dispose)
/// for an orderly shutdown.
#[derive(Debug)]
pub struct RoomClient {
    config: SimulatorConfig,
    bus: Arc<EventBus<RoomEvent>>,
    lifecycle: Mutex<Lifecycle>,
    // Held while a transition event is published.
    transitions: Arc<Mutex<()>>,
    metrics: MetricsRegistry,
}

impl RoomClient {
    /// Create a client with its own bus and metrics.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::Config`] if `config` fails validation.
    pub fn new(config: SimulatorConfig) -> Result<Self> {
        Self::with_parts(config, Arc::new(EventBus::new()), MetricsRegistry::new())
    }

    /// Create a client over an existing bus and metrics registry.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::Config`] if `config` fails validation.
    pub fn with_parts(
        config: SimulatorConfig,
        bus: Arc<EventBus<RoomEvent>>,
        metrics: MetricsRegistry,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            bus,
            lifecycle: Mutex::new(Lifecycle::default()),
            transitions: Arc::new(Mutex::new(())),
            metrics,
        })
    }

    /// Connect to `room_id` as `participant_id`.
    ///
    /// Emits `CONNECTING`, waits the configured connect delay, emits
    /// `CONNECTED` and starts both telemetry streams. Resolves with the
    /// participant id once connected.
    ///
    /// Dropping the returned future while connecting rolls the client back
    /// to `DISCONNECTED`.
    ///
    /// `CONNECTED` is published only if no `leave` ran during the delay, and
    /// a concurrent `leave` publishes its `DISCONNECTED` after it.
    ///
    /// # Errors
    ///
    /// - [`RoomError::AlreadyJoined`] if a session is connecting or connected
    /// - [`RoomError::JoinAborted`] if [`leave`](Self::leave) ran during the delay
    pub async fn join(
        &self,
        room_id: impl Into<RoomId>,
        participant_id: impl Into<ParticipantId>,
    ) -> Result<ParticipantId> {
        let room_id = room_id.into();
        let participant_id = participant_id.into();

        let epoch = {
            let _ordered = self.transitions.lock();
            let mut lifecycle = self.lifecycle.lock();
            if let Some(session) = &lifecycle.session {
                self.metrics.counter(JOIN_REJECTIONS).inc();
                tracing::warn!(
                    room = %session.room_id,
                    state = %lifecycle.state,
                    requested = %room_id,
                    "join rejected, session already exists"
                );
                return Err(RoomError::AlreadyJoined {
                    room_id: session.room_id.clone(),
                    state: lifecycle.state,
                });
            }
            let role = lifecycle.role;
            lifecycle.epoch += 1;
            lifecycle.state = ConnectionState::Connecting;
            lifecycle.session = Some(Session::connecting(
                room_id.clone(),
                participant_id.clone(),
                role,
            ));
            let epoch = lifecycle.epoch;
            drop(lifecycle);

            tracing::info!(room = %room_id, participant = %participant_id, "connecting");
            self.emit_state(ConnectionState::Disconnected, ConnectionState::Connecting);
            epoch
        };

        let pending = PendingJoin {
            client: self,
            epoch,
        };
        tokio::time::sleep(self.config.connect_delay).await;

        let connected = {
            let _ordered = self.transitions.lock();
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.epoch == epoch {
                lifecycle.state = ConnectionState::Connected;
                if let Some(session) = lifecycle.session.as_mut() {
                    session.state = ConnectionState::Connected;
                }
                self.metrics.counter(JOINS).inc();
                self.metrics.gauge(ACTIVE_SESSIONS).inc();
                drop(lifecycle);

                tracing::info!(room = %room_id, participant = %participant_id, "connected");
                self.emit_state(ConnectionState::Connecting, ConnectionState::Connected);
                true
            } else {
                false
            }
        };
        drop(pending);
        if !connected {
            tracing::info!(room = %room_id, "join aborted while connecting");
            return Err(RoomError::JoinAborted { room_id });
        }

        // A CONNECTED listener may already have started a leave.
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.epoch == epoch && lifecycle.state == ConnectionState::Connected {
            let sink = Arc::new(BusSink {
                bus: Arc::clone(&self.bus),
            });
            lifecycle.simulator = Some(TelemetrySimulator::start(
                &participant_id,
                &self.config,
                sink,
                &self.metrics,
            )?);
        }
        Ok(participant_id)
    }

    /// End the current session.
    ///
    /// Stops both telemetry streams, waits for them to exit, then emits
    /// `DISCONNECTED`. A leave while connecting aborts the pending join.
    /// Does nothing when already disconnected.
    ///
    /// The state flips to `DISCONNECTED` on the first poll. Shutdown and the
    /// `DISCONNECTED` event run on a spawned task, so they complete even if
    /// this future is dropped before it resolves.
    pub async fn leave(&self) {
        let (previous, simulator, room_id) = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state == ConnectionState::Disconnected {
                return;
            }
            let previous = lifecycle.state;
            lifecycle.state = ConnectionState::Disconnected;
            lifecycle.epoch += 1;
            if previous == ConnectionState::Connected {
                self.metrics.gauge(ACTIVE_SESSIONS).dec();
            }
            self.metrics.counter(LEAVES).inc();
            let room_id = lifecycle.session.take().map(|session| session.room_id);
            (previous, lifecycle.simulator.take(), room_id)
        };

        let shutdown = tokio::spawn(finish_leave(
            Arc::clone(&self.bus),
            Arc::clone(&self.transitions),
            previous,
            simulator,
            room_id,
        ));
        if let Err(err) = shutdown.await
            && err.is_panic()
        {
            tracing::warn!(error = %err, "room shutdown panicked");
        }
    }

    /// Leave the room and drop every listener.
    pub async fn dispose(self) {
        self.leave().await;
        self.bus.clear();
        tracing::debug!("room client disposed");
    }

    /// Register `listener` for events of `kind`.
    pub fn on(&self, kind: EventKind, listener: Listener<RoomEvent>) -> Subscription<EventKind> {
        self.bus.subscribe(kind, listener)
    }

    /// Register a closure for events of `kind`.
    pub fn on_fn<F>(&self, kind: EventKind, f: F) -> Subscription<EventKind>
    where
        F: Fn(&RoomEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe_fn(kind, f)
    }

    /// Remove every registration of `listener` under `kind`.
    ///
    /// Returns how many registrations were removed.
    pub fn off(&self, kind: EventKind, listener: &Listener<RoomEvent>) -> usize {
        self.bus.unsubscribe(kind, listener)
    }

    /// Remove the single registration behind `subscription`.
    pub fn off_subscription(&self, subscription: &Subscription<EventKind>) -> bool {
        self.bus.unsubscribe_handle(subscription)
    }

    /// Switch between host and audience.
    ///
    /// Metadata only: applies to the current session, if any, and to
    /// sessions joined later.
    pub fn set_role(&self, role: ClientRole) {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.role = role;
        if let Some(session) = lifecycle.session.as_mut() {
            session.role = role;
        }
        tracing::debug!(%role, "client role set");
    }

    /// Current role.
    #[must_use]
    pub fn role(&self) -> ClientRole {
        self.lifecycle.lock().role
    }

    /// Mark the local tracks as published.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::NotJoined`] unless the client is connected.
    pub fn publish_tracks(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state != ConnectionState::Connected {
            return Err(RoomError::NotJoined);
        }
        let session = lifecycle.session.as_mut().ok_or(RoomError::NotJoined)?;
        session.tracks_published = true;
        tracing::debug!(participant = %session.participant_id, "local tracks published");
        Ok(())
    }

    /// Mark the local tracks as unpublished. No-op without a session.
    pub fn unpublish_tracks(&self) {
        if let Some(session) = self.lifecycle.lock().session.as_mut() {
            session.tracks_published = false;
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.lifecycle.lock().state
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.lifecycle.lock().session.clone()
    }

    /// The bus every event travels over.
    ///
    /// Roster collaborators publish `user-*` events here.
    #[must_use]
    pub fn bus(&self) -> &Arc<EventBus<RoomEvent>> {
        &self.bus
    }

    /// Metrics shared with the telemetry simulator.
    #[must_use]
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Validated configuration.
    #[must_use]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    fn emit_state(&self, previous: ConnectionState, current: ConnectionState) {
        self.bus
            .publish(&RoomEvent::ConnectionStateChange { previous, current });
    }
}

/// Rolls a connect back to `DISCONNECTED` when the `join` future is dropped
/// during the delay. Does nothing once the epoch has moved on or the
/// session is connected.
struct PendingJoin<'a> {
    client: &'a RoomClient,
    epoch: u64,
}

impl Drop for PendingJoin<'_> {
    fn drop(&mut self) {
        let _ordered = self.client.transitions.lock();
        {
            let mut lifecycle = self.client.lifecycle.lock();
            if lifecycle.epoch != self.epoch || lifecycle.state != ConnectionState::Connecting {
                return;
            }
            lifecycle.state = ConnectionState::Disconnected;
            lifecycle.session = None;
            lifecycle.epoch += 1;
        }
        tracing::info!("join cancelled while connecting");
        self.client
            .emit_state(ConnectionState::Connecting, ConnectionState::Disconnected);
    }
}

/// Second half of [`RoomClient::leave`]: stop telemetry, then announce
/// `DISCONNECTED`.
async fn finish_leave(
    bus: Arc<EventBus<RoomEvent>>,
    transitions: Arc<Mutex<()>>,
    previous: ConnectionState,
    simulator: Option<TelemetrySimulator>,
    room_id: Option<RoomId>,
) {
    if let Some(simulator) = simulator {
        simulator.stop().await;
    }
    tracing::info!(
        room = room_id.as_ref().map(RoomId::as_str),
        from = %previous,
        "disconnected"
    );
    let _ordered = transitions.lock();
    bus.publish(&RoomEvent::ConnectionStateChange {
        previous,
        current: ConnectionState::Disconnected,
    });
}

struct BusSink {
    bus: Arc<EventBus<RoomEvent>>,
}

impl TelemetrySink for BusSink {
    fn activity(&self, sample: ActivitySample) {
        self.bus.publish(&RoomEvent::Activity(sample));
    }

    fn quality(&self, sample: QualitySample) {
        self.bus.publish(&RoomEvent::Quality(sample));
    }
}
