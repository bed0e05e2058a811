//! Periodic telemetry generation for an active session.
//!
//! [`TelemetrySimulator::start`] spawns one task per stream. Each task ticks
//! on its own interval and hands samples to a [`TelemetrySink`]. The first
//! sample of a stream arrives one full period after start.
//!
//! Cancellation wins over a tick that is due at the same instant, and the
//! token is re-checked before every hand-off, so once [`stop`] has begun no
//! new sample reaches the sink. [`stop`] returns only after both tasks have
//! exited.
//!
//! [`stop`]: TelemetrySimulator::stop

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::SimulatorConfig;
use crate::error::Result;
use crate::id::ParticipantId;
use crate::metrics::{
    ACTIVITY_SAMPLES, Gauge, MetricsRegistry, QUALITY_SAMPLES, RUNNING_SIMULATIONS,
};
use crate::model::{Roster, SampleGenerator};
use crate::sample::{ActivitySample, QualitySample};

/// Receiver of generated samples.
///
/// This is the seam a real media transport would plug into: anything that
/// can deliver audio-level and link-quality callbacks implements the same
/// two methods.
pub trait TelemetrySink: Send + Sync + 'static {
    /// Called once per activity tick.
    fn activity(&self, sample: ActivitySample);

    /// Called once per quality tick.
    fn quality(&self, sample: QualitySample);
}

/// Running pair of telemetry streams.
///
/// Dropping the simulator cancels both streams without waiting for them;
/// use [`stop`](Self::stop) to wait.
#[derive(Debug)]
pub struct TelemetrySimulator {
    roster: Roster,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    running: Gauge,
}

impl TelemetrySimulator {
    /// Start both streams for `local` and the configured remotes.
    ///
    /// The config is validated first; nothing is spawned when it is
    /// rejected.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start<S: TelemetrySink>(
        local: &ParticipantId,
        config: &SimulatorConfig,
        sink: Arc<S>,
        metrics: &MetricsRegistry,
    ) -> Result<Self> {
        config.validate()?;
        let roster = Roster::new(local, config);
        let cancel = CancellationToken::new();

        let activity = {
            let sink = Arc::clone(&sink);
            let published = metrics.counter(ACTIVITY_SAMPLES);
            tokio::spawn(run_stream(
                roster.activity(config.seed),
                config.activity_interval,
                cancel.clone(),
                move |sample| {
                    published.inc();
                    sink.activity(sample);
                },
            ))
        };
        let quality = {
            let published = metrics.counter(QUALITY_SAMPLES);
            tokio::spawn(run_stream(
                roster.quality(config.seed),
                config.quality_interval,
                cancel.clone(),
                move |sample| {
                    published.inc();
                    sink.quality(sample);
                },
            ))
        };

        let running = metrics.gauge(RUNNING_SIMULATIONS);
        running.inc();
        tracing::info!(
            participant = %local,
            tracked = roster.len(),
            activity_ms = config.activity_interval.as_millis() as u64,
            quality_ms = config.quality_interval.as_millis() as u64,
            "telemetry simulation started"
        );

        Ok(Self {
            roster,
            cancel,
            tasks: vec![activity, quality],
            running,
        })
    }

    /// Participants the streams report on.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Whether cancellation has not been requested yet.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Cancel both streams and wait until they have exited.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(err) = task.await
                && err.is_panic()
            {
                tracing::warn!(error = %err, "telemetry stream panicked");
            }
        }
        tracing::info!("telemetry simulation stopped");
    }
}

impl Drop for TelemetrySimulator {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.running.dec();
    }
}

async fn run_stream<G, F>(mut generator: G, period: Duration, cancel: CancellationToken, publish: F)
where
    G: SampleGenerator,
    F: Fn(G::Sample) + Send + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let sample = generator.next_sample();
        if cancel.is_cancelled() {
            break;
        }
        tick += 1;
        tracing::trace!(stream = generator.stream(), tick, "sample generated");
        publish(sample);
    }

    tracing::debug!(stream = generator.stream(), ticks = tick, "telemetry stream exited");
}
