//! Sensing session: sample feed -> phase estimator -> pulse scheduler.
//!
//! This module is the glue the host app runs for the lifetime of one
//! sensing activity:
//! 1. **Open**: validate config, look up the accelerometer (fail fast)
//! 2. **Process**: select the tracked axis, ingest, schedule on a crossing
//! 3. **Close**: abort pending pulses, discard estimator state
//!
//! # Concurrency
//! `process_sample` is synchronous and takes `&mut self`: one writer at a
//! time, matching the strictly ordered sensor callback. Scheduling hands the
//! pulse to the scheduler and returns immediately.

use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::estimator::PhaseEstimator;
use crate::pulse::{HapticActuator, PulsePattern, PulseScheduler, TokioPulseScheduler};
use crate::source::{open_accelerometer, SampleSource, SensorRegistry};
use crate::types::{AccelSample, Axis, PhaseResult};

/// Running counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Samples processed.
    pub samples: u64,
    /// Rising crossings detected.
    pub crossings: u64,
    /// Pulses handed to the scheduler.
    pub pulses_scheduled: u64,
    /// Most recent valid period, in milliseconds.
    pub last_period_ms: Option<u64>,
}

/// One sensing session.
pub struct SwingSession<S: PulseScheduler> {
    config: SessionConfig,
    estimator: PhaseEstimator,
    scheduler: S,
    stats: SessionStats,
}

impl<S: PulseScheduler> SwingSession<S> {
    /// Create a session around an existing scheduler.
    pub fn new(config: SessionConfig, scheduler: S) -> Result<Self> {
        config.validate()?;
        info!(
            axis = %config.axis,
            dead_zone = config.estimator.dead_zone,
            gravity_offset = config.estimator.gravity_offset,
            window_size = config.estimator.window_size,
            "session opened"
        );
        Ok(Self {
            estimator: PhaseEstimator::new(config.estimator.clone()),
            config,
            scheduler,
            stats: SessionStats::default(),
        })
    }

    /// Create a session and open the device accelerometer.
    ///
    /// Fails with `SensorUnavailable` when the registry has no accelerometer.
    pub fn open(
        config: SessionConfig,
        registry: &dyn SensorRegistry,
        scheduler: S,
    ) -> Result<(Self, Box<dyn SampleSource>)> {
        config.validate()?;
        let source = open_accelerometer(registry)?;
        let session = Self::new(config, scheduler)?;
        Ok((session, source))
    }

    /// Feed one raw sample through the estimator and schedule a pulse if due.
    pub fn process_sample(&mut self, sample: &AccelSample) -> PhaseResult {
        let result = self.estimator.ingest_sample(sample, self.config.axis);

        self.stats.samples += 1;
        self.stats.crossings = self.estimator.total_crossings();
        if result.should_pulse {
            self.scheduler.fire_after(result.lead_ms);
            self.stats.pulses_scheduled += 1;
        }
        self.stats.last_period_ms = self.estimator.last_period_ms();

        result
    }

    /// Drain `source` until it ends.
    pub async fn run<Src: SampleSource + ?Sized>(&mut self, source: &mut Src) -> Result<SessionStats> {
        while let Some(sample) = source.recv().await? {
            self.process_sample(&sample);
        }
        info!(
            samples = self.stats.samples,
            crossings = self.stats.crossings,
            pulses = self.stats.pulses_scheduled,
            "sample feed ended"
        );
        Ok(self.stats)
    }

    /// Drain `source`, releasing one sample per `interval` of wall time.
    ///
    /// Off-device feeds (replays, synthetic swings) are produced faster than
    /// a sensor would deliver them; pacing restores the real spacing so that
    /// scheduled pulses land where they would on the device.
    pub async fn run_paced<Src: SampleSource + ?Sized>(
        &mut self,
        source: &mut Src,
        interval: Duration,
    ) -> Result<SessionStats> {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_micros(1)));
        while let Some(sample) = source.recv().await? {
            ticker.tick().await;
            self.process_sample(&sample);
        }
        info!(
            samples = self.stats.samples,
            crossings = self.stats.crossings,
            pulses = self.stats.pulses_scheduled,
            "paced sample feed ended"
        );
        Ok(self.stats)
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn estimator(&self) -> &PhaseEstimator {
        &self.estimator
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn axis(&self) -> Axis {
        self.config.axis
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// End the session and hand back the scheduler.
    pub fn into_scheduler(self) -> S {
        info!(samples = self.stats.samples, "session closed");
        self.scheduler
    }
}

impl<A: HapticActuator + 'static> SwingSession<TokioPulseScheduler<A>> {
    /// Session driving `actuator` with the configured pulse shape on the
    /// current tokio runtime.
    pub fn with_actuator(config: SessionConfig, actuator: A) -> Result<Self> {
        let pattern = PulsePattern::from(config.pulse);
        Self::new(config, TokioPulseScheduler::new(actuator, pattern))
    }

    /// Abort pending pulses and end the session.
    pub fn close(self) -> SessionStats {
        let stats = self.stats;
        self.scheduler.shutdown();
        info!(samples = stats.samples, pulses = stats.pulses_scheduled, "session closed");
        stats
    }
}
