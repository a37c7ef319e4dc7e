//! Haptic pulse actuation and delayed scheduling.
//!
//! The estimator only decides *when*; this module owns the side effects:
//! - [`HapticActuator`]: fire one pulse right now
//! - [`PulseScheduler`]: fire one pulse now or after a relative delay
//!
//! Scheduling never blocks the caller. Each delayed pulse runs on its own
//! tokio task and fires exactly once. Pulses are independent: a new request
//! does not cancel one that is still pending, so overlapping pulses are
//! possible when the swing period is shorter than the lead.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::PulseConfig;
use crate::error::{Error, Result};

/// Fixed-shape one-shot vibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulsePattern {
    pub duration_ms: u64,
    pub amplitude: u8,
}

impl From<PulseConfig> for PulsePattern {
    fn from(config: PulseConfig) -> Self {
        Self {
            duration_ms: config.duration_ms,
            amplitude: config.amplitude,
        }
    }
}

impl Default for PulsePattern {
    fn default() -> Self {
        PulseConfig::default().into()
    }
}

/// The platform's vibration motor.
pub trait HapticActuator: Send + Sync {
    /// Fire `pattern` immediately.
    fn pulse(&self, pattern: PulsePattern) -> Result<()>;
}

impl<A: HapticActuator + ?Sized> HapticActuator for Arc<A> {
    fn pulse(&self, pattern: PulsePattern) -> Result<()> {
        (**self).pulse(pattern)
    }
}

/// Sink for "pulse now" and "pulse after N ms" commands.
pub trait PulseScheduler {
    fn fire_now(&self);

    fn fire_after(&self, lead_ms: u64);
}

/// Actuator that only logs. Used by the CLI where there is no motor.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingActuator;

impl HapticActuator for LoggingActuator {
    fn pulse(&self, pattern: PulsePattern) -> Result<()> {
        info!(
            duration_ms = pattern.duration_ms,
            amplitude = pattern.amplitude,
            "pulse"
        );
        Ok(())
    }
}

/// Actuator that remembers every pulse and when it fired.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    pulses: Mutex<Vec<(Instant, PulsePattern)>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pulses fired so far.
    pub fn count(&self) -> usize {
        self.pulses.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Snapshot of the fired pulses, in firing order.
    pub fn pulses(&self) -> Vec<(Instant, PulsePattern)> {
        self.pulses.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl HapticActuator for RecordingActuator {
    fn pulse(&self, pattern: PulsePattern) -> Result<()> {
        self.pulses
            .lock()
            .map_err(|_| Error::Actuator("pulse log poisoned".into()))?
            .push((Instant::now(), pattern));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PulseCounters {
    pending: AtomicUsize,
    fired: AtomicU64,
    failed: AtomicU64,
}

/// Holds one unit of `pending` for as long as a pulse task is waiting.
/// Released on fire and on abort alike, since aborting drops the future.
struct PendingGuard(Arc<PulseCounters>);

impl PendingGuard {
    fn acquire(counters: Arc<PulseCounters>) -> Self {
        counters.pending.fetch_add(1, Ordering::AcqRel);
        Self(counters)
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.pending.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Schedules pulses on a tokio runtime.
///
/// Must be created inside a runtime context (or given a [`Handle`]).
pub struct TokioPulseScheduler<A: HapticActuator + 'static> {
    actuator: Arc<A>,
    pattern: PulsePattern,
    runtime: Handle,
    counters: Arc<PulseCounters>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<A: HapticActuator + 'static> TokioPulseScheduler<A> {
    /// Create a scheduler on the current runtime.
    ///
    /// Panics outside a tokio runtime, like `tokio::spawn`.
    pub fn new(actuator: A, pattern: PulsePattern) -> Self {
        Self::with_handle(actuator, pattern, Handle::current())
    }

    pub fn with_handle(actuator: A, pattern: PulsePattern, runtime: Handle) -> Self {
        Self {
            actuator: Arc::new(actuator),
            pattern,
            runtime,
            counters: Arc::new(PulseCounters::default()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn pattern(&self) -> PulsePattern {
        self.pattern
    }

    /// Pulses scheduled but not yet fired.
    pub fn pending(&self) -> usize {
        self.counters.pending.load(Ordering::Acquire)
    }

    /// Pulses the actuator accepted.
    pub fn fired(&self) -> u64 {
        self.counters.fired.load(Ordering::Acquire)
    }

    /// Pulses the actuator rejected.
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Acquire)
    }

    /// Abort every pending pulse. Pulses already fired are unaffected.
    ///
    /// `pending()` drops to zero once the runtime has reaped the aborted tasks.
    pub fn shutdown(&self) {
        let tasks = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(_) => return,
        };
        let mut aborted = 0usize;
        for task in tasks {
            if !task.is_finished() {
                task.abort();
                aborted += 1;
            }
        }
        if aborted > 0 {
            info!(aborted, "pending pulses cancelled");
        }
    }

    fn spawn(&self, delay: Duration) {
        let actuator = Arc::clone(&self.actuator);
        let counters = Arc::clone(&self.counters);
        let pattern = self.pattern;

        let pending = PendingGuard::acquire(Arc::clone(&counters));
        let task = self.runtime.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            drop(pending);
            match actuator.pulse(pattern) {
                Ok(()) => {
                    counters.fired.fetch_add(1, Ordering::AcqRel);
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::AcqRel);
                    warn!("pulse failed: {}", e);
                }
            }
        });

        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.retain(|t| !t.is_finished());
            tasks.push(task);
        }
    }
}

impl<A: HapticActuator + 'static> PulseScheduler for TokioPulseScheduler<A> {
    fn fire_now(&self) {
        self.spawn(Duration::ZERO);
    }

    fn fire_after(&self, lead_ms: u64) {
        self.spawn(Duration::from_millis(lead_ms));
    }
}

impl<S: PulseScheduler + ?Sized> PulseScheduler for Arc<S> {
    fn fire_now(&self) {
        (**self).fire_now()
    }

    fn fire_after(&self, lead_ms: u64) {
        (**self).fire_after(lead_ms)
    }
}
