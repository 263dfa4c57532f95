//! Replay coordinator - one sample-validate-flush-deliver cycle at a time
//!
//! ## Cycle
//!
//! ```text
//! Idle → Sampling → Validating ─┬─ rejected ──────────────────────────→ Idle
//!                               └─ valid → Flushing → LiveDelivering ─→ Idle
//!                                                       │
//!                                   failed: append to backlog
//! ```
//!
//! - A sensor error or a rejected sample is logged and dropped. Rejected
//!   samples are never buffered.
//! - Before the live attempt the backlog is flushed, so the oldest readings
//!   go out first and the backlog does not keep growing under new data.
//! - A live delivery that is not confirmed is appended to the backlog.
//! - No delivery is attempted without a link and an identity. If either is
//!   missing the reading goes straight to the backlog.
//!
//! ## Baseline
//!
//! The baseline moves only after a confirmed *live* delivery and is persisted
//! right away. Readings delivered from the backlog do not move it, so after
//! a long stretch of only draining the backlog it can be stale.
//!
//! ## Failures
//!
//! Nothing here stops the agent. When the backlog cannot be written the
//! current reading is lost, the coordinator reports degraded buffering and
//! keeps cycling; the next successful append clears it.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use crate::backlog::{DurableLog, FileBacklog, FlushReport};
use crate::baseline::BaselineFile;
use crate::config::AgentConfig;
use crate::errors::Rejection;
use crate::ports::{
    AlwaysConnected, DeliveryPort, DeliveryResult, IdentityProvider, LinkPort, SensorPort,
};
use crate::reading::{Baseline, Reading};
use crate::time::{SystemTime, TimeSource};
use crate::traits::Validator;
use crate::validators::ReadingValidator;

/// Where the coordinator is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// Waiting for the next tick
    Idle,
    /// Reading the sensor
    Sampling,
    /// Checking the sample
    Validating,
    /// Replaying the backlog
    Flushing,
    /// Sending the current reading
    LiveDelivering,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Sampling => "sampling",
            Self::Validating => "validating",
            Self::Flushing => "flushing",
            Self::LiveDelivering => "live-delivering",
        };
        f.write_str(name)
    }
}

/// What one cycle did with its sample
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Sample dropped by validation (or the sensor did not answer)
    Discarded(Rejection),
    /// Live delivery confirmed
    Delivered {
        /// Backlog flush that ran first, `None` if it could not run
        replay: Option<FlushReport>,
    },
    /// Not delivered, queued in the backlog
    Buffered {
        /// Backlog flush that ran first, `None` if it was skipped or failed
        replay: Option<FlushReport>,
    },
    /// Not delivered and the backlog could not take it
    Lost {
        /// Backlog flush that ran first, `None` if it was skipped or failed
        replay: Option<FlushReport>,
    },
}

/// Counters across all cycles
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Cycles started
    pub cycles: u64,
    /// Live deliveries confirmed
    pub delivered: u64,
    /// Backlog entries confirmed during flushes
    pub replayed: u64,
    /// Readings appended to the backlog
    pub buffered: u64,
    /// Samples dropped as out of range, anomalous or duplicate
    pub rejected: u64,
    /// Samples dropped as sensor faults
    pub sensor_faults: u64,
    /// Valid readings lost because the backlog could not be written
    pub samples_lost: u64,
}

/// Name and location used when registering with the collector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRequest {
    /// Sensor name
    pub name: String,
    /// Sensor location
    pub location: String,
}

impl Default for IdentityRequest {
    fn default() -> Self {
        let config = AgentConfig::default();
        Self {
            name: config.sensor_name,
            location: config.sensor_location,
        }
    }
}

/// Drives the agent's operating cycle
///
/// `C` is the collector: it delivers readings and holds the identity.
///
/// ## Example
///
/// ```rust,ignore
/// let mut coordinator = ReplayCoordinator::new(sensor, collector, MemoryBacklog::new())
///     .with_identity("attic", "Kharkiv");
///
/// match coordinator.run_cycle() {
///     CycleOutcome::Buffered { .. } => { /* collector down, retried next cycle */ }
///     _ => {}
/// }
/// ```
pub struct ReplayCoordinator<S, C, L, K = AlwaysConnected> {
    sensor: S,
    collector: C,
    backlog: L,
    link: K,
    validator: ReadingValidator,
    clock: Box<dyn TimeSource>,
    identity: IdentityRequest,
    baseline: Baseline,
    baseline_file: Option<BaselineFile>,
    phase: CyclePhase,
    degraded: bool,
    stats: CoordinatorStats,
}

impl<S, C, L> ReplayCoordinator<S, C, L, AlwaysConnected>
where
    S: SensorPort,
    C: DeliveryPort + IdentityProvider,
    L: DurableLog,
{
    /// Coordinator with default limits, the system clock and an always-up link
    pub fn new(sensor: S, collector: C, backlog: L) -> Self {
        Self {
            sensor,
            collector,
            backlog,
            link: AlwaysConnected,
            validator: ReadingValidator::default(),
            clock: Box::new(SystemTime),
            identity: IdentityRequest::default(),
            baseline: Baseline::none(),
            baseline_file: None,
            phase: CyclePhase::Idle,
            degraded: false,
            stats: CoordinatorStats::default(),
        }
    }
}

impl<S, C> ReplayCoordinator<S, C, FileBacklog, AlwaysConnected>
where
    S: SensorPort,
    C: DeliveryPort + IdentityProvider,
{
    /// Coordinator wired to the files and limits named in `config`
    pub fn from_config(config: &AgentConfig, sensor: S, collector: C) -> Self {
        Self::new(sensor, collector, FileBacklog::new(&config.backlog_path))
            .with_validator(ReadingValidator::new(config.limits))
            .with_identity(&config.sensor_name, &config.sensor_location)
            .with_baseline_file(BaselineFile::new(&config.baseline_path))
    }
}

impl<S, C, L, K> ReplayCoordinator<S, C, L, K>
where
    S: SensorPort,
    C: DeliveryPort + IdentityProvider,
    L: DurableLog,
    K: LinkPort,
{
    /// Gate deliveries on a network link
    pub fn with_link<K2: LinkPort>(self, link: K2) -> ReplayCoordinator<S, C, L, K2> {
        ReplayCoordinator {
            sensor: self.sensor,
            collector: self.collector,
            backlog: self.backlog,
            link,
            validator: self.validator,
            clock: self.clock,
            identity: self.identity,
            baseline: self.baseline,
            baseline_file: self.baseline_file,
            phase: self.phase,
            degraded: self.degraded,
            stats: self.stats,
        }
    }

    /// Use a custom validator
    pub fn with_validator(mut self, validator: ReadingValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Use a custom clock for stamping samples
    pub fn with_clock(mut self, clock: impl TimeSource + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Name and location to register under
    pub fn with_identity(mut self, name: impl Into<String>, location: impl Into<String>) -> Self {
        self.identity = IdentityRequest {
            name: name.into(),
            location: location.into(),
        };
        self
    }

    /// Start from a known baseline
    pub fn with_baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = baseline;
        self
    }

    /// Load the baseline from `file` and persist every change to it
    pub fn with_baseline_file(mut self, file: BaselineFile) -> Self {
        self.baseline = file.load_or_default();
        self.baseline_file = Some(file);
        self
    }

    /// Last confirmed delivered reading
    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Current phase
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Counters so far
    pub fn stats(&self) -> &CoordinatorStats {
        &self.stats
    }

    /// True after a failed append, until an append succeeds again
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// The sensor port
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// The collector
    pub fn collector(&self) -> &C {
        &self.collector
    }

    /// The collector, mutably
    pub fn collector_mut(&mut self) -> &mut C {
        &mut self.collector
    }

    /// The backlog
    pub fn backlog(&self) -> &L {
        &self.backlog
    }

    /// The backlog, mutably
    pub fn backlog_mut(&mut self) -> &mut L {
        &mut self.backlog
    }

    /// The link
    pub fn link_mut(&mut self) -> &mut K {
        &mut self.link
    }

    /// Run one full cycle and return to idle
    pub fn run_cycle(&mut self) -> CycleOutcome {
        self.stats.cycles += 1;
        let outcome = self.cycle();
        self.enter(CyclePhase::Idle);
        outcome
    }

    /// Repeat cycles every `interval` until `keep_running` says stop
    ///
    /// Single-threaded: the next cycle starts only after the previous one
    /// returned, however long its delivery took.
    pub fn run<F>(&mut self, interval: Duration, mut keep_running: F)
    where
        F: FnMut(&CycleOutcome) -> bool,
    {
        log::info!("agent loop started, interval {:?}", interval);
        loop {
            let started = Instant::now();
            let outcome = self.run_cycle();
            if !keep_running(&outcome) {
                break;
            }
            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        log::info!("agent loop stopped after {} cycle(s)", self.stats.cycles);
    }

    fn cycle(&mut self) -> CycleOutcome {
        self.enter(CyclePhase::Sampling);
        let raw = match self.sensor.sample() {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("sensor read failed: {}", err);
                self.stats.sensor_faults += 1;
                return CycleOutcome::Discarded(Rejection::SensorFault);
            }
        };
        let sample = raw.at(self.clock.now());

        self.enter(CyclePhase::Validating);
        let reading = match self.validator.validate(&sample, &self.baseline) {
            Ok(reading) => reading,
            Err(rejection) => {
                log::warn!("sample discarded ({}): {}", rejection.label(), rejection);
                if rejection == Rejection::SensorFault {
                    self.stats.sensor_faults += 1;
                } else {
                    self.stats.rejected += 1;
                }
                return CycleOutcome::Discarded(rejection);
            }
        };

        if !self.ready_to_deliver() {
            return self.buffer(&reading, None);
        }

        self.enter(CyclePhase::Flushing);
        let replay = self.replay_backlog();

        self.enter(CyclePhase::LiveDelivering);
        match self.collector.deliver(&reading) {
            DeliveryResult::Delivered => {
                self.confirm_delivery(&reading);
                CycleOutcome::Delivered { replay }
            }
            failed => {
                log::warn!("live delivery not confirmed: {}", failed);
                self.buffer(&reading, replay)
            }
        }
    }

    fn enter(&mut self, phase: CyclePhase) {
        if self.phase != phase {
            log::debug!("{} -> {}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// Link up and identity held; never deliver without both
    fn ready_to_deliver(&mut self) -> bool {
        if !self.link.is_up() && !self.link.reconnect() {
            log::warn!("link down, buffering reading");
            return false;
        }

        if !self.collector.has_identity() {
            match self
                .collector
                .acquire_identity(&self.identity.name, &self.identity.location)
            {
                Ok(identity) => log::info!("registered as sensor {}", identity.sensor_id),
                Err(err) => {
                    log::warn!("no identity, buffering reading: {}", err);
                    return false;
                }
            }
        }

        true
    }

    fn replay_backlog(&mut self) -> Option<FlushReport> {
        let collector = &mut self.collector;
        match self.backlog.flush(|reading| collector.deliver(reading)) {
            Ok(report) => {
                if report.delivered > 0 || report.kept > 0 {
                    log::info!("backlog flush: {}", report);
                }
                self.stats.replayed += report.delivered as u64;
                Some(report)
            }
            Err(err) => {
                log::error!("backlog flush failed: {}", err);
                None
            }
        }
    }

    fn confirm_delivery(&mut self, reading: &Reading) {
        self.stats.delivered += 1;
        self.baseline.record_delivery(reading);
        if let Some(file) = &self.baseline_file {
            if let Err(err) = file.save(&self.baseline) {
                log::error!("could not persist baseline: {}", err);
            }
        }
        log::info!(
            "delivered reading t={} h={} at {}",
            reading.temperature,
            reading.humidity,
            reading.timestamp
        );
    }

    fn buffer(&mut self, reading: &Reading, replay: Option<FlushReport>) -> CycleOutcome {
        match self.backlog.append(reading) {
            Ok(()) => {
                if self.degraded {
                    log::info!("backlog writable again, buffering restored");
                    self.degraded = false;
                }
                self.stats.buffered += 1;
                CycleOutcome::Buffered { replay }
            }
            Err(err) => {
                log::error!("reading lost, backlog append failed: {}", err);
                self.degraded = true;
                self.stats.samples_lost += 1;
                CycleOutcome::Lost { replay }
            }
        }
    }
}
