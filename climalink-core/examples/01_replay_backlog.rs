//! Backlog Replay Example
//!
//! Runs the coordinator against a simulated sensor and a collector that is
//! offline for the first few attempts. Readings taken while offline land in
//! a file backlog and go out, oldest first, once the collector is back.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_replay_backlog
//! ```

use std::collections::VecDeque;

use climalink_core::time::FixedTime;
use climalink_core::{
    AgentConfig, CycleOutcome, DeliveryPort, DeliveryResult, Identity, IdentityError,
    IdentityProvider, RawSample, Reading, ReplayCoordinator, SensorError, SensorPort,
};

/// Prints `log` records to stderr
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Slowly warming room with one glitch
struct SimulatedSensor {
    samples: VecDeque<(f32, f32)>,
}

impl SensorPort for SimulatedSensor {
    fn sample(&mut self) -> Result<RawSample, SensorError> {
        self.samples
            .pop_front()
            .map(|(t, h)| RawSample::new(t, h))
            .ok_or(SensorError::NotInitialized)
    }
}

/// Collector that refuses connections for its first `offline_for` attempts
struct FlakyCollector {
    attempts: usize,
    offline_for: usize,
    identity: Option<Identity>,
    received: Vec<Reading>,
}

impl DeliveryPort for FlakyCollector {
    fn deliver(&mut self, reading: &Reading) -> DeliveryResult {
        self.attempts += 1;
        if self.attempts <= self.offline_for {
            return DeliveryResult::TransportFailed("connection refused".into());
        }
        self.received.push(*reading);
        DeliveryResult::Delivered
    }
}

impl IdentityProvider for FlakyCollector {
    fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    fn acquire_identity(&mut self, name: &str, location: &str) -> Result<Identity, IdentityError> {
        println!("  registering '{}' at '{}'", name, location);
        let identity = Identity {
            sensor_id: "7".into(),
            api_key: "demo-key".into(),
        };
        self.identity = Some(identity.clone());
        Ok(identity)
    }
}

fn main() {
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(log::LevelFilter::Info));

    println!("Climalink Backlog Replay Example");
    println!("===============================\n");

    let dir = std::env::temp_dir().join("climalink-replay-example");
    let _ = std::fs::remove_dir_all(&dir);
    let config = AgentConfig {
        backlog_path: dir.join("backlog.jsonl"),
        baseline_path: dir.join("baseline.json"),
        sensor_name: "greenhouse-north".into(),
        sensor_location: "Kharkiv".into(),
        ..AgentConfig::default()
    };

    let sensor = SimulatedSensor {
        samples: VecDeque::from(vec![
            (20.0, 50.0),
            (20.6, 51.0),
            (45.0, 51.0), // glitch
            (21.2, 52.0),
            (21.8, 53.0),
            (21.85, 53.05), // nothing new
            (22.4, 54.0),
        ]),
    };
    let collector = FlakyCollector {
        attempts: 0,
        offline_for: 3,
        identity: None,
        received: Vec::new(),
    };

    let mut agent = ReplayCoordinator::from_config(&config, sensor, collector)
        .with_clock(FixedTime::new(1_700_000_000_000).with_step(180_000));

    for cycle in 1..=7 {
        let summary = match agent.run_cycle() {
            CycleOutcome::Discarded(rejection) => format!("discarded: {}", rejection),
            CycleOutcome::Delivered { replay } => format!("delivered, replay {:?}", replay),
            CycleOutcome::Buffered { replay } => format!("buffered, replay {:?}", replay),
            CycleOutcome::Lost { .. } => "lost".to_string(),
        };
        println!("cycle {}: {}", cycle, summary);
    }

    println!("\nCollector received, in order:");
    for reading in &agent.collector().received {
        println!(
            "  t={} {:.2}°C {:.2}%",
            reading.timestamp, reading.temperature, reading.humidity
        );
    }
    println!("\nStats: {:?}", agent.stats());
    println!("Backlog file present: {}", agent.backlog().exists());

    let _ = std::fs::remove_dir_all(&dir);
}
