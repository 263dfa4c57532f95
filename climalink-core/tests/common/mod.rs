//! Shared test doubles for the integration tests
//!
//! - Scripted sensor returning queued samples
//! - Scripted collector answering with queued delivery results
//! - Toggleable link
//! - Backlog whose appends can be made to fail

#![allow(dead_code)]

use std::collections::VecDeque;

use climalink_core::backlog::{BacklogError, Line};
use climalink_core::{
    DeliveryPort, DeliveryResult, DurableLog, Identity, IdentityError, IdentityProvider, LinkPort,
    MemoryBacklog, RawSample, Reading, SensorError, SensorPort,
};

/// Sensor that replays a fixed script, then fails
#[derive(Debug, Default)]
pub struct ScriptedSensor {
    samples: VecDeque<Result<RawSample, SensorError>>,
}

impl ScriptedSensor {
    pub fn new(samples: impl IntoIterator<Item = (f32, f32)>) -> Self {
        Self {
            samples: samples
                .into_iter()
                .map(|(t, h)| Ok(RawSample::new(t, h)))
                .collect(),
        }
    }

    pub fn push(&mut self, sample: Result<RawSample, SensorError>) {
        self.samples.push_back(sample);
    }
}

impl SensorPort for ScriptedSensor {
    fn sample(&mut self) -> Result<RawSample, SensorError> {
        self.samples.pop_front().unwrap_or(Err(SensorError::ReadFailed))
    }
}

/// Collector answering from a script, falling back to a default answer
#[derive(Debug)]
pub struct ScriptedCollector {
    answers: VecDeque<DeliveryResult>,
    fallback: DeliveryResult,
    registered: bool,
    registration_works: bool,
    pub registrations: usize,
    pub attempts: Vec<Reading>,
    pub delivered: Vec<Reading>,
}

impl ScriptedCollector {
    /// Registered collector that confirms everything
    pub fn accepting() -> Self {
        Self {
            answers: VecDeque::new(),
            fallback: DeliveryResult::Delivered,
            registered: true,
            registration_works: true,
            registrations: 0,
            attempts: Vec::new(),
            delivered: Vec::new(),
        }
    }

    /// Registered collector that is unreachable
    pub fn offline() -> Self {
        Self {
            fallback: DeliveryResult::TransportFailed("connection refused".into()),
            ..Self::accepting()
        }
    }

    /// Queue answers for the next attempts
    pub fn answering(mut self, answers: impl IntoIterator<Item = DeliveryResult>) -> Self {
        self.answers.extend(answers);
        self
    }

    /// Default answer once the script is used up
    pub fn set_fallback(&mut self, fallback: DeliveryResult) {
        self.fallback = fallback;
    }

    /// Start without credentials
    pub fn unregistered(mut self, registration_works: bool) -> Self {
        self.registered = false;
        self.registration_works = registration_works;
        self
    }
}

impl DeliveryPort for ScriptedCollector {
    fn deliver(&mut self, reading: &Reading) -> DeliveryResult {
        assert!(self.registered, "deliver called without identity");
        self.attempts.push(*reading);
        let answer = self
            .answers
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        if answer.is_delivered() {
            self.delivered.push(*reading);
        }
        answer
    }
}

impl IdentityProvider for ScriptedCollector {
    fn has_identity(&self) -> bool {
        self.registered
    }

    fn acquire_identity(&mut self, name: &str, _location: &str) -> Result<Identity, IdentityError> {
        self.registrations += 1;
        if self.registration_works {
            self.registered = true;
            Ok(Identity {
                sensor_id: format!("{}-id", name),
                api_key: "secret".into(),
            })
        } else {
            Err(IdentityError::Unreachable("timeout".into()))
        }
    }
}

/// Link that can be switched on and off
#[derive(Debug)]
pub struct ToggleLink {
    pub up: bool,
    pub reconnect_succeeds: bool,
    pub reconnects: usize,
}

impl ToggleLink {
    pub fn down() -> Self {
        Self {
            up: false,
            reconnect_succeeds: false,
            reconnects: 0,
        }
    }
}

impl LinkPort for ToggleLink {
    fn is_up(&self) -> bool {
        self.up
    }

    fn reconnect(&mut self) -> bool {
        self.reconnects += 1;
        if self.reconnect_succeeds {
            self.up = true;
        }
        self.up
    }
}

/// Memory backlog whose appends can be made to fail
#[derive(Debug, Default)]
pub struct FlakyBacklog {
    pub inner: MemoryBacklog,
    pub fail_appends: bool,
}

impl DurableLog for FlakyBacklog {
    fn append_line(&mut self, line: &[u8]) -> Result<(), BacklogError> {
        if self.fail_appends {
            return Err(BacklogError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "read-only filesystem",
            )));
        }
        self.inner.append_line(line)
    }

    fn lines(&self) -> Result<Vec<Line>, BacklogError> {
        self.inner.lines()
    }

    fn replace_all(&mut self, lines: &[Line]) -> Result<(), BacklogError> {
        self.inner.replace_all(lines)
    }
}

/// Reading with a distinguishable timestamp
pub fn reading(n: u64) -> Reading {
    Reading::new(20.0 + n as f32 * 0.5, 50.0, 1_000 * n)
}
