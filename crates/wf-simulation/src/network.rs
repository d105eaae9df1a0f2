use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Which clock gates periodic broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastClock {
    /// Real elapsed time, independent of tick length.
    #[default]
    WallClock,
    /// The sum of tick durations. Reproducible for a fixed tick sequence.
    Simulated,
}

/// A monotonic source of seconds for the broadcast throttle.
pub trait TimeSource: fmt::Debug {
    /// Seconds since the source started, after a tick of `delta_time` seconds.
    fn now(&mut self, delta_time: f64) -> f64;
}

/// Reads [`Instant`]; ignores tick durations.
#[derive(Debug, Clone, Copy)]
pub struct WallClockSource {
    started: Instant,
}

impl WallClockSource {
    /// Start counting from now.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for WallClockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallClockSource {
    fn now(&mut self, _delta_time: f64) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Sums tick durations.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedSource {
    elapsed: f64,
}

impl TimeSource for SimulatedSource {
    fn now(&mut self, delta_time: f64) -> f64 {
        self.elapsed += delta_time;
        self.elapsed
    }
}

/// Rate limiter for periodic position broadcasts.
///
/// Fires at most once per interval of its time source. State transitions
/// (start, stop, arrival) bypass it and are broadcast at once.
#[derive(Debug)]
pub struct NetworkScheduler {
    interval: f64,
    last_emitted: f64,
    source: Box<dyn TimeSource>,
}

impl NetworkScheduler {
    /// Create a scheduler that fires every `interval` seconds of `clock`.
    pub fn new(interval: f64, clock: BroadcastClock) -> Self {
        match clock {
            BroadcastClock::WallClock => Self::with_source(interval, WallClockSource::new()),
            BroadcastClock::Simulated => Self::with_source(interval, SimulatedSource::default()),
        }
    }

    /// Create a scheduler driven by a custom time source.
    pub fn with_source(interval: f64, source: impl TimeSource + 'static) -> Self {
        Self {
            interval,
            last_emitted: 0.0,
            source: Box::new(source),
        }
    }

    /// Account for a tick of `delta_time` seconds. Returns `true` when a
    /// periodic broadcast is due.
    pub fn advance(&mut self, delta_time: f64) -> bool {
        let now = self.source.now(delta_time);
        if now - self.last_emitted >= self.interval {
            self.last_emitted = now;
            true
        } else {
            false
        }
    }
}
