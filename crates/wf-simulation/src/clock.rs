/// Tracks simulation time: a monotonic tick counter and elapsed seconds.
///
/// The clock only moves when the host advances it, so everything stamped
/// with it is reproducible for a fixed sequence of tick durations.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    tick: u64,
    elapsed_seconds: f64,
}

impl SimClock {
    /// Create a clock at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one tick lasting `delta_time` seconds. Returns the new tick number.
    pub fn advance(&mut self, delta_time: f64) -> u64 {
        self.tick += 1;
        self.elapsed_seconds += delta_time;
        self.tick
    }

    /// Return the current tick number.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Total simulated seconds since the clock started.
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }
}
