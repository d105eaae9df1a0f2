use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::network::BroadcastClock;

/// Tuning for pathfinding, collision response, and network updates.
///
/// Every field has a default, so a JSON document only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MovementConfig {
    /// Edge length of one search cell, in world units.
    pub grid_size: f64,
    /// The search gives up once more cells than this have been closed.
    pub max_closed_cells: usize,
    /// Spacing of collision samples when testing line of sight.
    pub line_of_sight_step: f64,
    /// Optional inflation passed to every collision query.
    pub collision_radius: Option<f64>,
    /// How far ahead of an entity the collision probe looks.
    pub probe_distance: f64,
    /// Fraction of an entity's speed kept while sliding along an obstacle.
    pub slide_factor: f64,
    /// A waypoint counts as reached inside this planar distance.
    pub arrival_epsilon: f64,
    /// Minimum seconds between periodic position broadcasts, measured on `broadcast_clock`.
    pub broadcast_interval: f64,
    /// Clock the broadcast interval is measured on.
    pub broadcast_clock: BroadcastClock,
    /// When `false`, movement without an explicit path heads straight for the target.
    pub pathfinding: bool,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            grid_size: 1.0,
            max_closed_cells: 1000,
            line_of_sight_step: 0.5,
            collision_radius: None,
            probe_distance: 0.5,
            slide_factor: 0.7,
            arrival_epsilon: 0.01,
            broadcast_interval: 0.05,
            broadcast_clock: BroadcastClock::WallClock,
            pathfinding: true,
        }
    }
}

impl MovementConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> SimResult<()> {
        let positive = [
            ("grid_size", self.grid_size),
            ("line_of_sight_step", self.line_of_sight_step),
            ("probe_distance", self.probe_distance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }
        let non_negative = [
            ("arrival_epsilon", self.arrival_epsilon),
            ("broadcast_interval", self.broadcast_interval),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !(self.slide_factor > 0.0 && self.slide_factor <= 1.0) {
            return Err(SimError::InvalidConfig(format!(
                "slide_factor must be in (0, 1], got {}",
                self.slide_factor
            )));
        }
        if self.max_closed_cells == 0 {
            return Err(SimError::InvalidConfig(
                "max_closed_cells must be at least 1".into(),
            ));
        }
        if let Some(radius) = self
            .collision_radius
            .filter(|r| !r.is_finite() || *r < 0.0)
        {
            return Err(SimError::InvalidConfig(format!(
                "collision_radius must be finite and non-negative, got {radius}"
            )));
        }
        Ok(())
    }

    /// Set the search cell size.
    pub fn with_grid_size(mut self, size: f64) -> Self {
        self.grid_size = size;
        self
    }

    /// Set the closed-cell budget for one search.
    pub fn with_max_closed_cells(mut self, max: usize) -> Self {
        self.max_closed_cells = max;
        self
    }

    /// Set the line-of-sight sampling step.
    pub fn with_line_of_sight_step(mut self, step: f64) -> Self {
        self.line_of_sight_step = step;
        self
    }

    /// Set the radius passed to collision queries.
    pub fn with_collision_radius(mut self, radius: Option<f64>) -> Self {
        self.collision_radius = radius;
        self
    }

    /// Set the look-ahead distance of the collision probe.
    pub fn with_probe_distance(mut self, distance: f64) -> Self {
        self.probe_distance = distance;
        self
    }

    /// Set the speed fraction kept while sliding.
    pub fn with_slide_factor(mut self, factor: f64) -> Self {
        self.slide_factor = factor;
        self
    }

    /// Set the waypoint arrival tolerance.
    pub fn with_arrival_epsilon(mut self, epsilon: f64) -> Self {
        self.arrival_epsilon = epsilon;
        self
    }

    /// Set the minimum seconds between periodic broadcasts.
    pub fn with_broadcast_interval(mut self, seconds: f64) -> Self {
        self.broadcast_interval = seconds;
        self
    }

    /// Choose the clock that gates periodic broadcasts.
    pub fn with_broadcast_clock(mut self, clock: BroadcastClock) -> Self {
        self.broadcast_clock = clock;
        self
    }

    /// Enable or disable pathfinding for movement without an explicit path.
    pub fn with_pathfinding(mut self, enabled: bool) -> Self {
        self.pathfinding = enabled;
        self
    }
}

/// Configuration for a [`crate::Simulation`] host.
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    /// Movement controller tuning.
    pub movement: MovementConfig,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
}

impl SimConfig {
    /// Set the movement controller tuning.
    pub fn with_movement(mut self, movement: MovementConfig) -> Self {
        self.movement = movement;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }
}
