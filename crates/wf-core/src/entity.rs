use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{WfError, WfResult};
use crate::point::Point3;

/// Opaque identifier for an entity the host world can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub Uuid);

impl EntityHandle {
    /// Generate a new random entity handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// The movement-related slice of an entity's state.
///
/// Only the movement controller writes `position`, `velocity` and
/// `is_moving`; `speed` is fixed for the lifetime of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    /// Current simulated position.
    pub position: Point3,
    /// Current movement per second. Zero when idle.
    pub velocity: Point3,
    /// Maximum linear speed in units per second.
    pub speed: f64,
    /// `true` while the entity has an active path.
    pub is_moving: bool,
}

impl MovementRecord {
    /// Create an idle record at `position` with the given speed.
    pub fn new(position: Point3, speed: f64) -> WfResult<Self> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(WfError::InvalidSpeed(speed));
        }
        Ok(Self {
            position,
            velocity: Point3::ZERO,
            speed,
            is_moving: false,
        })
    }
}
