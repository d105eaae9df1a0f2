use std::collections::{HashMap, HashSet};

use crate::entity::{EntityHandle, MovementRecord};
use crate::error::{WfError, WfResult};
use crate::point::Point3;

/// The host world as seen by the movement subsystem.
///
/// The subsystem only resolves entity handles to their movement records and
/// asks whether a point is blocked. Everything else about the world (combat,
/// persistence, generation) stays with the host.
pub trait World {
    /// Look up the movement record for `handle`, if the entity still exists.
    fn resolve_entity(&self, handle: EntityHandle) -> Option<&MovementRecord>;

    /// Mutable access to the movement record for `handle`.
    fn resolve_entity_mut(&mut self, handle: EntityHandle) -> Option<&mut MovementRecord>;

    /// Return `true` if `point`, optionally inflated by `radius`, is blocked.
    fn check_collision(&self, point: Point3, radius: Option<f64>) -> bool;
}

/// An in-memory world made of square cells on the XZ plane.
///
/// A point belongs to the cell obtained by rounding `x / cell_size` and
/// `z / cell_size` to the nearest integer. Height is ignored.
#[derive(Debug, Clone)]
pub struct GridWorld {
    cell_size: f64,
    blocked: HashSet<(i64, i64)>,
    entities: HashMap<EntityHandle, MovementRecord>,
}

impl Default for GridWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl GridWorld {
    /// Create an empty world with 1-unit cells.
    pub fn new() -> Self {
        Self {
            cell_size: 1.0,
            blocked: HashSet::new(),
            entities: HashMap::new(),
        }
    }

    /// Create an empty world with a custom cell size.
    pub fn with_cell_size(cell_size: f64) -> WfResult<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(WfError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            ..Self::new()
        })
    }

    /// Return the edge length of one cell.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Return the cell containing `point`.
    pub fn cell_of(&self, point: Point3) -> (i64, i64) {
        (
            (point.x / self.cell_size).round() as i64,
            (point.z / self.cell_size).round() as i64,
        )
    }

    /// Mark a cell as impassable.
    pub fn block_cell(&mut self, x: i64, z: i64) {
        self.blocked.insert((x, z));
    }

    /// Make a cell passable again. Returns `true` if it was blocked.
    pub fn unblock_cell(&mut self, x: i64, z: i64) -> bool {
        self.blocked.remove(&(x, z))
    }

    /// Block every cell in the inclusive rectangle between two corners.
    pub fn block_rect(&mut self, from: (i64, i64), to: (i64, i64)) {
        let (x0, x1) = (from.0.min(to.0), from.0.max(to.0));
        let (z0, z1) = (from.1.min(to.1), from.1.max(to.1));
        for x in x0..=x1 {
            for z in z0..=z1 {
                self.blocked.insert((x, z));
            }
        }
    }

    /// Return `true` if the given cell is impassable.
    pub fn is_cell_blocked(&self, x: i64, z: i64) -> bool {
        self.blocked.contains(&(x, z))
    }

    /// Return the number of blocked cells.
    pub fn blocked_count(&self) -> usize {
        self.blocked.len()
    }

    /// Add an entity under a freshly generated handle.
    pub fn spawn(&mut self, record: MovementRecord) -> EntityHandle {
        let handle = EntityHandle::new();
        self.entities.insert(handle, record);
        handle
    }

    /// Insert or replace the record stored under `handle`.
    pub fn insert_entity(&mut self, handle: EntityHandle, record: MovementRecord) {
        self.entities.insert(handle, record);
    }

    /// Remove an entity, returning its last record.
    pub fn remove_entity(&mut self, handle: EntityHandle) -> WfResult<MovementRecord> {
        self.entities
            .remove(&handle)
            .ok_or(WfError::EntityNotFound(handle))
    }

    /// Return the number of entities in the world.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterate over all entities and their records.
    pub fn entities(&self) -> impl Iterator<Item = (&EntityHandle, &MovementRecord)> {
        self.entities.iter()
    }

    fn point_blocked(&self, point: Point3) -> bool {
        let (x, z) = self.cell_of(point);
        self.is_cell_blocked(x, z)
    }
}

impl World for GridWorld {
    fn resolve_entity(&self, handle: EntityHandle) -> Option<&MovementRecord> {
        self.entities.get(&handle)
    }

    fn resolve_entity_mut(&mut self, handle: EntityHandle) -> Option<&mut MovementRecord> {
        self.entities.get_mut(&handle)
    }

    fn check_collision(&self, point: Point3, radius: Option<f64>) -> bool {
        if self.point_blocked(point) {
            return true;
        }
        match radius {
            Some(r) if r > 0.0 => [(r, 0.0), (-r, 0.0), (0.0, r), (0.0, -r)]
                .into_iter()
                .any(|(dx, dz)| self.point_blocked(point + Point3::new(dx, 0.0, dz))),
            _ => false,
        }
    }
}
