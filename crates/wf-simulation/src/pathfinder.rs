use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use log::debug;
use wf_core::{Point3, World};

use crate::config::MovementConfig;

/// Neighbour offsets in expansion order: axis steps first, then diagonals.
const NEIGHBORS: [(i64, i64); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Segments shorter than this always have line of sight.
const MIN_SEGMENT: f64 = 1e-9;

type Cell = (i64, i64);

/// An open-list entry. Ordered so that `BinaryHeap` pops the lowest `f`
/// first, then the lowest `h`, then the lowest cell.
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f: f64,
    h: f64,
    cell: Cell,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

/// Grid A* search on the XZ plane with string-pulling.
///
/// Cells are `grid_size` wide and anchored at the origin. Height is carried
/// through from the start point but never affects cost.
#[derive(Debug, Clone)]
pub struct Pathfinder {
    grid_size: f64,
    max_closed_cells: usize,
    line_of_sight_step: f64,
    collision_radius: Option<f64>,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new(&MovementConfig::default())
    }
}

impl Pathfinder {
    /// Build a pathfinder from the search-related parts of `config`.
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            grid_size: config.grid_size,
            max_closed_cells: config.max_closed_cells,
            line_of_sight_step: config.line_of_sight_step,
            collision_radius: config.collision_radius,
        }
    }

    /// Find a walkable route from `start` to `end`.
    ///
    /// The returned waypoints exclude `start` and always end with `end`.
    /// Returns `None` when `end` is blocked, when the open list runs dry, or
    /// when more than `max_closed_cells` cells were closed.
    pub fn find_path(&self, world: &dyn World, start: Point3, end: Point3) -> Option<Vec<Point3>> {
        if self.blocked(world, end) {
            debug!("path search: destination {end} is blocked");
            return None;
        }
        if start.distance_2d(end) < self.grid_size {
            return Some(vec![end]);
        }

        let start_cell = self.cell_of(start);
        let mut g_scores: HashMap<Cell, f64> = HashMap::from([(start_cell, 0.0)]);
        let mut parents: HashMap<Cell, Cell> = HashMap::new();
        let mut closed: HashSet<Cell> = HashSet::new();
        let mut open = BinaryHeap::new();

        let h = self.center(start_cell, start.y).distance_2d(end);
        open.push(OpenNode {
            f: h,
            h,
            cell: start_cell,
        });

        while let Some(OpenNode { cell, .. }) = open.pop() {
            if closed.contains(&cell) {
                continue;
            }
            let g = g_scores.get(&cell).copied().unwrap_or(f64::INFINITY);
            let here = self.center(cell, start.y);

            if here.distance_2d(end) < self.grid_size {
                debug!(
                    "path search: reached {end} from {start} after closing {} cells",
                    closed.len()
                );
                let raw = self.reconstruct(&parents, cell, start, end);
                return Some(self.smooth(world, &raw));
            }

            closed.insert(cell);
            if closed.len() > self.max_closed_cells {
                debug!(
                    "path search: gave up on {start} -> {end} after {} cells",
                    closed.len()
                );
                return None;
            }

            for (dx, dz) in NEIGHBORS {
                let next = (cell.0 + dx, cell.1 + dz);
                if closed.contains(&next) {
                    continue;
                }
                let there = self.center(next, start.y);
                if self.blocked(world, there) {
                    continue;
                }
                let tentative = g + here.distance_2d(there);
                if tentative < g_scores.get(&next).copied().unwrap_or(f64::INFINITY) {
                    g_scores.insert(next, tentative);
                    parents.insert(next, cell);
                    let h = there.distance_2d(end);
                    open.push(OpenNode {
                        f: tentative + h,
                        h,
                        cell: next,
                    });
                }
            }
        }

        debug!(
            "path search: open list exhausted for {start} -> {end} after {} cells",
            closed.len()
        );
        None
    }

    /// Return `true` if nothing blocks the straight segment from `from` to `to`.
    ///
    /// The segment is sampled every `line_of_sight_step` units, end point included.
    pub fn has_line_of_sight(&self, world: &dyn World, from: Point3, to: Point3) -> bool {
        let distance = from.distance_2d(to);
        if distance <= MIN_SEGMENT {
            return true;
        }
        let samples = (distance / self.line_of_sight_step).ceil().max(1.0) as u32;
        (1..=samples).all(|i| {
            let point = from.lerp(to, f64::from(i) / f64::from(samples));
            !self.blocked(world, point)
        })
    }

    fn blocked(&self, world: &dyn World, point: Point3) -> bool {
        world.check_collision(point, self.collision_radius)
    }

    fn cell_of(&self, point: Point3) -> Cell {
        (
            (point.x / self.grid_size).round() as i64,
            (point.z / self.grid_size).round() as i64,
        )
    }

    fn center(&self, cell: Cell, y: f64) -> Point3 {
        Point3::new(
            cell.0 as f64 * self.grid_size,
            y,
            cell.1 as f64 * self.grid_size,
        )
    }

    /// Walk parent links back to the start cell. The start cell is replaced
    /// by the exact start point and `end` is appended.
    fn reconstruct(
        &self,
        parents: &HashMap<Cell, Cell>,
        goal: Cell,
        start: Point3,
        end: Point3,
    ) -> Vec<Point3> {
        let mut cells = vec![goal];
        let mut node = goal;
        while let Some(&prev) = parents.get(&node) {
            cells.push(prev);
            node = prev;
        }
        cells.reverse();

        let mut points = Vec::with_capacity(cells.len() + 1);
        points.push(start);
        points.extend(cells.iter().skip(1).map(|&c| self.center(c, start.y)));
        points.push(end);
        points
    }

    /// Greedy string-pulling: from each anchor jump to the furthest later
    /// point in direct sight. The first point (the start) is dropped.
    fn smooth(&self, world: &dyn World, points: &[Point3]) -> Vec<Point3> {
        let mut out = Vec::new();
        let mut anchor = 0;
        while anchor + 1 < points.len() {
            let mut next = points.len() - 1;
            while next > anchor + 1 && !self.has_line_of_sight(world, points[anchor], points[next]) {
                next -= 1;
            }
            out.push(points[next]);
            anchor = next;
        }
        out
    }
}
