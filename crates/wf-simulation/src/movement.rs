use std::collections::{BTreeMap, HashMap, VecDeque};

use log::{debug, info, warn};
use tokio::sync::oneshot;
use wf_core::{EntityHandle, MovementRecord, Point3, World};

use crate::completion::{self, MoveCompletion, MovementOutcome};
use crate::config::MovementConfig;
use crate::context::SimContext;
use crate::error::{SimError, SimResult};
use crate::event::BroadcastCause;
use crate::network::{NetworkScheduler, TimeSource};
use crate::pathfinder::Pathfinder;

/// Per-entity state for an entity that is currently moving.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveMovement {
    target: Point3,
    path: VecDeque<Point3>,
    last_slide: Option<Point3>,
}

/// What one tick did to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Moved,
    Slid,
    Arrived,
    Blocked,
}

impl ActiveMovement {
    fn new(target: Point3, mut path: Vec<Point3>) -> Self {
        if path.last() != Some(&target) {
            path.push(target);
        }
        Self {
            target,
            path: path.into(),
            last_slide: None,
        }
    }

    /// The final destination.
    pub fn target(&self) -> Point3 {
        self.target
    }

    /// Remaining waypoints, next one first. The last is always the target.
    pub fn path(&self) -> &VecDeque<Point3> {
        &self.path
    }

    /// Direction of the slide taken on the previous tick, if it slid.
    pub fn last_slide(&self) -> Option<Point3> {
        self.last_slide
    }

    /// Integrate one tick of movement for `record`.
    fn advance(
        &mut self,
        config: &MovementConfig,
        world: &dyn World,
        record: &mut MovementRecord,
        delta_time: f64,
    ) -> Step {
        while let Some(&head) = self.path.front() {
            if record.position.distance_2d(head) > config.arrival_epsilon {
                break;
            }
            self.path.pop_front();
            if self.path.is_empty() {
                record.position = head;
                return Step::Arrived;
            }
        }
        let Some(&head) = self.path.front() else {
            record.position = self.target;
            return Step::Arrived;
        };
        // a stationary entity never closes the gap
        if record.speed <= 0.0 {
            return Step::Blocked;
        }

        let direction = (head - record.position).normalize();
        let probe = record.position + direction * config.probe_distance;
        if world.check_collision(probe, config.collision_radius) {
            return self.slide(config, world, record, direction, delta_time);
        }

        self.last_slide = None;
        record.velocity = direction * record.speed;
        let remaining = (head - record.position).length();
        if record.speed * delta_time >= remaining {
            record.position = head;
            self.path.pop_front();
            match self.path.front() {
                None => return Step::Arrived,
                Some(&next) => {
                    record.velocity = (next - record.position).normalize() * record.speed;
                }
            }
        } else {
            record.position = record.position + record.velocity * delta_time;
        }
        Step::Moved
    }

    /// Try to move along the obstacle instead of into it.
    ///
    /// Left perpendicular first, then right, each probed from the current
    /// position. Turning back against last tick's slide means the entity is
    /// pinned between two faces, which counts as blocked.
    fn slide(
        &mut self,
        config: &MovementConfig,
        world: &dyn World,
        record: &mut MovementRecord,
        direction: Point3,
        delta_time: f64,
    ) -> Step {
        let left = Point3::new(-direction.z, 0.0, direction.x).normalize();
        let right = Point3::new(direction.z, 0.0, -direction.x).normalize();
        let Some(along) = [left, right].into_iter().find(|side| {
            let probe = record.position + *side * config.probe_distance;
            !world.check_collision(probe, config.collision_radius)
        }) else {
            return Step::Blocked;
        };
        if self
            .last_slide
            .is_some_and(|previous| previous.dot_2d(along) < 0.0)
        {
            return Step::Blocked;
        }

        self.last_slide = Some(along);
        record.velocity = along * (record.speed * config.slide_factor);
        record.position = record.position + record.velocity * delta_time;
        Step::Slid
    }
}

/// Owns the set of moving entities and advances them every tick.
///
/// Entities are processed in handle order, so a run is reproducible for a
/// fixed world and sequence of tick durations.
#[derive(Debug)]
pub struct MovementController {
    config: MovementConfig,
    pathfinder: Pathfinder,
    active: BTreeMap<EntityHandle, ActiveMovement>,
    waiters: HashMap<EntityHandle, Vec<oneshot::Sender<MovementOutcome>>>,
    scheduler: NetworkScheduler,
}

impl Default for MovementController {
    fn default() -> Self {
        Self::build(MovementConfig::default())
    }
}

impl MovementController {
    /// Create a controller after validating `config`.
    pub fn new(config: MovementConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: MovementConfig) -> Self {
        Self {
            pathfinder: Pathfinder::new(&config),
            scheduler: NetworkScheduler::new(config.broadcast_interval, config.broadcast_clock),
            config,
            active: BTreeMap::new(),
            waiters: HashMap::new(),
        }
    }

    /// Replace the clock that gates periodic broadcasts.
    pub fn with_time_source(mut self, source: impl TimeSource + 'static) -> Self {
        self.scheduler = NetworkScheduler::with_source(self.config.broadcast_interval, source);
        self
    }

    /// The configuration this controller runs with.
    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Return `true` if `entity` is currently moving.
    pub fn is_active(&self, entity: EntityHandle) -> bool {
        self.active.contains_key(&entity)
    }

    /// Return the number of moving entities.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Return the movement state of `entity`, if it is moving.
    pub fn active_entry(&self, entity: EntityHandle) -> Option<&ActiveMovement> {
        self.active.get(&entity)
    }

    /// Search for a route through `world`. See [`Pathfinder::find_path`].
    pub fn find_path(&self, world: &dyn World, start: Point3, end: Point3) -> Option<Vec<Point3>> {
        self.pathfinder.find_path(world, start, end)
    }

    /// Path to `target` and start moving there.
    ///
    /// Fails with [`SimError::PathNotFound`] when no route exists. The
    /// returned handle resolves when the entity leaves the active set for
    /// any reason.
    pub fn move_to(
        &mut self,
        ctx: &mut SimContext<'_>,
        entity: EntityHandle,
        target: Point3,
    ) -> SimResult<MoveCompletion> {
        let record = ctx
            .world
            .resolve_entity(entity)
            .copied()
            .ok_or(SimError::EntityNotFound(entity))?;
        let path = self
            .pathfinder
            .find_path(&*ctx.world, record.position, target)
            .ok_or(SimError::PathNotFound {
                from: record.position,
                to: target,
            })?;

        self.start_movement(ctx, entity, target, Some(path))?;
        let (sender, completion) = completion::channel();
        self.waiters.entry(entity).or_default().push(sender);
        Ok(completion)
    }

    /// Register `entity` as moving toward `target` and broadcast at once.
    ///
    /// Without a path, one is searched for (unless pathfinding is disabled);
    /// if none is found the entity heads straight for `target`. A supplied
    /// path gets `target` appended when it does not already end there.
    /// Calling this on a moving entity replaces its route and keeps any
    /// pending completions attached.
    pub fn start_movement(
        &mut self,
        ctx: &mut SimContext<'_>,
        entity: EntityHandle,
        target: Point3,
        path: Option<Vec<Point3>>,
    ) -> SimResult<()> {
        let mut record = ctx
            .world
            .resolve_entity(entity)
            .copied()
            .ok_or(SimError::EntityNotFound(entity))?;

        let path = match path {
            Some(path) => path,
            None if self.config.pathfinding => self
                .pathfinder
                .find_path(&*ctx.world, record.position, target)
                .unwrap_or_else(|| {
                    warn!("entity {entity}: no path to {target}, moving directly");
                    vec![target]
                }),
            None => vec![target],
        };
        let movement = ActiveMovement::new(target, path);

        let first = movement.path.front().copied().unwrap_or(target);
        record.velocity = (first - record.position).normalize() * record.speed;
        record.is_moving = true;
        *ctx
            .world
            .resolve_entity_mut(entity)
            .ok_or(SimError::EntityNotFound(entity))? = record;

        debug!(
            "entity {entity}: moving to {target} via {} waypoint(s)",
            movement.path.len()
        );
        if self.active.insert(entity, movement).is_some() {
            debug!("entity {entity}: retargeted");
        }
        ctx.broadcast(entity, &record, BroadcastCause::Started);
        Ok(())
    }

    /// Halt `entity` where it stands. Returns `false` if it was not moving.
    pub fn stop_movement(&mut self, ctx: &mut SimContext<'_>, entity: EntityHandle) -> bool {
        if !self.active.contains_key(&entity) {
            return false;
        }
        info!("entity {entity}: stopped");
        self.finish(ctx, entity, MovementOutcome::Stopped);
        true
    }

    /// Advance every moving entity by `delta_time` seconds and emit the
    /// throttled periodic broadcast when it is due.
    pub fn update(&mut self, ctx: &mut SimContext<'_>, delta_time: f64) {
        let entities: Vec<EntityHandle> = self.active.keys().copied().collect();
        for entity in entities {
            let Some(mut record) = ctx.world.resolve_entity(entity).copied() else {
                warn!("entity {entity}: no longer in the world, dropping its movement");
                self.finish(ctx, entity, MovementOutcome::Vanished);
                continue;
            };
            let Some(movement) = self.active.get_mut(&entity) else {
                continue;
            };

            let step = movement.advance(&self.config, &*ctx.world, &mut record, delta_time);
            if let Some(slot) = ctx.world.resolve_entity_mut(entity) {
                *slot = record;
            }

            match step {
                Step::Moved | Step::Slid => {}
                Step::Arrived => {
                    info!("entity {entity}: arrived at {}", record.position);
                    self.finish(ctx, entity, MovementOutcome::Arrived);
                }
                Step::Blocked => {
                    warn!("entity {entity}: blocked at {}", record.position);
                    self.finish(ctx, entity, MovementOutcome::Blocked);
                }
            }
        }

        if self.scheduler.advance(delta_time) {
            for &entity in self.active.keys() {
                if let Some(record) = ctx.world.resolve_entity(entity).copied() {
                    ctx.broadcast(entity, &record, BroadcastCause::Periodic);
                }
            }
        }
    }

    /// Remove `entity` from the active set, idle its record, and resolve
    /// any completions waiting on it.
    fn finish(&mut self, ctx: &mut SimContext<'_>, entity: EntityHandle, outcome: MovementOutcome) {
        self.active.remove(&entity);

        let idle = ctx.world.resolve_entity_mut(entity).map(|record| {
            record.velocity = Point3::ZERO;
            record.is_moving = false;
            *record
        });
        let cause = match outcome {
            MovementOutcome::Arrived => Some(BroadcastCause::Arrived),
            MovementOutcome::Stopped => Some(BroadcastCause::Stopped),
            MovementOutcome::Blocked => Some(BroadcastCause::Blocked),
            MovementOutcome::Vanished | MovementOutcome::Abandoned => None,
        };
        if let (Some(record), Some(cause)) = (idle, cause) {
            ctx.broadcast(entity, &record, cause);
        }

        for sender in self.waiters.remove(&entity).unwrap_or_default() {
            // The caller may have dropped its handle.
            let _ = sender.send(outcome);
        }
    }
}
