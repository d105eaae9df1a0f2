use wf_core::{EntityHandle, Point3, World};

use crate::clock::SimClock;
use crate::completion::MoveCompletion;
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::EventLog;
use crate::movement::MovementController;
use crate::network::TimeSource;

/// A self-contained host for the movement subsystem.
///
/// Owns the world, clock, event log, and movement controller, and drives
/// the tick loop. Hosts with their own loop can use [`MovementController`]
/// directly with a [`SimContext`] built from their own parts.
pub struct Simulation<W: World> {
    world: W,
    clock: SimClock,
    events: EventLog,
    movement: MovementController,
}

impl<W: World> std::fmt::Debug for Simulation<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.clock.tick())
            .field("active", &self.movement.active_count())
            .field("events", &self.events.len())
            .finish()
    }
}

impl<W: World> Simulation<W> {
    /// Create a new simulation from a world and configuration.
    pub fn new(world: W, config: SimConfig) -> SimResult<Self> {
        Ok(Self {
            world,
            clock: SimClock::new(),
            events: EventLog::new(config.max_events),
            movement: MovementController::new(config.movement)?,
        })
    }

    /// Gate periodic broadcasts on a custom clock.
    pub fn with_time_source(mut self, source: impl TimeSource + 'static) -> Self {
        self.movement = std::mem::take(&mut self.movement).with_time_source(source);
        self
    }

    fn split(&mut self) -> (&mut MovementController, SimContext<'_>) {
        (
            &mut self.movement,
            SimContext::new(&mut self.world, &self.clock, &mut self.events),
        )
    }

    /// Path `entity` to `target`. See [`MovementController::move_to`].
    pub fn move_to(&mut self, entity: EntityHandle, target: Point3) -> SimResult<MoveCompletion> {
        let (movement, mut ctx) = self.split();
        movement.move_to(&mut ctx, entity, target)
    }

    /// Start `entity` moving. See [`MovementController::start_movement`].
    pub fn start_movement(
        &mut self,
        entity: EntityHandle,
        target: Point3,
        path: Option<Vec<Point3>>,
    ) -> SimResult<()> {
        let (movement, mut ctx) = self.split();
        movement.start_movement(&mut ctx, entity, target, path)
    }

    /// Halt `entity`. Returns `false` if it was not moving.
    pub fn stop_movement(&mut self, entity: EntityHandle) -> bool {
        let (movement, mut ctx) = self.split();
        movement.stop_movement(&mut ctx, entity)
    }

    /// Search for a route through the world without moving anything.
    pub fn find_path(&self, start: Point3, end: Point3) -> Option<Vec<Point3>> {
        self.movement.find_path(&self.world, start, end)
    }

    /// Advance the simulation by one tick of `delta_time` seconds.
    pub fn tick(&mut self, delta_time: f64) {
        self.clock.advance(delta_time);
        let (movement, mut ctx) = self.split();
        movement.update(&mut ctx, delta_time);
    }

    /// Advance the simulation by `n` ticks.
    pub fn run(&mut self, n: u64, delta_time: f64) {
        for _ in 0..n {
            self.tick(delta_time);
        }
    }

    /// Tick until no entity is moving or `max_ticks` have run.
    /// Returns the number of ticks taken.
    pub fn run_until_idle(&mut self, max_ticks: u64, delta_time: f64) -> u64 {
        let mut ticks = 0;
        while ticks < max_ticks && self.movement.active_count() > 0 {
            self.tick(delta_time);
            ticks += 1;
        }
        ticks
    }

    /// Borrow the world.
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Mutably borrow the world, e.g. to add entities or obstacles.
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Return the simulation clock.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Return every movement update broadcast so far.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Return the movement controller, for queries.
    pub fn movement(&self) -> &MovementController {
        &self.movement
    }

    /// Extract the world, consuming the simulation.
    pub fn into_world(self) -> W {
        self.world
    }
}
