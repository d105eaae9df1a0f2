use wf_core::{EntityHandle, MovementRecord, World};

use crate::clock::SimClock;
use crate::event::{BroadcastCause, BroadcastSink, MovementEvent};

/// Mutable context passed to the movement controller on every call.
///
/// Borrows the host's world, clock, and broadcast sink for the duration of
/// one command or tick.
pub struct SimContext<'a> {
    /// The host world.
    pub world: &'a mut dyn World,
    /// The simulation clock, used to stamp broadcasts.
    pub clock: &'a SimClock,
    /// Where movement updates are published.
    pub sink: &'a mut dyn BroadcastSink,
}

impl<'a> SimContext<'a> {
    /// Bundle the three collaborators into a context.
    pub fn new(
        world: &'a mut dyn World,
        clock: &'a SimClock,
        sink: &'a mut dyn BroadcastSink,
    ) -> Self {
        Self { world, clock, sink }
    }
}

impl SimContext<'_> {
    /// Publish an entity's current movement state at the current tick.
    pub fn broadcast(&mut self, entity: EntityHandle, record: &MovementRecord, cause: BroadcastCause) {
        self.sink
            .broadcast(MovementEvent::new(self.clock.tick(), entity, record, cause));
    }

    /// Return the current tick number.
    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }
}
