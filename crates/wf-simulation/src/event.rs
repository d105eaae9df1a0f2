use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wf_core::{EntityHandle, MovementRecord, Point3};

/// The message type carried by a [`MovementEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// An entity's position or velocity changed.
    EntityMoved,
}

/// Why a movement update was broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastCause {
    /// A movement was started or retargeted.
    Started,
    /// The throttled update stream for active entities.
    Periodic,
    /// The movement was cancelled explicitly.
    Stopped,
    /// The entity reached its final waypoint.
    Arrived,
    /// The entity could neither advance nor slide.
    Blocked,
}

/// A position/velocity update published to the network layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementEvent {
    /// Always [`EventKind::EntityMoved`].
    pub kind: EventKind,
    /// The simulation tick when the update was produced.
    pub tick: u64,
    /// The entity that moved.
    pub entity: EntityHandle,
    /// Position at the time of the update.
    pub position: Point3,
    /// Velocity at the time of the update. Zero once the entity is idle.
    pub velocity: Point3,
    /// What triggered the update.
    pub cause: BroadcastCause,
}

impl MovementEvent {
    /// Build an update from an entity's current movement record.
    pub fn new(
        tick: u64,
        entity: EntityHandle,
        record: &MovementRecord,
        cause: BroadcastCause,
    ) -> Self {
        Self {
            kind: EventKind::EntityMoved,
            tick,
            entity,
            position: record.position,
            velocity: record.velocity,
            cause,
        }
    }
}

/// Receives movement updates. Delivery is fire-and-forget.
pub trait BroadcastSink {
    /// Publish one update.
    fn broadcast(&mut self, event: MovementEvent);
}

impl BroadcastSink for Vec<MovementEvent> {
    fn broadcast(&mut self, event: MovementEvent) {
        self.push(event);
    }
}

/// Recent movement updates plus running totals per [`BroadcastCause`].
///
/// Only the newest `max_events` updates are kept (0 keeps everything). The
/// totals cover every update ever published, trimmed or not, so broadcast
/// rates can be read over a whole run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<MovementEvent>,
    max_events: usize,
    totals: BTreeMap<BroadcastCause, usize>,
    trimmed: usize,
}

impl EventLog {
    /// An empty log retaining at most `max_events` updates.
    pub fn new(max_events: usize) -> Self {
        Self {
            max_events,
            ..Self::default()
        }
    }

    /// Record an update, evicting the oldest retained ones past capacity.
    pub fn push(&mut self, event: MovementEvent) {
        *self.totals.entry(event.cause).or_default() += 1;
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let excess = self.events.len() - self.max_events;
            self.events.drain(..excess);
            self.trimmed += excess;
        }
    }

    /// Retained updates, oldest first.
    pub fn events(&self) -> &[MovementEvent] {
        &self.events
    }

    /// Retained updates about `entity`, oldest first.
    pub fn events_for_entity(&self, entity: EntityHandle) -> Vec<&MovementEvent> {
        self.events.iter().filter(|e| e.entity == entity).collect()
    }

    /// The newest retained update about `entity`.
    pub fn last_for_entity(&self, entity: EntityHandle) -> Option<&MovementEvent> {
        self.events.iter().rev().find(|e| e.entity == entity)
    }

    /// Updates published with `cause` since the log was created.
    pub fn count(&self, cause: BroadcastCause) -> usize {
        self.totals.get(&cause).copied().unwrap_or(0)
    }

    /// Published totals for every cause seen so far.
    pub fn counts(&self) -> &BTreeMap<BroadcastCause, usize> {
        &self.totals
    }

    /// Updates evicted to stay within capacity.
    pub fn trimmed(&self) -> usize {
        self.trimmed
    }

    /// Number of retained updates.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// `true` when nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl BroadcastSink for EventLog {
    fn broadcast(&mut self, event: MovementEvent) {
        self.push(event);
    }
}
