//! Tick-based entity movement and grid pathfinding for Wayfinder.
//!
//! Operates on any host world implementing [`wf_core::World`]. The
//! [`MovementController`] owns the set of moving entities: it plans routes
//! with an A* search over a square grid, advances entities every tick with
//! collision stop-or-slide response, and publishes rate-limited
//! position/velocity updates through a [`BroadcastSink`]. [`Simulation`]
//! bundles a world, clock, and event log for hosts without a loop of their
//! own.

/// Simulation clock for tracking ticks and elapsed time.
pub mod clock;
/// Completion handles resolved when a movement ends.
pub mod completion;
/// Configuration types for movement and simulation runs.
pub mod config;
/// Context borrowed by the movement controller on each call.
pub mod context;
/// Error types for the simulation crate.
pub mod error;
/// Movement update events, the broadcast sink trait, and the event log.
pub mod event;
/// `env_logger` initialisation.
pub mod logging;
/// The movement controller and per-tick integration.
pub mod movement;
/// Rate limiting for periodic broadcasts.
pub mod network;
/// Grid A* search with path smoothing.
pub mod pathfinder;
/// Top-level simulation host.
pub mod simulation;

/// Re-export of [`clock::SimClock`].
pub use clock::SimClock;
/// Re-exports of [`completion::MoveCompletion`] and [`completion::MovementOutcome`].
pub use completion::{MoveCompletion, MovementOutcome};
/// Re-exports of [`config::MovementConfig`] and [`config::SimConfig`].
pub use config::{MovementConfig, SimConfig};
/// Re-export of [`context::SimContext`].
pub use context::SimContext;
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of the event types and [`event::BroadcastSink`].
pub use event::{BroadcastCause, BroadcastSink, EventKind, EventLog, MovementEvent};
/// Re-exports of [`movement::ActiveMovement`] and [`movement::MovementController`].
pub use movement::{ActiveMovement, MovementController};
/// Re-exports of the broadcast throttle and its time sources.
pub use network::{BroadcastClock, NetworkScheduler, SimulatedSource, TimeSource, WallClockSource};
/// Re-export of [`pathfinder::Pathfinder`].
pub use pathfinder::Pathfinder;
/// Re-export of [`simulation::Simulation`].
pub use simulation::Simulation;
