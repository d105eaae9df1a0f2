//! Core types for Wayfinder: points, entity handles, and the world contract.
//!
//! This crate defines the data the movement subsystem operates on and the
//! narrow interface a host world must provide. It carries no simulation
//! logic of its own; see `wf-simulation` for pathfinding and movement.

/// Entity handles and per-entity movement records.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Three-component points and the vector math used by movement.
pub mod point;
/// The world collaborator contract and an in-memory grid implementation.
pub mod world;

/// Re-export entity types.
pub use entity::{EntityHandle, MovementRecord};
/// Re-export error types.
pub use error::{WfError, WfResult};
/// Re-export the point type.
pub use point::Point3;
/// Re-export world types.
pub use world::{GridWorld, World};
