use wf_core::{EntityHandle, Point3, WfError};

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// Errors surfaced synchronously by movement commands and configuration.
///
/// Faults that happen during a tick (a stuck entity, an entity deleted by
/// the host) never show up here; they end the movement and are reported
/// through [`crate::MovementOutcome`] and the broadcast stream instead.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The entity handle did not resolve in the world.
    #[error("entity not found in simulation: {0}")]
    EntityNotFound(EntityHandle),

    /// The pathfinder could not reach the destination within its search budget.
    #[error("no path found from {from} to {to}")]
    PathNotFound {
        /// Where the search started.
        from: Point3,
        /// The requested destination.
        to: Point3,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be parsed.
    #[error("configuration parse error: {0}")]
    Config(#[from] serde_json::Error),

    /// An error from the core data model.
    #[error(transparent)]
    Core(#[from] WfError),
}
