use crate::entity::EntityHandle;

/// Alias for `Result<T, WfError>`.
pub type WfResult<T> = Result<T, WfError>;

/// Errors that can occur when building or mutating world data.
#[derive(Debug, thiserror::Error)]
pub enum WfError {
    /// The requested entity handle does not resolve in the world.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityHandle),

    /// A movement speed was negative or not a finite number.
    #[error("invalid speed: {0} (must be finite and non-negative)")]
    InvalidSpeed(f64),

    /// A grid cell size was zero, negative, or not a finite number.
    #[error("invalid cell size: {0} (must be finite and positive)")]
    InvalidCellSize(f64),
}
