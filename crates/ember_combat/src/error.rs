//! Combat-specific errors.

use ember_core::{CoreError, EntityId};
use thiserror::Error;

/// Errors surfaced by combat commands.
#[derive(Debug, Error)]
pub enum CombatError {
    /// World-level failure: unknown entity, missing component.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No target was named and none could be inferred from the location.
    #[error("there is nothing here to attack")]
    NoTarget,

    /// No occupant of the attacker's location matches the named target.
    #[error("no '{0}' here")]
    TargetNotHere(String),

    /// The target is already unconscious or dead.
    #[error("entity {0} is already down")]
    TargetDown(EntityId),

    /// The target is already fighting another player.
    #[error("entity {0} is already engaged elsewhere")]
    TargetBusy(EntityId),
}

/// Convenience alias for combat results.
pub type CombatResult<T> = Result<T, CombatError>;
