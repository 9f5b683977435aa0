//! Transition primitives.
//!
//! An arc carries one of two transition shapes. A single arc runs its body
//! for side effects and lands on the target fixed at declaration time. A
//! multi arc runs a selector that both produces side effects and chooses the
//! next state from a declared set; the choice is validated at dispatch time.

use crate::error::BodyError;
use crate::StateId;
use std::fmt;
use std::sync::Arc;

/// Body of a single-arc transition. Runs for side effects only; may not call
/// back into the same machine instance.
pub type SingleArcBody<O, E> = Arc<dyn Fn(&O, &E) -> Result<(), BodyError> + Send + Sync>;

/// Selector of a multi-arc transition: chooses the next state from
/// (operand, current state, event kind, event).
pub type MultiArcSelector<O, S, K, E> =
    Arc<dyn Fn(&O, S, K, &E) -> Result<S, BodyError> + Send + Sync>;

/// What happens when an arc fires.
pub enum Transition<O, S, K, E> {
    /// Target fixed by the arc declaration.
    Single {
        target: S,
        body: SingleArcBody<O, E>,
    },
    /// Target chosen at dispatch time; must land in `targets`.
    Multi {
        targets: Vec<S>,
        selector: MultiArcSelector<O, S, K, E>,
    },
}

impl<O, S: StateId, K, E> Transition<O, S, K, E> {
    /// The states this transition can land on, in declaration order.
    pub fn destinations(&self) -> Vec<S> {
        match self {
            Transition::Single { target, .. } => vec![*target],
            Transition::Multi { targets, .. } => targets.clone(),
        }
    }

    /// Returns true for the selector-driven shape.
    pub fn is_multi(&self) -> bool {
        matches!(self, Transition::Multi { .. })
    }
}

impl<O, S: StateId, K, E> fmt::Debug for Transition<O, S, K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Single { target, .. } => {
                f.debug_struct("Single").field("target", target).finish_non_exhaustive()
            }
            Transition::Multi { targets, .. } => {
                f.debug_struct("Multi").field("targets", targets).finish_non_exhaustive()
            }
        }
    }
}
