//! Framework error types.

use crate::{EventKind, StateId};
use std::fmt;
use thiserror::Error;

/// Error type produced by transition bodies, selectors, and listener hooks.
/// Surfaced unchanged as the `source` of the framework error.
pub type BodyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors detected while compiling a topology.
#[derive(Debug, Error)]
pub enum BuildError<S: StateId, K: EventKind> {
    /// Two arcs share the same (from, on) key under the strict policy.
    #[error("duplicate arc from {from:?} on {on:?}")]
    DuplicateArc { from: S, on: K },

    /// A multi-arc declared an empty set of valid targets.
    #[error("multi-arc from {from:?} on {on:?} declares no valid targets")]
    InvalidMultiArcTarget { from: S, on: K },

    /// Mutation was attempted after `install_topology`.
    #[error("topology is frozen")]
    TopologyFrozen,
}

/// Which listener hook failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerPhase {
    Pre,
    Post,
}

impl fmt::Display for ListenerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerPhase::Pre => f.write_str("pre-transition"),
            ListenerPhase::Post => f.write_str("post-transition"),
        }
    }
}

/// Errors raised by `MachineInstance::dispatch`.
///
/// Every variant except `ListenerFailure { phase: Post, .. }` leaves the
/// current state unchanged; a post-hook failure surfaces after the new state
/// has already committed.
#[derive(Debug, Error)]
pub enum TransitionError<S: StateId, K: EventKind> {
    /// No arc matches (current state, event kind).
    #[error("no transition from state {state:?} on event {event:?}")]
    InvalidStateTransition { state: S, event: K },

    /// A multi-arc selector returned a state outside its declared target set.
    #[error("selector from state {state:?} on event {event:?} chose undeclared target {chosen:?}")]
    InvalidMultiArcTarget { state: S, event: K, chosen: S },

    /// The transition body or selector failed; the raw cause is the source.
    #[error("transition body failed in state {state:?} on event {event:?}")]
    BodyFailure {
        state: S,
        event: K,
        #[source]
        source: BodyError,
    },

    /// A listener hook failed.
    #[error("{phase} listener failed in state {state:?} on event {event:?}")]
    ListenerFailure {
        phase: ListenerPhase,
        state: S,
        event: K,
        #[source]
        source: BodyError,
    },

    /// `dispatch` was entered while another dispatch on the same instance was
    /// still running. Transition bodies must route follow-up events through
    /// an external dispatcher instead of dispatching synchronously.
    #[error("re-entrant dispatch on event {event:?}")]
    ReentrantDispatch { event: K },
}
