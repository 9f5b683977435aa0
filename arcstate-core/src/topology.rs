//! Immutable topology: the compiled transition table.

use crate::listener::TransitionListener;
use crate::machine::MachineInstance;
use crate::transition::Transition;
use crate::{EventKind, StateId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The compiled transition table plus initial state and optional listener.
///
/// Built once per operand class by [`crate::TopologyBuilder`], then shared
/// read-only (via `Arc`) by every machine instance. Safe for unsynchronized
/// concurrent reads.
pub struct Topology<O, S: StateId, K: EventKind, E> {
    initial: S,
    table: HashMap<(S, K), Transition<O, S, K, E>>,
    state_order: Vec<S>,
    listener: Option<Arc<dyn TransitionListener<O, S, K, E>>>,
}

impl<O, S: StateId, K: EventKind, E> Topology<O, S, K, E> {
    pub(crate) fn new(
        initial: S,
        table: HashMap<(S, K), Transition<O, S, K, E>>,
        state_order: Vec<S>,
        listener: Option<Arc<dyn TransitionListener<O, S, K, E>>>,
    ) -> Self {
        Self {
            initial,
            table,
            state_order,
            listener,
        }
    }

    /// The state new instances start in.
    pub fn initial_state(&self) -> S {
        self.initial
    }

    /// Creates a machine instance starting in the initial state. The caller
    /// binds it to exactly one operand and lends that operand to every
    /// `dispatch` call.
    pub fn instantiate(self: Arc<Self>) -> MachineInstance<O, S, K, E> {
        MachineInstance::new(self)
    }

    /// Every state named by a declaration, in first-appearance order
    /// (the initial state first, then sources before their targets).
    /// The order is stable, which keeps DOT output byte-identical.
    pub fn states(&self) -> impl Iterator<Item = S> + '_ {
        self.state_order.iter().copied()
    }

    /// Outgoing arcs of `state`, sorted by event kind.
    pub fn arcs_from(&self, state: S) -> Vec<(K, &Transition<O, S, K, E>)> {
        let mut arcs: Vec<(K, &Transition<O, S, K, E>)> = self
            .table
            .iter()
            .filter(|((from, _), _)| *from == state)
            .map(|((_, on), transition)| (*on, transition))
            .collect();
        arcs.sort_by_key(|(on, _)| *on);
        arcs
    }

    /// Event kinds accepted in `state`, sorted.
    pub fn events_from(&self, state: S) -> Vec<K> {
        self.arcs_from(state).into_iter().map(|(on, _)| on).collect()
    }

    /// Returns true when an arc exists for (state, on).
    pub fn has_arc(&self, state: S, on: K) -> bool {
        self.table.contains_key(&(state, on))
    }

    pub(crate) fn arc(&self, state: S, on: K) -> Option<&Transition<O, S, K, E>> {
        self.table.get(&(state, on))
    }

    pub(crate) fn listener(&self) -> Option<&Arc<dyn TransitionListener<O, S, K, E>>> {
        self.listener.as_ref()
    }
}

impl<O, S: StateId, K: EventKind, E> fmt::Debug for Topology<O, S, K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topology")
            .field("initial", &self.initial)
            .field("states", &self.state_order)
            .field("arcs", &self.table.len())
            .finish_non_exhaustive()
    }
}
