//! Topology builder.
//!
//! Arc declarations are accumulated in order and compiled into an immutable
//! [`Topology`] by [`TopologyBuilder::install_topology`]. Validation is
//! deferred to installation: duplicate (from, on) keys and empty multi-arc
//! target sets are build-time errors. Once installed, the builder is frozen
//! and every further mutation fails with [`BuildError::TopologyFrozen`].

use crate::error::{BodyError, BuildError};
use crate::listener::TransitionListener;
use crate::topology::Topology;
use crate::transition::Transition;
use crate::{EventKind, StateId};
use std::collections::HashMap;
use std::sync::Arc;

/// How `install_topology` treats two arcs sharing one (from, on) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail installation with [`BuildError::DuplicateArc`].
    #[default]
    Reject,
    /// Keep the later declaration and log the overwrite.
    LastWins,
}

struct ArcDecl<O, S, K, E> {
    from: S,
    on: K,
    transition: Transition<O, S, K, E>,
}

/// Accumulates arc declarations and compiles them into a shared [`Topology`].
pub struct TopologyBuilder<O, S: StateId, K: EventKind, E> {
    initial: S,
    arcs: Vec<ArcDecl<O, S, K, E>>,
    listener: Option<Arc<dyn TransitionListener<O, S, K, E>>>,
    policy: DuplicatePolicy,
    frozen: bool,
}

impl<O, S: StateId, K: EventKind, E> TopologyBuilder<O, S, K, E> {
    /// Starts a builder whose instances begin in `initial`.
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            arcs: Vec::new(),
            listener: None,
            policy: DuplicatePolicy::default(),
            frozen: false,
        }
    }

    fn ensure_open(&self) -> Result<(), BuildError<S, K>> {
        if self.frozen {
            return Err(BuildError::TopologyFrozen);
        }
        Ok(())
    }

    /// Declares an arc with a fixed target.
    pub fn add_single_arc<F>(
        &mut self,
        from: S,
        to: S,
        on: K,
        body: F,
    ) -> Result<&mut Self, BuildError<S, K>>
    where
        F: Fn(&O, &E) -> Result<(), BodyError> + Send + Sync + 'static,
    {
        self.ensure_open()?;
        self.arcs.push(ArcDecl {
            from,
            on,
            transition: Transition::Single {
                target: to,
                body: Arc::new(body),
            },
        });
        Ok(self)
    }

    /// Declares an arc whose target is chosen by `selector` from `targets`.
    pub fn add_multi_arc<F>(
        &mut self,
        from: S,
        targets: Vec<S>,
        on: K,
        selector: F,
    ) -> Result<&mut Self, BuildError<S, K>>
    where
        F: Fn(&O, S, K, &E) -> Result<S, BodyError> + Send + Sync + 'static,
    {
        self.ensure_open()?;
        self.arcs.push(ArcDecl {
            from,
            on,
            transition: Transition::Multi {
                targets,
                selector: Arc::new(selector),
            },
        });
        Ok(self)
    }

    /// Installs the single transition listener.
    pub fn listener(
        &mut self,
        listener: Arc<dyn TransitionListener<O, S, K, E>>,
    ) -> Result<&mut Self, BuildError<S, K>> {
        self.ensure_open()?;
        self.listener = Some(listener);
        Ok(self)
    }

    /// Selects the duplicate-arc policy. Defaults to [`DuplicatePolicy::Reject`].
    pub fn duplicate_policy(
        &mut self,
        policy: DuplicatePolicy,
    ) -> Result<&mut Self, BuildError<S, K>> {
        self.ensure_open()?;
        self.policy = policy;
        Ok(self)
    }

    /// Validates the accumulated declarations and returns the frozen,
    /// shareable topology.
    pub fn install_topology(&mut self) -> Result<Arc<Topology<O, S, K, E>>, BuildError<S, K>> {
        self.ensure_open()?;
        self.frozen = true;

        let mut table: HashMap<(S, K), Transition<O, S, K, E>> = HashMap::new();
        let mut state_order: Vec<S> = vec![self.initial];

        for decl in self.arcs.drain(..) {
            if let Transition::Multi { ref targets, .. } = decl.transition {
                if targets.is_empty() {
                    return Err(BuildError::InvalidMultiArcTarget {
                        from: decl.from,
                        on: decl.on,
                    });
                }
            }

            if table.contains_key(&(decl.from, decl.on)) {
                match self.policy {
                    DuplicatePolicy::Reject => {
                        return Err(BuildError::DuplicateArc {
                            from: decl.from,
                            on: decl.on,
                        });
                    }
                    DuplicatePolicy::LastWins => {
                        tracing::warn!(
                            from = ?decl.from,
                            on = ?decl.on,
                            "duplicate arc declaration, keeping the later one"
                        );
                    }
                }
            }

            if !state_order.contains(&decl.from) {
                state_order.push(decl.from);
            }
            for dest in decl.transition.destinations() {
                if !state_order.contains(&dest) {
                    state_order.push(dest);
                }
            }

            table.insert((decl.from, decl.on), decl.transition);
        }

        Ok(Arc::new(Topology::new(
            self.initial,
            table,
            state_order,
            self.listener.take(),
        )))
    }
}
