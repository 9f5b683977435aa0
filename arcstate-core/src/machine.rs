//! Per-operand runtime driver.

use crate::error::{ListenerPhase, TransitionError};
use crate::topology::Topology;
use crate::transition::Transition;
use crate::{EventKind, StateId};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Runtime driver for a single operand.
///
/// Holds only the per-operand mutable state and a handle to the shared
/// topology. The operand is lent to [`dispatch`](MachineInstance::dispatch)
/// per call, which is how every body, selector, and listener hook sees it.
///
/// `current_state` takes a shared read; concurrent readers never block each
/// other. Callers are responsible for serializing `dispatch` on one instance
/// (the reference operand does so with an exclusive write lock); overlapping
/// dispatch is detected and fails fast with
/// [`TransitionError::ReentrantDispatch`].
pub struct MachineInstance<O, S: StateId, K: EventKind, E> {
    topology: Arc<Topology<O, S, K, E>>,
    current: RwLock<S>,
    in_dispatch: AtomicBool,
}

struct DispatchGate<'a>(&'a AtomicBool);

impl Drop for DispatchGate<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<O, S: StateId, K: EventKind, E> MachineInstance<O, S, K, E> {
    pub(crate) fn new(topology: Arc<Topology<O, S, K, E>>) -> Self {
        let initial = topology.initial_state();
        Self {
            topology,
            current: RwLock::new(initial),
            in_dispatch: AtomicBool::new(false),
        }
    }

    /// The current state.
    pub fn current_state(&self) -> S {
        *self.current.read()
    }

    /// The shared topology this instance runs on.
    pub fn topology(&self) -> &Arc<Topology<O, S, K, E>> {
        &self.topology
    }

    /// Dispatches one event against the topology and returns the new current
    /// state.
    ///
    /// Lookup failure, a pre-hook failure, a body/selector failure, and an
    /// undeclared selector result all leave the current state unchanged. A
    /// post-hook failure is returned after the new state has committed.
    pub fn dispatch(
        &self,
        operand: &O,
        kind: K,
        event: &E,
    ) -> Result<S, TransitionError<S, K>> {
        if self.in_dispatch.swap(true, Ordering::Acquire) {
            return Err(TransitionError::ReentrantDispatch { event: kind });
        }
        let _gate = DispatchGate(&self.in_dispatch);

        let before = *self.current.read();
        let Some(arc) = self.topology.arc(before, kind) else {
            return Err(TransitionError::InvalidStateTransition {
                state: before,
                event: kind,
            });
        };

        if let Some(listener) = self.topology.listener() {
            listener
                .pre_transition(operand, before, event)
                .map_err(|source| TransitionError::ListenerFailure {
                    phase: ListenerPhase::Pre,
                    state: before,
                    event: kind,
                    source,
                })?;
        }

        let after = match arc {
            Transition::Single { target, body } => {
                (body.as_ref())(operand, event).map_err(|source| TransitionError::BodyFailure {
                    state: before,
                    event: kind,
                    source,
                })?;
                *target
            }
            Transition::Multi { targets, selector } => {
                let chosen = (selector.as_ref())(operand, before, kind, event).map_err(
                    |source| TransitionError::BodyFailure {
                        state: before,
                        event: kind,
                        source,
                    },
                )?;
                if !targets.contains(&chosen) {
                    return Err(TransitionError::InvalidMultiArcTarget {
                        state: before,
                        event: kind,
                        chosen,
                    });
                }
                chosen
            }
        };

        *self.current.write() = after;

        if let Some(listener) = self.topology.listener() {
            listener
                .post_transition(operand, before, after, event)
                .map_err(|source| TransitionError::ListenerFailure {
                    phase: ListenerPhase::Post,
                    state: before,
                    event: kind,
                    source,
                })?;
        }

        Ok(after)
    }
}

impl<O, S: StateId, K: EventKind, E> fmt::Debug for MachineInstance<O, S, K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineInstance")
            .field("current", &self.current_state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TopologyBuilder;
    use crate::error::BodyError;
    use crate::listener::TransitionListener;
    use parking_lot::Mutex;
    use std::sync::OnceLock;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    enum Phase {
        Idle,
        Running,
        Done,
        Stuck,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    enum Signal {
        Start,
        Finish,
        Fail,
    }

    struct Tick {
        healthy: bool,
    }

    impl Tick {
        fn ok() -> Self {
            Self { healthy: true }
        }
    }

    fn single_arc_topology() -> Arc<Topology<(), Phase, Signal, Tick>> {
        let mut builder = TopologyBuilder::new(Phase::Idle);
        builder
            .add_single_arc(Phase::Idle, Phase::Running, Signal::Start, |_, _| Ok(()))
            .unwrap()
            .add_single_arc(Phase::Running, Phase::Done, Signal::Finish, |_, _| Ok(()))
            .unwrap();
        builder.install_topology().unwrap()
    }

    #[test]
    fn dispatch_commits_and_returns_new_state() {
        let instance = single_arc_topology().instantiate();
        assert_eq!(instance.current_state(), Phase::Idle);

        let after = instance.dispatch(&(), Signal::Start, &Tick::ok()).unwrap();
        assert_eq!(after, Phase::Running);
        assert_eq!(instance.current_state(), Phase::Running);
    }

    #[test]
    fn missing_arc_preserves_state() {
        let instance = single_arc_topology().instantiate();

        let err = instance
            .dispatch(&(), Signal::Finish, &Tick::ok())
            .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::InvalidStateTransition {
                state: Phase::Idle,
                event: Signal::Finish,
            }
        ));
        assert_eq!(instance.current_state(), Phase::Idle);
    }

    #[test]
    fn multi_arc_selects_declared_target() {
        let mut builder: TopologyBuilder<(), Phase, Signal, Tick> =
            TopologyBuilder::new(Phase::Running);
        builder
            .add_multi_arc(
                Phase::Running,
                vec![Phase::Done, Phase::Stuck],
                Signal::Finish,
                |_, _, _, event: &Tick| {
                    Ok(if event.healthy { Phase::Done } else { Phase::Stuck })
                },
            )
            .unwrap();
        let topology = builder.install_topology().unwrap();

        let instance = topology.clone().instantiate();
        let after = instance.dispatch(&(), Signal::Finish, &Tick::ok()).unwrap();
        assert_eq!(after, Phase::Done);

        let instance = topology.instantiate();
        let after = instance
            .dispatch(&(), Signal::Finish, &Tick { healthy: false })
            .unwrap();
        assert_eq!(after, Phase::Stuck);
    }

    #[test]
    fn undeclared_selector_result_preserves_state() {
        let mut builder: TopologyBuilder<(), Phase, Signal, Tick> =
            TopologyBuilder::new(Phase::Running);
        builder
            .add_multi_arc(
                Phase::Running,
                vec![Phase::Done],
                Signal::Finish,
                |_, _, _, _| Ok(Phase::Stuck),
            )
            .unwrap();
        let instance = builder.install_topology().unwrap().instantiate();

        let err = instance
            .dispatch(&(), Signal::Finish, &Tick::ok())
            .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::InvalidMultiArcTarget {
                state: Phase::Running,
                event: Signal::Finish,
                chosen: Phase::Stuck,
            }
        ));
        assert_eq!(instance.current_state(), Phase::Running);
    }

    #[test]
    fn body_failure_preserves_state_and_cause() {
        let mut builder: TopologyBuilder<(), Phase, Signal, Tick> =
            TopologyBuilder::new(Phase::Idle);
        builder
            .add_single_arc(Phase::Idle, Phase::Running, Signal::Start, |_, _| {
                Err("download interrupted".into())
            })
            .unwrap();
        let instance = builder.install_topology().unwrap().instantiate();

        let err = instance
            .dispatch(&(), Signal::Start, &Tick::ok())
            .unwrap_err();
        match err {
            TransitionError::BodyFailure { state, event, source } => {
                assert_eq!(state, Phase::Idle);
                assert_eq!(event, Signal::Start);
                assert_eq!(source.to_string(), "download interrupted");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(instance.current_state(), Phase::Idle);
    }

    #[derive(Default)]
    struct RecordingListener {
        calls: Mutex<Vec<String>>,
        fail_pre: bool,
        fail_post: bool,
    }

    impl TransitionListener<(), Phase, Signal, Tick> for RecordingListener {
        fn pre_transition(&self, _: &(), before: Phase, _: &Tick) -> Result<(), BodyError> {
            self.calls.lock().push(format!("pre:{before:?}"));
            if self.fail_pre {
                return Err("pre hook refused".into());
            }
            Ok(())
        }

        fn post_transition(
            &self,
            _: &(),
            before: Phase,
            after: Phase,
            _: &Tick,
        ) -> Result<(), BodyError> {
            self.calls.lock().push(format!("post:{before:?}->{after:?}"));
            if self.fail_post {
                return Err("post hook refused".into());
            }
            Ok(())
        }
    }

    fn topology_with_listener(
        listener: Arc<RecordingListener>,
    ) -> Arc<Topology<(), Phase, Signal, Tick>> {
        let mut builder = TopologyBuilder::new(Phase::Idle);
        builder
            .add_single_arc(Phase::Idle, Phase::Running, Signal::Start, |_, _| Ok(()))
            .unwrap()
            .listener(listener)
            .unwrap();
        builder.install_topology().unwrap()
    }

    #[test]
    fn listener_sees_both_hooks() {
        let listener = Arc::new(RecordingListener::default());
        let instance = topology_with_listener(listener.clone()).instantiate();

        instance.dispatch(&(), Signal::Start, &Tick::ok()).unwrap();
        assert_eq!(
            *listener.calls.lock(),
            vec!["pre:Idle".to_string(), "post:Idle->Running".to_string()]
        );
    }

    #[test]
    fn pre_hook_failure_aborts_transition() {
        let listener = Arc::new(RecordingListener {
            fail_pre: true,
            ..Default::default()
        });
        let instance = topology_with_listener(listener).instantiate();

        let err = instance
            .dispatch(&(), Signal::Start, &Tick::ok())
            .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::ListenerFailure {
                phase: ListenerPhase::Pre,
                ..
            }
        ));
        assert_eq!(instance.current_state(), Phase::Idle);
    }

    #[test]
    fn post_hook_failure_surfaces_after_commit() {
        let listener = Arc::new(RecordingListener {
            fail_post: true,
            ..Default::default()
        });
        let instance = topology_with_listener(listener).instantiate();

        let err = instance
            .dispatch(&(), Signal::Start, &Tick::ok())
            .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::ListenerFailure {
                phase: ListenerPhase::Post,
                ..
            }
        ));
        assert_eq!(instance.current_state(), Phase::Running);
    }

    #[derive(Default)]
    struct Nested {
        machine: OnceLock<Arc<MachineInstance<Nested, Phase, Signal, Tick>>>,
        inner_result: Mutex<Option<String>>,
    }

    #[test]
    fn reentrant_dispatch_fails_fast() {
        let mut builder: TopologyBuilder<Nested, Phase, Signal, Tick> =
            TopologyBuilder::new(Phase::Idle);
        builder
            .add_single_arc(
                Phase::Idle,
                Phase::Running,
                Signal::Start,
                |operand: &Nested, event: &Tick| {
                    let machine = operand.machine.get().ok_or("machine not wired")?;
                    let inner = machine.dispatch(operand, Signal::Start, event);
                    *operand.inner_result.lock() = Some(format!("{inner:?}"));
                    Ok(())
                },
            )
            .unwrap();
        let topology = builder.install_topology().unwrap();

        let operand = Nested::default();
        let instance = Arc::new(topology.instantiate());
        operand
            .machine
            .set(instance.clone())
            .expect("machine wired once");

        let after = instance.dispatch(&operand, Signal::Start, &Tick::ok()).unwrap();
        assert_eq!(after, Phase::Running);

        let inner = operand.inner_result.lock().clone().unwrap();
        assert!(inner.contains("ReentrantDispatch"), "inner was: {inner}");
    }
}
