//! # arcstate-core
//!
//! Declarative finite state machine framework.
//!
//! This crate provides:
//! - A builder that compiles arc declarations into an immutable transition
//!   table keyed by (state, event kind)
//! - A per-operand runtime driver with deterministic dispatch and rejection
//!   of invalid transitions
//! - Single-arc and multi-arc (selector-driven) transitions
//! - Pre/post transition listener hooks
//! - Topology introspection for rendering and diagnostics

pub mod builder;
pub mod error;
pub mod listener;
pub mod machine;
pub mod topology;
pub mod transition;

pub use builder::{DuplicatePolicy, TopologyBuilder};
pub use error::{BodyError, BuildError, ListenerPhase, TransitionError};
pub use listener::TransitionListener;
pub use machine::MachineInstance;
pub use topology::Topology;
pub use transition::{MultiArcSelector, SingleArcBody, Transition};

use std::fmt;
use std::hash::Hash;

/// Marker for state identifiers: small, copyable, totally ordered values
/// drawn from a finite application-defined enumeration.
///
/// Blanket-implemented; deriving `Copy`, `Eq`, `Hash`, `Ord` and `Debug` on a
/// fieldless enum is enough.
pub trait StateId: Copy + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static {}

impl<T> StateId for T where T: Copy + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static {}

/// Marker for event kinds carried by every event instance.
pub trait EventKind: Copy + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static {}

impl<T> EventKind for T where T: Copy + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static {}
