//! # arcstate-localize
//!
//! Reference operand for the arcstate framework: a datum tracking the
//! localization of a remote resource. Holds the state machine of one
//! resource; the state is one of [`ResourceState`].

pub mod event;
pub mod resource;

pub use event::{ResourceEvent, ResourceEventKind};
pub use resource::{LocalizedResource, ResourceRequest, ResourceState, ResourceTopology};
