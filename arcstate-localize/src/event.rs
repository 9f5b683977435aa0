//! Resource events.

/// Kinds of events a localized resource reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceEventKind {
    /// A container requested the resource.
    Request,
    /// The resource was found already localized during recovery.
    Recovered,
    /// The download completed.
    Localized,
    /// A container released its reference.
    Release,
    /// The download failed.
    LocalizationFailed,
}

/// An event delivered to one resource. Events on the same resource arrive in
/// FIFO order; the dispatcher delivering them is external to this crate.
#[derive(Debug, Clone)]
pub struct ResourceEvent {
    kind: ResourceEventKind,
}

impl ResourceEvent {
    pub fn new(kind: ResourceEventKind) -> Self {
        Self { kind }
    }

    /// The declared kind used for transition lookup.
    pub fn kind(&self) -> ResourceEventKind {
        self.kind
    }
}
