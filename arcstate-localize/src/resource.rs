//! The localized-resource datum.

use crate::event::{ResourceEvent, ResourceEventKind};
use arcstate_core::{
    BuildError, DuplicatePolicy, MachineInstance, Topology, TopologyBuilder, TransitionError,
};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// States a localized resource moves through. `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceState {
    /// No reference yet, awaiting the first request.
    Init,
    /// At least one reference, localization may be in flight.
    Downloading,
    /// On local disk.
    Localized,
    /// Localization failed.
    Failed,
}

/// Identity of the remote resource being localized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRequest {
    path: String,
}

impl ResourceRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// The shared topology type of all localized resources.
pub type ResourceTopology =
    Topology<LocalizedResource, ResourceState, ResourceEventKind, ResourceEvent>;

/// Nanoseconds on a process-local monotonic clock.
fn monotonic_nanos() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

/// Datum representing a localized resource. Holds the state machine of one
/// resource.
///
/// `state` runs under the shared-read lock and `handle` under the
/// exclusive-write lock, so events on one resource are serialized while
/// state reads proceed in parallel.
#[derive(Debug)]
pub struct LocalizedResource {
    request: ResourceRequest,
    machine: MachineInstance<LocalizedResource, ResourceState, ResourceEventKind, ResourceEvent>,
    lock: RwLock<()>,
    permit: AtomicBool,
    timestamp: AtomicU64,
    trace: Mutex<String>,
}

impl LocalizedResource {
    pub fn new(request: ResourceRequest) -> Self {
        Self {
            request,
            machine: Self::topology().clone().instantiate(),
            lock: RwLock::new(()),
            permit: AtomicBool::new(false),
            timestamp: AtomicU64::new(monotonic_nanos()),
            trace: Mutex::new(String::new()),
        }
    }

    /// The shared transition topology, built once per process.
    ///
    /// The wiring declares `(Downloading, Request)` twice with the same
    /// body, so it installs under the last-wins policy; the overwrite is
    /// logged at warn level.
    pub fn topology() -> &'static Arc<ResourceTopology> {
        static TOPOLOGY: OnceLock<Arc<ResourceTopology>> = OnceLock::new();
        TOPOLOGY.get_or_init(|| {
            Self::build_topology().expect("resource topology is well-formed")
        })
    }

    fn build_topology(
    ) -> Result<Arc<ResourceTopology>, BuildError<ResourceState, ResourceEventKind>> {
        use ResourceEventKind as Ev;
        use ResourceState::{Downloading, Failed, Init, Localized};

        let mut builder = TopologyBuilder::new(Init);
        builder.duplicate_policy(DuplicatePolicy::LastWins)?;

        builder
            // from Init (ref == 0, awaiting request)
            .add_single_arc(Init, Downloading, Ev::Request, |rsrc: &LocalizedResource, _| {
                rsrc.fetch();
                Ok(())
            })?
            .add_single_arc(Init, Localized, Ev::Recovered, |rsrc: &LocalizedResource, _| {
                rsrc.recovered();
                Ok(())
            })?
            // from Downloading (ref > 0, may be localizing)
            .add_single_arc(Downloading, Downloading, Ev::Request, |rsrc: &LocalizedResource, _| {
                rsrc.fetch();
                Ok(())
            })?
            .add_single_arc(Downloading, Downloading, Ev::Request, |rsrc: &LocalizedResource, _| {
                rsrc.fetch();
                Ok(())
            })?
            .add_single_arc(Downloading, Localized, Ev::Localized, |rsrc: &LocalizedResource, _| {
                rsrc.fetch_success();
                Ok(())
            })?
            .add_single_arc(Downloading, Downloading, Ev::Release, |rsrc: &LocalizedResource, _| {
                rsrc.release();
                Ok(())
            })?
            .add_single_arc(Downloading, Failed, Ev::LocalizationFailed, |rsrc: &LocalizedResource, _| {
                rsrc.fetch_failed();
                Ok(())
            })?
            // from Localized (ref >= 0, on disk)
            .add_single_arc(Localized, Localized, Ev::Request, |rsrc: &LocalizedResource, _| {
                rsrc.already_localized();
                Ok(())
            })?
            .add_single_arc(Localized, Localized, Ev::Release, |rsrc: &LocalizedResource, _| {
                rsrc.release();
                Ok(())
            })?;

        builder.install_topology()
    }

    /// The request this resource localizes.
    pub fn request(&self) -> &ResourceRequest {
        &self.request
    }

    /// Current state, under the shared-read lock.
    pub fn state(&self) -> ResourceState {
        let _read = self.lock.read();
        self.machine.current_state()
    }

    /// Handles one event under the exclusive-write lock.
    ///
    /// An event that has no arc from the current state is logged at error
    /// level and swallowed, leaving the state unchanged; every other failure
    /// propagates.
    pub fn handle(
        &self,
        event: &ResourceEvent,
    ) -> Result<(), TransitionError<ResourceState, ResourceEventKind>> {
        let _write = self.lock.write();
        tracing::debug!(kind = ?event.kind(), path = %self.request.path, "processing resource event");
        let before = self.machine.current_state();
        match self.machine.dispatch(self, event.kind(), event) {
            Ok(after) => {
                if before != after {
                    tracing::debug!(from = ?before, to = ?after, "resource transitioned");
                }
                Ok(())
            }
            Err(TransitionError::InvalidStateTransition { state, event }) => {
                tracing::error!(
                    state = ?state,
                    event = ?event,
                    "cannot handle this event at current state"
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Last activity on the process-local monotonic clock, in nanoseconds.
    pub fn timestamp_nanos(&self) -> u64 {
        self.timestamp.load(Ordering::Acquire)
    }

    /// Tries to take the single localization permit.
    pub fn try_acquire(&self) -> bool {
        !self.permit.swap(true, Ordering::AcqRel)
    }

    /// Returns the single localization permit.
    pub fn release_permit(&self) {
        self.permit.store(false, Ordering::Release);
    }

    /// The characters emitted by transition bodies so far, in order.
    pub fn trace(&self) -> String {
        self.trace.lock().clone()
    }

    fn emit(&self, c: char) {
        self.trace.lock().push(c);
        print!("{c}");
    }

    fn touch(&self) {
        self.timestamp.store(monotonic_nanos(), Ordering::Release);
    }

    // Transition bodies. Each emits a one-character trace.

    /// Init/Downloading -> Downloading: a request arrived, fetch.
    fn fetch(&self) {
        self.emit('f');
    }

    /// Downloading -> Localized: download finished.
    fn fetch_success(&self) {
        self.emit('e');
    }

    /// Downloading -> Failed: download failed.
    fn fetch_failed(&self) {
        self.emit('d');
    }

    /// Localized -> Localized: already on disk, answer immediately.
    fn already_localized(&self) {
        self.emit('c');
    }

    /// Reference released, refresh the activity timestamp.
    fn release(&self) {
        self.touch();
        self.emit('b');
    }

    /// Init -> Localized: found on disk during recovery.
    fn recovered(&self) {
        self.emit('a');
    }
}
