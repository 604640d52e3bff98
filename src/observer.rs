//! Resolution observers and non-fatal diagnostics.
//!
//! Observers are notified synchronously while the context resolves, attaches
//! and recycles instances. Fallbacks that keep a request alive (using the
//! calling node, attaching a fresh component) are surfaced as
//! [`Diagnostic`] values rather than errors.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::hierarchy::NodeId;
use crate::{Key, LifeCycle};

/// A lookup missed but a safe fallback was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A path could not be resolved; the calling node was used instead.
    PathFallback {
        path: String,
        fallback: Option<NodeId>,
    },
    /// A component was not found and a new one was attached on `node`.
    Attached {
        type_name: &'static str,
        node: NodeId,
    },
    /// A component was not found and the type cannot be attached.
    NotFound {
        type_name: &'static str,
        strategy: &'static str,
        node: Option<NodeId>,
    },
}

impl Diagnostic {
    pub(crate) fn path_fallback(path: &str, fallback: Option<NodeId>) -> Self {
        tracing::debug!(path, ?fallback, "Can't find node by path, using calling node");
        Diagnostic::PathFallback {
            path: path.to_owned(),
            fallback,
        }
    }

    pub(crate) fn attached(type_name: &'static str, node: NodeId) -> Self {
        tracing::debug!(type_name, ?node, "Can't find component, attached a new one");
        Diagnostic::Attached { type_name, node }
    }

    pub(crate) fn not_found(type_name: &'static str, strategy: &'static str, node: Option<NodeId>) -> Self {
        tracing::debug!(type_name, strategy, ?node, "Unable to find or attach component");
        Diagnostic::NotFound {
            type_name,
            strategy,
            node,
        }
    }
}

/// Observer trait for resolution events.
///
/// Keep implementations lightweight; they run inline with every resolution.
///
/// # Examples
///
/// ```
/// use ferrous_resolver::{ContextBuilder, Diagnostic, Key, LifeCycle, ResolveObserver};
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Counting {
///     resolved: Cell<usize>,
/// }
///
/// impl ResolveObserver for Counting {
///     fn resolving(&self, _key: &Key, _lifecycle: LifeCycle) {}
///     fn resolved(&self, _key: &Key, _duration: Duration) {
///         self.resolved.set(self.resolved.get() + 1);
///     }
///     fn diagnostic(&self, _diagnostic: &Diagnostic) {}
/// }
///
/// let observer = Rc::new(Counting::default());
/// let mut builder = ContextBuilder::new();
/// builder.add_observer(observer.clone());
/// builder.bind_instance(7u32);
///
/// let context = builder.build();
/// context.resolve::<u32>(LifeCycle::SINGLETON).unwrap();
/// assert_eq!(observer.resolved.get(), 1);
/// ```
pub trait ResolveObserver {
    /// Called before a binding's factory runs or a cache is consulted.
    fn resolving(&self, key: &Key, lifecycle: LifeCycle);

    /// Called when a resolution succeeded.
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called for every non-fatal fallback.
    fn diagnostic(&self, diagnostic: &Diagnostic);

    /// Called when a pooled instance was recycled or freshly built for an
    /// acquisition.
    fn acquired(&self, _key: &Key, _node: Option<NodeId>, _recycled: bool) {}
}

/// Container for registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Rc<dyn ResolveObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, observer: Rc<dyn ResolveObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key, lifecycle: LifeCycle) {
        for observer in &self.observers {
            observer.resolving(key, lifecycle);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    pub(crate) fn diagnostics(&self, diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            for observer in &self.observers {
                observer.diagnostic(diagnostic);
            }
        }
    }

    pub(crate) fn acquired(&self, key: &Key, node: Option<NodeId>, recycled: bool) {
        for observer in &self.observers {
            observer.acquired(key, node, recycled);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// ```
/// use ferrous_resolver::{ContextBuilder, TracingObserver};
/// use std::rc::Rc;
///
/// let mut builder = ContextBuilder::new();
/// builder.add_observer(Rc::new(TracingObserver::new()));
/// let _context = builder.build();
/// ```
pub struct TracingObserver {
    label: &'static str,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self {
            label: "ferrous-resolver",
        }
    }

    /// Tags every event with `label`.
    pub fn with_label(label: &'static str) -> Self {
        Self { label }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolveObserver for TracingObserver {
    fn resolving(&self, key: &Key, lifecycle: LifeCycle) {
        tracing::trace!(label = self.label, key = key.display_name(), ?lifecycle, "Resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::debug!(label = self.label, key = key.display_name(), ?duration, "Resolved");
    }

    fn diagnostic(&self, diagnostic: &Diagnostic) {
        tracing::info!(label = self.label, ?diagnostic, "Resolution fallback");
    }

    fn acquired(&self, key: &Key, node: Option<NodeId>, recycled: bool) {
        tracing::debug!(label = self.label, key = key.display_name(), ?node, recycled, "Acquired from pool");
    }
}

/// Observer that only counts events.
#[derive(Default)]
pub struct CountingObserver {
    resolutions: Cell<u64>,
    total_time: Cell<Duration>,
    diagnostics: Cell<u64>,
    recycled: Cell<u64>,
    built: Cell<u64>,
}

impl CountingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolution_count(&self) -> u64 {
        self.resolutions.get()
    }

    pub fn average_resolution_time(&self) -> Option<Duration> {
        let count = self.resolutions.get();
        if count == 0 {
            return None;
        }
        let nanos = self.total_time.get().as_nanos() / u128::from(count);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }

    pub fn diagnostic_count(&self) -> u64 {
        self.diagnostics.get()
    }

    /// Acquisitions served by recycling an inactive entry.
    pub fn recycled_count(&self) -> u64 {
        self.recycled.get()
    }

    /// Acquisitions that had to build a new entry.
    pub fn built_count(&self) -> u64 {
        self.built.get()
    }

    pub fn reset(&self) {
        self.resolutions.set(0);
        self.total_time.set(Duration::ZERO);
        self.diagnostics.set(0);
        self.recycled.set(0);
        self.built.set(0);
    }
}

impl ResolveObserver for CountingObserver {
    fn resolving(&self, _key: &Key, _lifecycle: LifeCycle) {}

    fn resolved(&self, _key: &Key, duration: Duration) {
        self.resolutions.set(self.resolutions.get() + 1);
        self.total_time.set(self.total_time.get() + duration);
    }

    fn diagnostic(&self, _diagnostic: &Diagnostic) {
        self.diagnostics.set(self.diagnostics.get() + 1);
    }

    fn acquired(&self, _key: &Key, _node: Option<NodeId>, recycled: bool) {
        let counter = if recycled { &self.recycled } else { &self.built };
        counter.set(counter.get() + 1);
    }
}
