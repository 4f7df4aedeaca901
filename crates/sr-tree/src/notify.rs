//! Change notification.
//!
//! Writers record committed changes with [`NotificationHub::notify`]; nothing
//! is delivered until [`flush`][NotificationHub::flush], which hands every
//! pending event to the subscribed [`ResourceListener`]s.  Flushing happens
//! after the writer has released every lock, so listeners may freely call
//! back into the tree.
//!
//! # Example
//!
//! ```rust,ignore
//! let hub = NotificationHub::new();
//! let id = hub.subscribe(Arc::new(|e: &ChangeEvent| println!("{e}")));
//! hub.notify(ChangeEvent::value_changed(path, Some(Timestamp(5))));
//! assert_eq!(hub.flush(), 1);
//! hub.unsubscribe(id);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use sr_core::{IdAllocator, ListenerId, ResourcePath, Timestamp};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ChangeKind {
    Created,
    Deleted,
    ValueChanged,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Deleted => "deleted",
            ChangeKind::ValueChanged => "value-changed",
        }
    }
}

/// One committed change to one resource.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ChangeEvent {
    pub path: ResourcePath,
    pub kind: ChangeKind,
    /// The resource's last-update time when the change was recorded.
    pub time: Option<Timestamp>,
}

impl ChangeEvent {
    pub fn created(path: ResourcePath) -> Self {
        Self { path, kind: ChangeKind::Created, time: None }
    }

    pub fn deleted(path: ResourcePath) -> Self {
        Self { path, kind: ChangeKind::Deleted, time: None }
    }

    pub fn value_changed(path: ResourcePath, time: Option<Timestamp>) -> Self {
        Self { path, kind: ChangeKind::ValueChanged, time }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.path)?;
        if let Some(t) = self.time {
            write!(f, " @ {t}")?;
        }
        Ok(())
    }
}

/// Receives flushed change events.
///
/// Any `Fn(&ChangeEvent) + Send + Sync` closure is a listener.
pub trait ResourceListener: Send + Sync {
    fn on_change(&self, event: &ChangeEvent);
}

impl<F> ResourceListener for F
where
    F: Fn(&ChangeEvent) + Send + Sync,
{
    fn on_change(&self, event: &ChangeEvent) {
        self(event)
    }
}

#[derive(Clone)]
struct Subscription {
    id:       ListenerId,
    scope:    Option<ResourcePath>,
    listener: Arc<dyn ResourceListener>,
}

impl Subscription {
    fn wants(&self, event: &ChangeEvent) -> bool {
        self.scope.as_ref().is_none_or(|scope| event.path.starts_with(scope))
    }
}

#[derive(Default)]
pub struct NotificationHub {
    pending:       Mutex<Vec<ChangeEvent>>,
    subscriptions: RwLock<Vec<Subscription>>,
    ids:           IdAllocator,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event.
    pub fn subscribe(&self, listener: Arc<dyn ResourceListener>) -> ListenerId {
        self.add(None, listener)
    }

    /// Receive events for `scope` and the resources below it.
    pub fn subscribe_under(
        &self,
        scope:    ResourcePath,
        listener: Arc<dyn ResourceListener>,
    ) -> ListenerId {
        self.add(Some(scope), listener)
    }

    fn add(&self, scope: Option<ResourcePath>, listener: Arc<dyn ResourceListener>) -> ListenerId {
        let id = self.ids.next_listener();
        self.subscriptions.write().push(Subscription { id, scope, listener });
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut subs = self.subscriptions.write();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Record a committed change.  Not delivered until [`flush`][Self::flush].
    pub fn notify(&self, event: ChangeEvent) {
        tracing::trace!(path = %event.path, kind = event.kind.as_str(), "change recorded");
        self.pending.lock().push(event);
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Deliver pending events in the order they were recorded.  Returns the
    /// number of events drained.
    ///
    /// Neither the pending queue nor the subscription list is locked while a
    /// listener runs.
    pub fn flush(&self) -> usize {
        let events = std::mem::take(&mut *self.pending.lock());
        if events.is_empty() {
            return 0;
        }
        let targets = self.subscriptions.read().clone();

        for event in &events {
            for sub in targets.iter().filter(|s| s.wants(event)) {
                sub.listener.on_change(event);
            }
        }
        events.len()
    }
}
