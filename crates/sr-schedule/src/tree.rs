//! `ScheduleTree` — the registry of schedule nodes.
//!
//! The tree maps each [`ResourcePath`] to a node holding its [`StoreLink`].
//! A schedule's last-update time lives in its store, so a persistent backend
//! keeps it along with the samples.  It owns the [`TreeContext`] and the
//! [`StoreFactory`] new schedules draw their stores from.  Handles
//! ([`ScheduleResource`]) hold an `Arc` to the tree and look their node up on
//! every call, so a handle outlives the node it names without dangling.
//!
//! # Locks
//!
//! The node table has its own short-lived `RwLock`.  It is always taken after
//! the structural lock and the transaction, and before any store lock, and is
//! never held across a store call.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use sr_core::{ResourcePath, StoreId, Timestamp};
use sr_store::{MemoryStoreFactory, StoreError, StoreFactory, TimeSeriesStore};
use sr_tree::{StoreBackend, TreeContext, TreeError};

use crate::link::{SharedStore, StoreLink};
use crate::{ScheduleError, ScheduleResource, ScheduleResult};

#[cfg(feature = "fx-hash")]
pub(crate) type NodeMap = rustc_hash::FxHashMap<ResourcePath, Node>;
#[cfg(not(feature = "fx-hash"))]
pub(crate) type NodeMap = std::collections::HashMap<ResourcePath, Node>;

pub(crate) struct Node {
    pub link:     StoreLink,
    /// Set while a deletion is in progress; the node no longer "exists".
    pub deleting: bool,
}

impl Node {
    pub fn owned(id: StoreId, store: Box<dyn TimeSeriesStore>) -> Self {
        Self {
            link:     StoreLink::Owned { id, store: Arc::new(RwLock::new(store)) },
            deleting: false,
        }
    }

    pub fn alias(link: StoreLink) -> Self {
        Self { link, deleting: false }
    }
}

/// A node resolved to the store it reads and writes.
pub(crate) struct Resolved {
    /// Path of the owning schedule (the node itself unless it is an alias).
    pub location: ResourcePath,
    pub id:       StoreId,
    pub store:    SharedStore,
}

pub struct ScheduleTree {
    ctx:              TreeContext,
    factory:          Box<dyn StoreFactory>,
    pub(crate) nodes: RwLock<NodeMap>,
}

impl ScheduleTree {
    /// A tree whose stores come from the backend named in the context's
    /// configuration.
    pub fn new(ctx: TreeContext) -> ScheduleResult<Arc<Self>> {
        let factory = factory_for(&ctx.config.store)?;
        Ok(Self::with_factory(ctx, factory))
    }

    pub fn with_factory(ctx: TreeContext, factory: Box<dyn StoreFactory>) -> Arc<Self> {
        tracing::info!(backend = ?ctx.config.store, "schedule tree opened");
        Arc::new(Self { ctx, factory, nodes: RwLock::new(NodeMap::default()) })
    }

    pub fn context(&self) -> &TreeContext {
        &self.ctx
    }

    pub(crate) fn factory(&self) -> &dyn StoreFactory {
        self.factory.as_ref()
    }

    /// Handle to the schedule at `path`, if one exists.
    pub fn get(self: &Arc<Self>, path: &ResourcePath) -> Option<ScheduleResource> {
        self.contains(path)
            .then(|| ScheduleResource::new(path.clone(), Arc::clone(self)))
    }

    /// Handle to `path` whether or not a schedule exists there yet.
    pub fn handle(self: &Arc<Self>, path: ResourcePath) -> ScheduleResource {
        ScheduleResource::new(path, Arc::clone(self))
    }

    pub fn contains(&self, path: &ResourcePath) -> bool {
        self.nodes.read().get(path).is_some_and(|n| !n.deleting)
    }

    /// Paths of every existing schedule, sorted.
    pub fn paths(&self) -> Vec<ResourcePath> {
        let mut paths: Vec<_> = self
            .nodes
            .read()
            .iter()
            .filter(|(_, n)| !n.deleting)
            .map(|(p, _)| p.clone())
            .collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.nodes.read().values().filter(|n| !n.deleting).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Crate-internal node access ────────────────────────────────────────

    /// Resolve `path` to its backing store.  Missing, mid-deletion, and
    /// dangling nodes are all `NotFound`.
    pub(crate) fn resolve(&self, path: &ResourcePath) -> ScheduleResult<Resolved> {
        let nodes = self.nodes.read();
        let node = live(&nodes, path)?;
        let location = match node.link.target() {
            Some(target) => {
                live(&nodes, target)?;
                target.clone()
            }
            None => path.clone(),
        };
        let store = node
            .link
            .upgrade()
            .ok_or_else(|| ScheduleError::NotFound(path.clone()))?;
        Ok(Resolved { location, id: node.link.id(), store })
    }

    /// Record a committed mutation of the schedule at `location` as its
    /// store's last-modified time.  The stamp never moves backwards.  Returns
    /// the new last-update time, or `None` if the schedule was deleted or
    /// relinked away from store `id` in the meantime.
    pub(crate) fn stamp(
        &self,
        location: &ResourcePath,
        id:       StoreId,
        now:      Timestamp,
    ) -> ScheduleResult<Option<Timestamp>> {
        let store = match self.resolve(location) {
            Ok(r) if r.id == id => r.store,
            Ok(_) | Err(ScheduleError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let mut store = self.write_store(&store)?;
        let stamped = match store.last_modified() {
            Ok(prev) => prev.map_or(now, |prev| prev.max(now)),
            Err(StoreError::Destroyed) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        store.set_last_modified(Some(stamped))?;
        Ok(Some(stamped))
    }

    /// Last-update time of the store `path` reads and writes; an alias
    /// reports its owner's.
    pub(crate) fn last_update(&self, path: &ResourcePath) -> ScheduleResult<Option<Timestamp>> {
        let resolved = self.resolve(path)?;
        let store = self.read_store(&resolved.store)?;
        Ok(store.last_modified()?)
    }

    pub(crate) fn is_alias(&self, path: &ResourcePath) -> ScheduleResult<bool> {
        let nodes = self.nodes.read();
        Ok(live(&nodes, path)?.link.is_alias())
    }

    pub(crate) fn read_store<'a>(
        &self,
        store: &'a SharedStore,
    ) -> ScheduleResult<RwLockReadGuard<'a, Box<dyn TimeSeriesStore>>> {
        store.try_read_for(self.ctx.config.lock_timeout()).ok_or_else(|| {
            ScheduleError::Tree(TreeError::LockTimeout {
                what:       "store read",
                timeout_ms: self.ctx.config.lock_timeout_ms,
            })
        })
    }

    pub(crate) fn write_store<'a>(
        &self,
        store: &'a SharedStore,
    ) -> ScheduleResult<RwLockWriteGuard<'a, Box<dyn TimeSeriesStore>>> {
        store.try_write_for(self.ctx.config.lock_timeout()).ok_or_else(|| {
            tracing::warn!(timeout_ms = self.ctx.config.lock_timeout_ms, "store write lock timed out");
            ScheduleError::Tree(TreeError::LockTimeout {
                what:       "store write",
                timeout_ms: self.ctx.config.lock_timeout_ms,
            })
        })
    }
}

fn live<'a>(nodes: &'a NodeMap, path: &ResourcePath) -> ScheduleResult<&'a Node> {
    nodes
        .get(path)
        .filter(|n| !n.deleting)
        .ok_or_else(|| ScheduleError::NotFound(path.clone()))
}

fn factory_for(backend: &StoreBackend) -> ScheduleResult<Box<dyn StoreFactory>> {
    match backend {
        StoreBackend::Memory => Ok(Box::new(MemoryStoreFactory)),
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite { path } => Ok(Box::new(sr_store::SqliteStoreFactory::new(path.clone()))),
        #[cfg(not(feature = "sqlite"))]
        StoreBackend::Sqlite { .. } => Err(TreeError::Config(
            "the sqlite store backend requires the `sqlite` feature".into(),
        )
        .into()),
    }
}
