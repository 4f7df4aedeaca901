//! How a schedule node reaches its samples.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use sr_core::{ResourcePath, StoreId};
use sr_store::TimeSeriesStore;

/// A store shared between its owner and any aliases of the owner.
pub type SharedStore = Arc<RwLock<Box<dyn TimeSeriesStore>>>;

pub enum StoreLink {
    /// The node owns the store and destroys it on deletion.
    Owned { id: StoreId, store: SharedStore },
    /// The node borrows the store of the schedule at `target`.  Aliases always
    /// point at an owner, never at another alias.
    Aliased {
        target: ResourcePath,
        id:     StoreId,
        store:  Weak<RwLock<Box<dyn TimeSeriesStore>>>,
    },
}

impl StoreLink {
    pub fn alias_of(target: ResourcePath, id: StoreId, store: &SharedStore) -> Self {
        StoreLink::Aliased { target, id, store: Arc::downgrade(store) }
    }

    pub fn id(&self) -> StoreId {
        match self {
            StoreLink::Owned { id, .. } | StoreLink::Aliased { id, .. } => *id,
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, StoreLink::Aliased { .. })
    }

    /// The owning path if this is an alias.
    pub fn target(&self) -> Option<&ResourcePath> {
        match self {
            StoreLink::Owned { .. } => None,
            StoreLink::Aliased { target, .. } => Some(target),
        }
    }

    /// A strong handle to the store, or `None` if the owner has gone.
    pub fn upgrade(&self) -> Option<SharedStore> {
        match self {
            StoreLink::Owned { store, .. } => Some(Arc::clone(store)),
            StoreLink::Aliased { store, .. } => store.upgrade(),
        }
    }
}
