//! Structural operations: creating, deleting and relinking schedules.
//!
//! Each one holds the structural write lock and a transaction for its whole
//! duration, so no other structural change and no value mutation can
//! interleave with it.  `Created` / `Deleted` notifications are recorded and
//! delivered only after both are released.

use std::sync::Arc;

use sr_core::ResourcePath;
use sr_tree::ChangeEvent;

use crate::link::{SharedStore, StoreLink};
use crate::tree::Node;
use crate::{ScheduleError, ScheduleResource, ScheduleResult, ScheduleTree};

impl ScheduleTree {
    /// Create an empty, store-owning schedule at `path`.
    pub fn create(self: &Arc<Self>, path: ResourcePath) -> ScheduleResult<ScheduleResource> {
        let ctx = self.context();
        let id = {
            let _structure = ctx.structure.write()?;
            let tx = ctx.transactions.begin()?;
            if self.nodes.read().contains_key(&path) {
                return Err(ScheduleError::AlreadyExists(path));
            }
            let store = self.factory().create_store(path.as_str())?;
            let id = ctx.ids.next_store();
            self.nodes.write().insert(path.clone(), Node::owned(id, store));
            tx.commit();
            id
        };

        tracing::info!(path = %path, store = %id, "schedule created");
        ctx.notifications.notify(ChangeEvent::created(path.clone()));
        ctx.deliver();
        Ok(self.handle(path))
    }

    /// Create an alias at `path` that reads and writes the samples of the
    /// schedule at `target`.  An alias of an alias points at the owner.
    pub fn create_reference(
        self:   &Arc<Self>,
        path:   ResourcePath,
        target: &ResourcePath,
    ) -> ScheduleResult<ScheduleResource> {
        let ctx = self.context();
        let location = {
            let _structure = ctx.structure.write()?;
            let tx = ctx.transactions.begin()?;
            if self.nodes.read().contains_key(&path) {
                return Err(ScheduleError::AlreadyExists(path));
            }
            if &path == target {
                return Err(ScheduleError::Structural(format!("{path} cannot reference itself")));
            }
            let resolved = self.resolve(target)?;
            let link = StoreLink::alias_of(resolved.location.clone(), resolved.id, &resolved.store);
            self.nodes.write().insert(path.clone(), Node::alias(link));
            tx.commit();
            resolved.location
        };

        tracing::info!(path = %path, location = %location, "schedule reference created");
        ctx.notifications.notify(ChangeEvent::created(path.clone()));
        ctx.deliver();
        Ok(self.handle(path))
    }
}

impl ScheduleResource {
    /// Remove this schedule from the tree.
    ///
    /// An owning schedule loses its samples, its store is destroyed, and every
    /// alias pointing at it is removed too.  An alias is simply unlinked: the
    /// schedule it points at keeps all its samples.
    ///
    /// Returns `Ok(false)` if there was nothing to delete.
    pub fn delete(&self) -> ScheduleResult<bool> {
        let tree = self.tree();
        let ctx = tree.context();
        let path = self.path();

        let removed = {
            let _structure = ctx.structure.write()?;
            let tx = ctx.transactions.begin()?;

            let (alias, store) = {
                let mut nodes = tree.nodes.write();
                match nodes.get_mut(path) {
                    Some(node) if !node.deleting => {
                        node.deleting = true;
                        (node.link.is_alias(), node.link.upgrade())
                    }
                    _ => return Ok(false),
                }
            };

            if !alias {
                if let Some(store) = store {
                    if let Err(e) = discard(tree, &store) {
                        if let Some(node) = tree.nodes.write().get_mut(path) {
                            node.deleting = false;
                        }
                        return Err(e);
                    }
                }
            }

            let mut nodes = tree.nodes.write();
            nodes.remove(path);
            let mut removed = vec![path.clone()];
            if !alias {
                let orphans: Vec<ResourcePath> = nodes
                    .iter()
                    .filter(|(_, n)| n.link.target() == Some(path))
                    .map(|(p, _)| p.clone())
                    .collect();
                for orphan in orphans {
                    nodes.remove(&orphan);
                    removed.push(orphan);
                }
            }
            drop(nodes);
            tx.commit();
            removed
        };

        for p in removed {
            tracing::info!(path = %p, "schedule deleted");
            ctx.notifications.notify(ChangeEvent::deleted(p));
        }
        ctx.deliver();
        Ok(true)
    }

    /// Turn this schedule into an alias of `target`.
    ///
    /// If it owned a store, that store's samples are discarded and the store
    /// destroyed, and aliases that pointed here are re-pointed at `target`'s
    /// owner.  Referencing itself, directly or through an alias, is a
    /// structural error.  Returns `Ok(false)` if this schedule does not exist.
    pub fn set_as_reference(&self, target: &ResourcePath) -> ScheduleResult<bool> {
        let tree = self.tree();
        let ctx = tree.context();
        let path = self.path();

        let location = {
            let _structure = ctx.structure.write()?;
            let tx = ctx.transactions.begin()?;

            let owned = {
                let nodes = tree.nodes.read();
                match nodes.get(path) {
                    Some(node) if !node.deleting => match &node.link {
                        StoreLink::Owned { store, .. } => Some(Arc::clone(store)),
                        StoreLink::Aliased { .. } => None,
                    },
                    _ => return Ok(false),
                }
            };
            if target == path {
                return Err(ScheduleError::Structural(format!("{path} cannot reference itself")));
            }
            let resolved = tree.resolve(target)?;
            if &resolved.location == path {
                return Err(ScheduleError::Structural(format!(
                    "{path} cannot reference {target}, which already references it"
                )));
            }

            if let Some(store) = &owned {
                discard(tree, store)?;
            }

            let mut nodes = tree.nodes.write();
            let relink = |n: &mut Node| {
                n.link = StoreLink::alias_of(resolved.location.clone(), resolved.id, &resolved.store);
            };
            if let Some(node) = nodes.get_mut(path) {
                relink(node);
            }
            if owned.is_some() {
                for node in nodes.values_mut().filter(|n| n.link.target() == Some(path)) {
                    relink(node);
                }
            }
            drop(nodes);
            tx.commit();
            resolved.location
        };

        tracing::info!(path = %path, location = %location, "schedule turned into a reference");
        let stamped = tree.last_update(path).ok().flatten();
        ctx.notifications.notify(ChangeEvent::value_changed(path.clone(), stamped));
        ctx.deliver();
        Ok(true)
    }
}

/// Destroy an owned store along with its samples and last-update time.
fn discard(tree: &ScheduleTree, store: &SharedStore) -> ScheduleResult<()> {
    tree.write_store(store)?.destroy()?;
    Ok(())
}
