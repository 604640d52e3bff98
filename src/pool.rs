//! Recyclable instance pools.
//!
//! A [`Pool`] tracks every instance it ever handed out. An entry is either
//! *active* (in use) or *inactive* (recyclable); where that flag lives is up
//! to the [`PoolHost`]; for node-backed entries it is the node's active flag.
//! Releasing is implicit: flip the entry inactive and the next
//! [`acquire`](Pool::acquire) may hand it out again.
//!
//! Both acquisition and preloading first prune entries whose underlying
//! resource no longer exists; pruned entries are dropped, never reused.
//!
//! # Examples
//!
//! ```
//! use ferrous_resolver::{NodeProvider, OrderedPool, SceneTree};
//!
//! let mut tree = SceneTree::new();
//! let mut bullets: OrderedPool<_> = OrderedPool::new();
//! bullets.preload(&mut tree, 2, None, |tree| tree.create_node("bullet", None));
//!
//! let first = bullets.acquire(&mut tree, None, |tree| tree.create_node("bullet", None));
//! let second = bullets.acquire(&mut tree, None, |tree| tree.create_node("bullet", None));
//! assert_ne!(first, second);
//! assert_eq!(bullets.len(), 2);
//!
//! tree.set_active(first, false); // release
//! let third = bullets.acquire(&mut tree, None, |tree| tree.create_node("bullet", None));
//! assert_eq!(third, first);
//! ```

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::Rc;

use ahash::AHashSet;

use crate::hierarchy::{NodeId, NodeProvider};

/// Backing collection of a pool.
///
/// Implemented for `Vec<T>` (entries scanned in insertion order) and
/// `AHashSet<T>` (no order guarantee).
pub trait PoolStorage<T> {
    type Iter<'a>: Iterator<Item = &'a T>
    where
        Self: 'a,
        T: 'a;

    fn retain<F: FnMut(&T) -> bool>(&mut self, keep: F);

    fn insert(&mut self, item: T);

    fn len(&self) -> usize;

    fn iter(&self) -> Self::Iter<'_>;
}

impl<T> PoolStorage<T> for Vec<T> {
    type Iter<'a> = std::slice::Iter<'a, T> where T: 'a;

    fn retain<F: FnMut(&T) -> bool>(&mut self, keep: F) {
        Vec::retain(self, keep);
    }

    fn insert(&mut self, item: T) {
        self.push(item);
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.as_slice().iter()
    }
}

impl<T: Hash + Eq> PoolStorage<T> for AHashSet<T> {
    type Iter<'a> = std::collections::hash_set::Iter<'a, T> where T: 'a;

    fn retain<F: FnMut(&T) -> bool>(&mut self, mut keep: F) {
        std::collections::HashSet::retain(self, |item| keep(item));
    }

    fn insert(&mut self, item: T) {
        std::collections::HashSet::insert(self, item);
    }

    fn len(&self) -> usize {
        std::collections::HashSet::len(self)
    }

    fn iter(&self) -> Self::Iter<'_> {
        std::collections::HashSet::iter(self)
    }
}

/// Answers liveness and activity questions about pool entries.
pub trait PoolHost<T> {
    /// Whether the entry's underlying resource still exists.
    fn exists(&self, item: &T) -> bool;

    fn is_active(&self, item: &T) -> bool;

    fn set_active(&mut self, item: &T, active: bool);

    /// Moves the entry under `owner`. Pool membership is unaffected.
    fn reparent(&mut self, _item: &T, _owner: NodeId) {}
}

impl<P: NodeProvider + ?Sized> PoolHost<NodeId> for P {
    fn exists(&self, item: &NodeId) -> bool {
        NodeProvider::exists(self, *item)
    }

    fn is_active(&self, item: &NodeId) -> bool {
        NodeProvider::is_active(self, *item)
    }

    fn set_active(&mut self, item: &NodeId, active: bool) {
        NodeProvider::set_active(self, *item, active);
    }

    fn reparent(&mut self, item: &NodeId, owner: NodeId) {
        self.set_parent(*item, Some(owner));
    }
}

/// A component living on a pooled node.
pub struct Attached<C: ?Sized> {
    pub node: NodeId,
    pub component: Rc<C>,
}

impl<C: ?Sized> Attached<C> {
    pub fn new(node: NodeId, component: Rc<C>) -> Self {
        Self { node, component }
    }
}

impl<C: ?Sized> Clone for Attached<C> {
    fn clone(&self) -> Self {
        Self {
            node: self.node,
            component: self.component.clone(),
        }
    }
}

impl<C: ?Sized> PartialEq for Attached<C> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && Rc::ptr_eq(&self.component, &other.component)
    }
}

impl<C: ?Sized> Eq for Attached<C> {}

impl<C: ?Sized> Hash for Attached<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.hash(state);
    }
}

impl<C: ?Sized> fmt::Debug for Attached<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attached").field("node", &self.node).finish()
    }
}

impl<P: NodeProvider + ?Sized, C: ?Sized> PoolHost<Attached<C>> for P {
    fn exists(&self, item: &Attached<C>) -> bool {
        NodeProvider::exists(self, item.node)
    }

    fn is_active(&self, item: &Attached<C>) -> bool {
        NodeProvider::is_active(self, item.node)
    }

    fn set_active(&mut self, item: &Attached<C>, active: bool) {
        NodeProvider::set_active(self, item.node, active);
    }

    fn reparent(&mut self, item: &Attached<C>, owner: NodeId) {
        self.set_parent(item.node, Some(owner));
    }
}

/// Plain objects that carry their own alive flag.
pub trait Poolable {
    fn is_alive(&self) -> bool;

    fn set_alive(&self, alive: bool);

    /// Whether the object is still usable at all.
    fn exists(&self) -> bool {
        true
    }
}

/// Ready-made alive flag for [`Poolable`] implementors.
#[derive(Debug, Default)]
pub struct AliveFlag(Cell<bool>);

impl AliveFlag {
    pub fn get(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, alive: bool) {
        self.0.set(alive);
    }
}

/// [`PoolHost`] for `Rc<T: Poolable>` entries, which need no tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectHost;

impl<T: Poolable + ?Sized> PoolHost<Rc<T>> for ObjectHost {
    fn exists(&self, item: &Rc<T>) -> bool {
        item.exists()
    }

    fn is_active(&self, item: &Rc<T>) -> bool {
        item.is_alive()
    }

    fn set_active(&mut self, item: &Rc<T>, active: bool) {
        item.set_alive(active);
    }
}

/// How an acquisition was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// An inactive entry was reactivated.
    Recycled,
    /// The pool had no inactive entry and built a new one.
    Built,
}

/// A recyclable collection of instances.
pub struct Pool<T, S = Vec<T>> {
    entries: S,
    _marker: PhantomData<T>,
}

/// Pool scanned in insertion order.
pub type OrderedPool<T> = Pool<T, Vec<T>>;

/// Pool without ordering guarantees.
pub type UnorderedPool<T> = Pool<T, AHashSet<T>>;

impl<T, S: Default> Default for Pool<T, S> {
    fn default() -> Self {
        Self {
            entries: S::default(),
            _marker: PhantomData,
        }
    }
}

impl<T, S: Default> Pool<T, S> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: fmt::Debug, S: PoolStorage<T>> fmt::Debug for Pool<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

impl<T: Clone, S: PoolStorage<T>> Pool<T, S> {
    /// Wraps an existing collection; its entries join the pool as they are.
    pub fn from_storage(entries: S) -> Self {
        Self {
            entries,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    pub fn iter(&self) -> S::Iter<'_> {
        self.entries.iter()
    }

    pub fn into_storage(self) -> S {
        self.entries
    }

    /// Entries currently marked active.
    pub fn active_count<H: PoolHost<T> + ?Sized>(&self, host: &H) -> usize {
        self.entries
            .iter()
            .filter(|item| host.exists(item) && host.is_active(item))
            .count()
    }

    /// Drops entries whose resource no longer exists. Returns how many went.
    pub fn prune<H: PoolHost<T> + ?Sized>(&mut self, host: &H) -> usize {
        let before = self.entries.len();
        self.entries.retain(|item| host.exists(item));
        let pruned = before - self.entries.len();
        if pruned > 0 {
            tracing::trace!(pruned, "Pruned dead pool entries");
        }
        pruned
    }

    /// Hands out an inactive entry, or builds one with `factory`.
    ///
    /// The returned entry is marked active and, with an `owner`, moved under it.
    pub fn acquire<H, F>(&mut self, host: &mut H, owner: Option<NodeId>, factory: F) -> T
    where
        H: PoolHost<T> + ?Sized,
        F: FnOnce(&mut H) -> T,
    {
        self.acquire_entry(host, owner, factory).0
    }

    /// Like [`acquire`](Self::acquire), also reporting whether the entry was recycled.
    pub fn acquire_entry<H, F>(&mut self, host: &mut H, owner: Option<NodeId>, factory: F) -> (T, Acquisition)
    where
        H: PoolHost<T> + ?Sized,
        F: FnOnce(&mut H) -> T,
    {
        self.prune(host);

        let idle = self.entries.iter().find(|item| !host.is_active(item)).cloned();
        if let Some(item) = idle {
            host.set_active(&item, true);
            if let Some(owner) = owner {
                host.reparent(&item, owner);
            }
            tracing::trace!("Recycled pool entry");
            return (item, Acquisition::Recycled);
        }

        let item = factory(host);
        host.set_active(&item, true);
        self.entries.insert(item.clone());
        if let Some(owner) = owner {
            host.reparent(&item, owner);
        }
        tracing::trace!(size = self.entries.len(), "Grew pool");
        (item, Acquisition::Built)
    }

    /// Builds inactive entries until at least `count` live entries exist.
    pub fn preload<H, F>(&mut self, host: &mut H, count: usize, owner: Option<NodeId>, mut factory: F) -> &mut Self
    where
        H: PoolHost<T> + ?Sized,
        F: FnMut(&mut H) -> T,
    {
        self.prune(host);
        while self.entries.len() < count {
            let item = factory(host);
            host.set_active(&item, false);
            if let Some(owner) = owner {
                host.reparent(&item, owner);
            }
            self.entries.insert(item);
        }
        self
    }

    /// Marks `item` inactive so it can be recycled.
    pub fn release<H: PoolHost<T> + ?Sized>(&self, host: &mut H, item: &T) {
        host.set_active(item, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SceneTree;

    struct Shell {
        alive: AliveFlag,
    }

    impl Poolable for Shell {
        fn is_alive(&self) -> bool {
            self.alive.get()
        }

        fn set_alive(&self, alive: bool) {
            self.alive.set(alive);
        }
    }

    fn shell(_: &mut ObjectHost) -> Rc<Shell> {
        Rc::new(Shell {
            alive: AliveFlag::default(),
        })
    }

    #[test]
    fn object_pool_recycles() {
        let mut host = ObjectHost;
        let mut pool: OrderedPool<Rc<Shell>> = OrderedPool::new();
        let a = pool.acquire(&mut host, None, shell);
        let b = pool.acquire(&mut host, None, shell);
        assert!(!Rc::ptr_eq(&a, &b));
        assert!(a.is_alive() && b.is_alive());

        pool.release(&mut host, &a);
        let c = pool.acquire(&mut host, None, shell);
        assert!(Rc::ptr_eq(&a, &c));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn preload_never_overshoots() {
        let mut host = ObjectHost;
        let mut pool: OrderedPool<Rc<Shell>> = OrderedPool::new();
        pool.preload(&mut host, 3, None, shell);
        pool.preload(&mut host, 3, None, shell);
        pool.preload(&mut host, 2, None, shell);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.active_count(&host), 0);
    }

    #[test]
    fn pruned_nodes_are_not_reused() {
        let mut tree = SceneTree::new();
        let mut pool: UnorderedPool<NodeId> = UnorderedPool::new();
        pool.preload(&mut tree, 2, None, |tree| tree.create_node("item", None));
        let doomed = *pool.iter().next().unwrap();
        let survivor = *pool.iter().find(|node| **node != doomed).unwrap();
        tree.destroy(doomed);

        let got = pool.acquire(&mut tree, None, |tree| tree.create_node("item", None));
        assert_eq!(got, survivor);
        assert_eq!(pool.len(), 1);
        assert_eq!(tree.created_count(), 2);
        assert!(!pool.iter().any(|node| *node == doomed));
    }

    #[test]
    fn reparent_keeps_membership() {
        let mut tree = SceneTree::new();
        let owner = tree.create_node("owner", None);
        let mut pool: OrderedPool<NodeId> = OrderedPool::new();
        let item = pool.acquire(&mut tree, Some(owner), |tree| tree.create_node("item", None));
        assert_eq!(tree.parent(item), Some(owner));

        let elsewhere = tree.create_node("elsewhere", None);
        tree.set_parent(item, Some(elsewhere));
        NodeProvider::set_active(&mut tree, item, false);

        let again = pool.acquire(&mut tree, Some(owner), |tree| tree.create_node("item", None));
        assert_eq!(again, item);
        assert_eq!(tree.parent(item), Some(owner));
    }
}
