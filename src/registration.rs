//! Binding table types.

use std::any::{Any, TypeId};
use std::rc::Rc;

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::context::Context;
use crate::hierarchy::{AnyRc, NodeId, NodeProvider};
use crate::key::Key;
use crate::pool::Attached;
use crate::strategy::ComponentType;
use crate::{LifeCycle, ResolveResult};

pub(crate) type Ctor = Rc<dyn Fn(&Context) -> ResolveResult<AnyRc>>;

/// Builds one pooled prefab instance on the given tree.
pub(crate) type PrefabFactory<C> = Rc<dyn Fn(&mut dyn NodeProvider) -> Attached<C>>;

/// Acquires from a prefab pool without knowing its component type.
pub(crate) type PrefabAcquire = fn(&Context, &mut dyn NodeProvider, Option<NodeId>) -> ResolveResult<AnyRc>;

/// One way of constructing a key's instances.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) lifecycle: LifeCycle,
    pub(crate) ctor: Ctor,
    /// Concrete type behind a trait binding, for diagnostics.
    pub(crate) impl_name: Option<&'static str>,
}

impl Registration {
    pub(crate) fn new(lifecycle: LifeCycle, ctor: Ctor) -> Self {
        Self {
            lifecycle,
            ctor,
            impl_name: None,
        }
    }

    pub(crate) fn with_impl_name(mut self, name: &'static str) -> Self {
        self.impl_name = Some(name);
        self
    }

    /// A binding declared `DEFAULT` offers nothing, so every request accepts it.
    pub(crate) fn accepts(&self, requested: LifeCycle) -> bool {
        requested.is_compatible(self.lifecycle)
    }
}

/// Outcome of looking a key up in the binding table.
pub(crate) enum Lookup<'r> {
    Found(&'r Registration),
    /// Bindings exist but none offers a compatible lifecycle.
    Incompatible,
    Missing,
}

/// All bindings of a context. Frozen once the context is built.
#[derive(Default)]
pub(crate) struct Registry {
    bindings: AHashMap<Key, SmallVec<[Registration; 1]>>,
    components: AHashMap<TypeId, ComponentType>,
    /// `PrefabFactory<C>` values keyed by `TypeId::of::<C>()`.
    prefabs: AHashMap<TypeId, Box<dyn Any>>,
    acquirers: AHashMap<TypeId, PrefabAcquire>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends; earlier bindings for the same key take precedence.
    pub(crate) fn insert(&mut self, key: Key, registration: Registration) {
        self.bindings.entry(key).or_default().push(registration);
    }

    /// First registration for `key` whose lifecycle `requested` accepts.
    pub(crate) fn find(&self, key: &Key, requested: LifeCycle) -> Lookup<'_> {
        match self.bindings.get(key) {
            None => Lookup::Missing,
            Some(registrations) => registrations
                .iter()
                .find(|registration| registration.accepts(requested))
                .map_or(Lookup::Incompatible, Lookup::Found),
        }
    }

    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.bindings.contains_key(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Registration)> {
        self.bindings
            .iter()
            .flat_map(|(key, registrations)| registrations.iter().map(move |r| (key, r)))
    }

    pub(crate) fn insert_component(&mut self, ty: ComponentType) {
        self.components.insert(ty.type_id(), ty);
    }

    pub(crate) fn component(&self, type_id: TypeId) -> Option<&ComponentType> {
        self.components.get(&type_id)
    }

    pub(crate) fn insert_prefab<C: 'static>(&mut self, factory: PrefabFactory<C>) {
        self.prefabs.insert(TypeId::of::<C>(), Box::new(factory));
        self.acquirers
            .insert(TypeId::of::<C>(), crate::context::acquire_prefab::<C>);
    }

    pub(crate) fn prefab_acquire(&self, type_id: TypeId) -> Option<PrefabAcquire> {
        self.acquirers.get(&type_id).copied()
    }

    pub(crate) fn prefab<C: 'static>(&self) -> Option<PrefabFactory<C>> {
        self.prefabs
            .get(&TypeId::of::<C>())
            .and_then(|factory| factory.downcast_ref::<PrefabFactory<C>>())
            .cloned()
    }
}
