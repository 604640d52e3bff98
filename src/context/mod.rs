//! The resolution context.
//!
//! A [`Context`] owns the binding table, the singleton cache, the prefab
//! pools and the disposal hooks of one scope. It is created by a
//! [`ContextBuilder`] and passed around explicitly; there is no ambient
//! global instance. The node tree is never owned: calls that touch the
//! hierarchy take a `&mut dyn NodeProvider`.

use std::any::{type_name, Any, TypeId};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use ahash::AHashMap;

mod builder;
mod wiring;

pub use builder::ContextBuilder;
pub use wiring::Wiring;

use crate::config::ContainerConfig;
use crate::descriptors::{DescriptorTable, Injectable};
use crate::hierarchy::{AnyRc, NodeId, NodeProvider};
use crate::internal::{DisposeBag, ResolutionStack};
use crate::key::{key_of_trait, key_of_type, CacheKey, Key};
use crate::lifecycle::Category;
use crate::observer::{Diagnostic, Observers};
use crate::pool::{Acquisition, Attached, OrderedPool};
use crate::registration::{Lookup, PrefabFactory, Registry};
use crate::strategy::{ComponentType, InChildren, LocateCx, Locator};
use crate::traits::Dispose;
use crate::{LifeCycle, ResolveError, ResolveResult};

type Fallback<'f> = &'f dyn Fn(&Context) -> ResolveResult<AnyRc>;

/// Summary of one binding, for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingInfo {
    pub key: Key,
    pub lifecycle: LifeCycle,
    /// Concrete type the factory produces, when known.
    pub impl_name: Option<&'static str>,
}

/// Resolves bindings, components and prefabs for one scope.
///
/// # Examples
///
/// ```rust
/// use ferrous_resolver::{ContextBuilder, LifeCycle};
/// use std::rc::Rc;
///
/// struct Counter;
///
/// let mut builder = ContextBuilder::new();
/// builder.bind_factory(LifeCycle::DEFAULT, |_| Ok(Counter));
/// let context = builder.build();
///
/// let a = context.resolve::<Counter>(LifeCycle::TRANSIENT).unwrap();
/// let b = context.resolve::<Counter>(LifeCycle::TRANSIENT).unwrap();
/// assert!(!Rc::ptr_eq(&a, &b));
///
/// let c = context.resolve::<Counter>(LifeCycle::SINGLETON).unwrap();
/// let d = context.resolve::<Counter>(LifeCycle::SINGLETON).unwrap();
/// assert!(Rc::ptr_eq(&c, &d));
///
/// context.dispose();
/// let e = context.resolve::<Counter>(LifeCycle::SINGLETON).unwrap();
/// assert!(!Rc::ptr_eq(&c, &e));
/// ```
pub struct Context {
    registry: Registry,
    observers: Observers,
    config: ContainerConfig,
    singletons: RefCell<AHashMap<CacheKey, AnyRc>>,
    /// Singleton-class components keyed by component type, apart from service singletons.
    components: RefCell<AHashMap<TypeId, AnyRc>>,
    descriptors: RefCell<AHashMap<TypeId, Rc<DescriptorTable>>>,
    /// `OrderedPool<Attached<C>>` values keyed by `TypeId::of::<C>()`.
    prefab_pools: RefCell<AHashMap<TypeId, Box<dyn Any>>>,
    disposers: RefCell<DisposeBag>,
    teardown: RefCell<Vec<Box<dyn FnMut()>>>,
    stack: ResolutionStack,
    disposals: Cell<u64>,
}

impl Context {
    pub(crate) fn from_parts(registry: Registry, observers: Observers, config: ContainerConfig) -> Self {
        Self {
            registry,
            observers,
            config,
            singletons: RefCell::new(AHashMap::new()),
            components: RefCell::new(AHashMap::new()),
            descriptors: RefCell::new(AHashMap::new()),
            prefab_pools: RefCell::new(AHashMap::new()),
            disposers: RefCell::new(DisposeBag::default()),
            teardown: RefCell::new(Vec::new()),
            stack: ResolutionStack::default(),
            disposals: Cell::new(0),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Resolves `T` under `lifecycle`.
    ///
    /// Singleton-class lifecycles return the cached instance when there is
    /// one and cache what they build; transient-class ones always build.
    pub fn resolve<T: 'static>(&self, lifecycle: LifeCycle) -> ResolveResult<Rc<T>> {
        self.resolve_key(key_of_type::<T>(), lifecycle, None, None)
            .and_then(downcast::<T>)
    }

    /// Resolves `T` from `caller`, choosing the source by lifecycle.
    ///
    /// Pooled lifecycles acquire from `T`'s prefab pool with `caller` as the
    /// owner. Attachable lifecycles locate a component with `locator` and fall
    /// back to the binding table when nothing is found. Every other lifecycle
    /// goes straight to the binding table, as [`resolve`](Self::resolve) does.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ferrous_resolver::{Attached, ContextBuilder, LifeCycle, Locator, NodeProvider, SceneTree};
    /// use std::rc::Rc;
    ///
    /// struct Bullet;
    ///
    /// let mut builder = ContextBuilder::new();
    /// builder.bind_prefab(|provider: &mut dyn NodeProvider| {
    ///     let node = provider.create_node("bullet", None);
    ///     Attached::new(node, Rc::new(Bullet))
    /// });
    /// let context = builder.build();
    ///
    /// let mut tree = SceneTree::new();
    /// let gun = tree.create_node("gun", None);
    /// let bullet = context.resolve_on::<Bullet>(&mut tree, Some(gun), LifeCycle::PREFAB, &Locator::default());
    /// assert!(bullet.is_ok());
    /// assert_eq!(context.prefab_pool_len::<Bullet>(), 1);
    /// ```
    pub fn resolve_on<T: 'static>(
        &self,
        provider: &mut dyn NodeProvider,
        caller: Option<NodeId>,
        lifecycle: LifeCycle,
        locator: &Locator,
    ) -> ResolveResult<Rc<T>> {
        self.resolve_routed(key_of_type::<T>(), lifecycle, provider, caller, locator)
            .and_then(downcast::<T>)
    }

    /// Like [`resolve`](Self::resolve), caching singletons per named scope.
    pub fn resolve_scoped<T: 'static>(&self, lifecycle: LifeCycle, scope: &str) -> ResolveResult<Rc<T>> {
        self.resolve_key(key_of_type::<T>(), lifecycle, Some(scope), None)
            .and_then(downcast::<T>)
    }

    pub fn resolve_named<T: 'static>(&self, lifecycle: LifeCycle, name: &'static str) -> ResolveResult<Rc<T>> {
        self.resolve_key(key_of_type::<T>().named(name), lifecycle, None, None)
            .and_then(downcast::<T>)
    }

    /// Resolves a trait object bound with `bind_trait`.
    pub fn resolve_trait<T: ?Sized + 'static>(&self, lifecycle: LifeCycle) -> ResolveResult<Rc<T>> {
        self.resolve_key(key_of_trait::<T>(), lifecycle, None, None)
            .and_then(downcast_trait::<T>)
    }

    pub fn resolve_trait_named<T: ?Sized + 'static>(
        &self,
        lifecycle: LifeCycle,
        name: &'static str,
    ) -> ResolveResult<Rc<T>> {
        self.resolve_key(key_of_trait::<T>().named(name), lifecycle, None, None)
            .and_then(downcast_trait::<T>)
    }

    /// Resolves `T` through its binding, or builds it from its descriptor
    /// table when it has none. Caching follows `lifecycle` either way.
    pub fn resolve_injectable<T: Injectable>(&self, lifecycle: LifeCycle) -> ResolveResult<Rc<T>> {
        let construct = |context: &Context| context.construct::<T>().map(|value| Rc::new(value) as AnyRc);
        self.resolve_key(key_of_type::<T>(), lifecycle, None, Some(&construct))
            .and_then(downcast::<T>)
    }

    /// Builds `T` from its descriptor table. Component slots fail without a node provider.
    pub fn construct<T: Injectable>(&self) -> ResolveResult<T> {
        let table = self.descriptor_table::<T>();
        let wiring = Wiring::fill(self, &table, None, None)?;
        T::construct(&wiring)
    }

    /// Builds `T`, locating its component slots from `caller`.
    pub fn construct_on<T: Injectable>(
        &self,
        provider: &mut dyn NodeProvider,
        caller: Option<NodeId>,
    ) -> ResolveResult<T> {
        let table = self.descriptor_table::<T>();
        let wiring = Wiring::fill(self, &table, Some(provider), caller)?;
        T::construct(&wiring)
    }

    /// The cached descriptor table of `T`, built on first use.
    pub fn descriptor_table<T: Injectable>(&self) -> Rc<DescriptorTable> {
        let cached = self.descriptors.borrow().get(&TypeId::of::<T>()).cloned();
        if let Some(table) = cached {
            return table;
        }
        let mut table = DescriptorTable::new();
        T::describe(&mut table);
        let table = Rc::new(table);
        tracing::trace!(ty = type_name::<T>(), slots = table.len(), "Built descriptor table");
        self.descriptors
            .borrow_mut()
            .insert(TypeId::of::<T>(), table.clone());
        table
    }

    /// Locates a component of type `C` from `caller` with `locator`.
    ///
    /// Misses attach a new `C` when it was bound with `bind_component`;
    /// otherwise they yield `Ok(None)` and a diagnostic. Singleton-class
    /// lifecycles cache the component per type.
    pub fn resolve_component<C: 'static>(
        &self,
        provider: &mut dyn NodeProvider,
        caller: Option<NodeId>,
        lifecycle: LifeCycle,
        locator: &Locator,
    ) -> ResolveResult<Option<Rc<C>>> {
        self.locate_component(provider, caller, lifecycle, locator, &ComponentType::of::<C>())?
            .map(downcast::<C>)
            .transpose()
    }

    /// Every `C` the locator finds; never cached.
    pub fn resolve_components<C: 'static>(
        &self,
        provider: &mut dyn NodeProvider,
        caller: Option<NodeId>,
        lifecycle: LifeCycle,
        locator: &Locator,
    ) -> ResolveResult<Vec<Rc<C>>> {
        self.locate_components(provider, caller, lifecycle, locator, &ComponentType::of::<C>())?
            .into_iter()
            .map(downcast::<C>)
            .collect()
    }

    /// Hands out a pooled `C`, recycling an inactive one when possible.
    pub fn resolve_prefab<C: 'static>(
        &self,
        provider: &mut dyn NodeProvider,
        owner: Option<NodeId>,
    ) -> ResolveResult<Attached<C>> {
        let factory = self.prefab_factory::<C>()?;
        let key = key_of_type::<C>();
        let started = Instant::now();
        self.observers.resolving(&key, LifeCycle::PREFAB);

        let (item, acquisition) = self.with_prefab_pool::<C, _>(|pool| {
            pool.acquire_entry(provider, owner, |host| factory(host))
        })?;

        self.observers
            .acquired(&key, Some(item.node), acquisition == Acquisition::Recycled);
        self.observers.resolved(&key, started.elapsed());
        Ok(item)
    }

    /// Grows `C`'s pool to at least `count` entries. Returns the pool size.
    pub fn preload_prefab<C: 'static>(
        &self,
        provider: &mut dyn NodeProvider,
        count: usize,
        owner: Option<NodeId>,
    ) -> ResolveResult<usize> {
        let factory = self.prefab_factory::<C>()?;
        let size = self.with_prefab_pool::<C, _>(|pool| {
            pool.preload(provider, count, owner, |host| factory(host)).len()
        })?;
        tracing::debug!(ty = type_name::<C>(), count, size, "Preloaded prefab pool");
        Ok(size)
    }

    /// [`preload_prefab`](Self::preload_prefab) with the configured default size.
    pub fn preload_prefab_default<C: 'static>(
        &self,
        provider: &mut dyn NodeProvider,
        owner: Option<NodeId>,
    ) -> ResolveResult<usize> {
        self.preload_prefab::<C>(provider, self.config.default_preload, owner)
    }

    /// Entries in `C`'s pool, live or not.
    pub fn prefab_pool_len<C: 'static>(&self) -> usize {
        self.prefab_pools
            .borrow()
            .get(&TypeId::of::<C>())
            .and_then(|pool| pool.downcast_ref::<OrderedPool<Attached<C>>>())
            .map_or(0, |pool| pool.len())
    }

    pub fn prefab_active_count<C: 'static>(&self, provider: &dyn NodeProvider) -> usize {
        self.prefab_pools
            .borrow()
            .get(&TypeId::of::<C>())
            .and_then(|pool| pool.downcast_ref::<OrderedPool<Attached<C>>>())
            .map_or(0, |pool| pool.active_count(provider))
    }

    pub fn is_bound<T: 'static>(&self) -> bool {
        self.registry.contains_key(&key_of_type::<T>())
    }

    pub fn bindings(&self) -> Vec<BindingInfo> {
        self.registry
            .iter()
            .map(|(key, registration)| BindingInfo {
                key: *key,
                lifecycle: registration.lifecycle,
                impl_name: registration.impl_name,
            })
            .collect()
    }

    /// Number of singleton cache entries, services and components together.
    pub fn cached_count(&self) -> usize {
        self.singletons.borrow().len() + self.components.borrow().len()
    }

    /// Runs `target.dispose()` on the next [`dispose`](Self::dispose).
    pub fn register_disposer(&self, target: Rc<dyn Dispose>) {
        self.disposers.borrow_mut().push_disposer(target);
    }

    /// Runs `hook` on every [`dispose`](Self::dispose), after the cache is cleared.
    pub fn on_teardown(&self, hook: impl FnMut() + 'static) {
        self.teardown.borrow_mut().push(Box::new(hook));
    }

    /// Tears down the scope's state.
    ///
    /// Runs registered disposers newest first, empties the singleton cache
    /// and invokes the teardown hooks. The next resolution rebuilds from the
    /// bindings. Safe to call any number of times, including before anything
    /// was resolved. Prefab pools are kept.
    pub fn dispose(&self) {
        let bag = std::mem::take(&mut *self.disposers.borrow_mut());
        let disposers = bag.len();
        bag.run_all_reverse();

        let evicted = std::mem::take(&mut *self.singletons.borrow_mut());
        let evicted_components = std::mem::take(&mut *self.components.borrow_mut());
        let cleared = evicted.len() + evicted_components.len();
        drop(evicted);
        drop(evicted_components);

        let mut hooks = std::mem::take(&mut *self.teardown.borrow_mut());
        for hook in hooks.iter_mut() {
            hook();
        }
        // Keep hooks registered while tearing down, after the existing ones.
        let mut slot = self.teardown.borrow_mut();
        hooks.append(&mut slot);
        *slot = hooks;
        drop(slot);

        self.disposals.set(self.disposals.get() + 1);
        tracing::debug!(disposers, cleared, "Disposed context");
    }

    /// How many times [`dispose`](Self::dispose) has run.
    pub fn dispose_count(&self) -> u64 {
        self.disposals.get()
    }

    /// Pool first, then the hierarchy, then the binding table.
    pub(crate) fn resolve_routed(
        &self,
        key: Key,
        lifecycle: LifeCycle,
        provider: &mut dyn NodeProvider,
        caller: Option<NodeId>,
        locator: &Locator,
    ) -> ResolveResult<AnyRc> {
        if let Key::Type(id, name) = key {
            if lifecycle.is_pooled() {
                if let Some(acquire) = self.registry.prefab_acquire(id) {
                    return acquire(self, provider, caller);
                }
            }
            if lifecycle.is_attachable() {
                let ty = ComponentType::lookup(id, name);
                if let Some(found) = self.locate_component(provider, caller, lifecycle, locator, &ty)? {
                    return Ok(found);
                }
            }
        }
        self.resolve_key(key, lifecycle, None, None)
    }

    pub(crate) fn resolve_key(
        &self,
        key: Key,
        lifecycle: LifeCycle,
        scope: Option<&str>,
        fallback: Option<Fallback<'_>>,
    ) -> ResolveResult<AnyRc> {
        let started = Instant::now();
        self.observers.resolving(&key, lifecycle);

        let category = lifecycle.category();
        let cache_key = (category == Category::Singleton).then(|| CacheKey::new(key, category, scope));
        if let Some(cache_key) = &cache_key {
            let hit = self.singletons.borrow().get(cache_key).cloned();
            if let Some(hit) = hit {
                tracing::trace!(key = key.display_name(), "Singleton cache hit");
                self.observers.resolved(&key, started.elapsed());
                return Ok(hit);
            }
        }

        let built = self.build(key, lifecycle, fallback);
        let instance = match built {
            Ok(instance) => instance,
            Err(error) => {
                if self.stack.depth() == 0 {
                    tracing::warn!(key = key.display_name(), ?lifecycle, %error, "Resolution failed");
                }
                return Err(error);
            }
        };

        if let Some(cache_key) = cache_key {
            self.singletons.borrow_mut().insert(cache_key, instance.clone());
        }
        self.observers.resolved(&key, started.elapsed());
        Ok(instance)
    }

    fn build(&self, key: Key, lifecycle: LifeCycle, fallback: Option<Fallback<'_>>) -> ResolveResult<AnyRc> {
        let _guard = self.stack.enter(key, self.config.max_depth)?;
        match self.registry.find(&key, lifecycle) {
            Lookup::Found(registration) => (registration.ctor)(self),
            Lookup::Incompatible => Err(ResolveError::unresolvable(
                key.display_name(),
                lifecycle,
                "no binding offers a compatible lifecycle",
            )),
            Lookup::Missing => match fallback {
                Some(construct) => construct(self),
                None if self.lives_on_hierarchy(&key, lifecycle) => Err(ResolveError::unresolvable(
                    key.display_name(),
                    lifecycle,
                    "lifecycle needs a node provider",
                )),
                None => Err(ResolveError::unresolvable(
                    key.display_name(),
                    lifecycle,
                    "no binding and no construction path",
                )),
            },
        }
    }

    /// Whether `key` is bound as a prefab or component the request asks for.
    fn lives_on_hierarchy(&self, key: &Key, lifecycle: LifeCycle) -> bool {
        let Key::Type(id, _) = key else {
            return false;
        };
        (lifecycle.is_pooled() && self.registry.prefab_acquire(*id).is_some())
            || (lifecycle.is_attachable() && self.registry.component(*id).is_some())
    }

    /// Binding-registered component types take over lookup-only ones.
    fn component_type(&self, ty: &ComponentType) -> ComponentType {
        if ty.is_attachable() {
            return ty.clone();
        }
        self.registry
            .component(ty.type_id())
            .cloned()
            .unwrap_or_else(|| ty.clone())
    }

    pub(crate) fn locate_component(
        &self,
        provider: &mut dyn NodeProvider,
        caller: Option<NodeId>,
        lifecycle: LifeCycle,
        locator: &Locator,
        ty: &ComponentType,
    ) -> ResolveResult<Option<AnyRc>> {
        let ty = self.component_type(ty);
        let key = Key::Type(ty.type_id(), ty.name());
        let started = Instant::now();
        self.observers.resolving(&key, lifecycle);

        let cached = lifecycle.category() == Category::Singleton;
        if cached {
            let hit = self.components.borrow().get(&ty.type_id()).cloned();
            if let Some(hit) = hit {
                tracing::trace!(key = key.display_name(), "Component cache hit");
                self.observers.resolved(&key, started.elapsed());
                return Ok(Some(hit));
            }
        }

        let locator = children_locator(lifecycle, locator);
        let mut cx = LocateCx::new(provider, caller);
        let found = locator.as_single().locate(&mut cx, &ty);
        self.report(cx.diagnostics());
        let found = found?;

        if let (true, Some(component)) = (cached, &found) {
            self.components.borrow_mut().insert(ty.type_id(), component.clone());
        }
        if found.is_some() {
            self.observers.resolved(&key, started.elapsed());
        }
        Ok(found)
    }

    pub(crate) fn locate_components(
        &self,
        provider: &mut dyn NodeProvider,
        caller: Option<NodeId>,
        lifecycle: LifeCycle,
        locator: &Locator,
        ty: &ComponentType,
    ) -> ResolveResult<Vec<AnyRc>> {
        let ty = self.component_type(ty);
        let key = Key::Type(ty.type_id(), ty.name());
        let started = Instant::now();
        self.observers.resolving(&key, lifecycle);

        let locator = children_locator(lifecycle, locator);
        let mut cx = LocateCx::new(provider, caller);
        let found = match locator.as_many() {
            Some(many) => many.locate_all(&mut cx, &ty),
            None => locator
                .as_single()
                .locate(&mut cx, &ty)
                .map(|found| found.into_iter().collect()),
        };
        self.report(cx.diagnostics());
        let found = found?;
        self.observers.resolved(&key, started.elapsed());
        Ok(found)
    }

    fn report(&self, diagnostics: &[Diagnostic]) {
        if !self.observers.has_observers() {
            return;
        }
        if self.config.report_not_found {
            self.observers.diagnostics(diagnostics);
        } else {
            let kept: Vec<Diagnostic> = diagnostics
                .iter()
                .filter(|diagnostic| !matches!(diagnostic, Diagnostic::NotFound { .. }))
                .cloned()
                .collect();
            self.observers.diagnostics(&kept);
        }
    }

    fn prefab_factory<C: 'static>(&self) -> ResolveResult<PrefabFactory<C>> {
        self.registry.prefab::<C>().ok_or_else(|| {
            ResolveError::unresolvable(type_name::<C>(), LifeCycle::PREFAB, "no prefab binding")
        })
    }

    fn with_prefab_pool<C: 'static, R>(
        &self,
        f: impl FnOnce(&mut OrderedPool<Attached<C>>) -> R,
    ) -> ResolveResult<R> {
        let mut pools = self.prefab_pools.borrow_mut();
        let pool = pools
            .entry(TypeId::of::<C>())
            .or_insert_with(|| Box::new(OrderedPool::<Attached<C>>::new()));
        pool.downcast_mut::<OrderedPool<Attached<C>>>()
            .map(f)
            .ok_or(ResolveError::TypeMismatch(type_name::<C>()))
    }
}

/// Children lifecycles search below the path host instead of on it.
fn children_locator(lifecycle: LifeCycle, locator: &Locator) -> std::borrow::Cow<'_, Locator> {
    match locator {
        Locator::ByPath(by) if lifecycle.contains(LifeCycle::CHILDREN) => {
            std::borrow::Cow::Owned(Locator::InChildren(InChildren::new(by.path.clone())))
        }
        _ => std::borrow::Cow::Borrowed(locator),
    }
}

pub(crate) fn downcast<T: 'static>(any: AnyRc) -> ResolveResult<Rc<T>> {
    any.downcast::<T>()
        .map_err(|_| ResolveError::TypeMismatch(type_name::<T>()))
}

pub(crate) fn downcast_trait<T: ?Sized + 'static>(any: AnyRc) -> ResolveResult<Rc<T>> {
    any.downcast::<Rc<T>>()
        .map(|outer| Rc::clone(&*outer))
        .map_err(|_| ResolveError::TypeMismatch(type_name::<T>()))
}

/// Type-erased entry into `C`'s prefab pool, stored next to its factory.
pub(crate) fn acquire_prefab<C: 'static>(
    context: &Context,
    provider: &mut dyn NodeProvider,
    owner: Option<NodeId>,
) -> ResolveResult<AnyRc> {
    context
        .resolve_prefab::<C>(provider, owner)
        .map(|item| item.component as AnyRc)
}
