//! Collects bindings before a [`Context`] is built.

use std::any::type_name;
use std::rc::Rc;

use crate::config::ContainerConfig;
use crate::descriptors::Injectable;
use crate::hierarchy::{AnyRc, NodeId, NodeProvider};
use crate::key::{key_of_trait, key_of_type, Key};
use crate::observer::{Observers, ResolveObserver};
use crate::pool::Attached;
use crate::registration::{Registration, Registry};
use crate::strategy::{Attachable, ComponentType};
use crate::{LifeCycle, ResolveResult};

use super::Context;

/// Builder for a [`Context`].
///
/// Bindings for the same key are tried in the order they were added; the
/// first whose declared lifecycle satisfies the request wins.
///
/// # Examples
///
/// ```rust
/// use ferrous_resolver::{ContextBuilder, LifeCycle};
/// use std::rc::Rc;
///
/// trait Weapon {
///     fn damage(&self) -> u32;
/// }
///
/// struct Sword;
///
/// impl Weapon for Sword {
///     fn damage(&self) -> u32 {
///         12
///     }
/// }
///
/// let mut builder = ContextBuilder::new();
/// builder.bind_trait::<dyn Weapon, _>(LifeCycle::DEFAULT, |_| Ok(Rc::new(Sword) as Rc<dyn Weapon>));
///
/// let context = builder.build();
/// let first = context.resolve_trait::<dyn Weapon>(LifeCycle::SINGLETON).unwrap();
/// let second = context.resolve_trait::<dyn Weapon>(LifeCycle::SINGLETON).unwrap();
/// assert!(Rc::ptr_eq(&first, &second));
/// assert_eq!(first.damage(), 12);
/// ```
#[derive(Default)]
pub struct ContextBuilder {
    registry: Registry,
    observers: Observers,
    config: ContainerConfig,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            observers: Observers::new(),
            config: ContainerConfig::default(),
        }
    }

    /// Binds `T` to a factory offering `lifecycle`.
    pub fn bind_factory<T, F>(&mut self, lifecycle: LifeCycle, factory: F) -> &mut Self
    where
        T: 'static,
        F: Fn(&Context) -> ResolveResult<T> + 'static,
    {
        self.insert_factory(key_of_type::<T>(), lifecycle, factory)
    }

    /// Binds `T` under `name`; resolve it with `resolve_named`.
    pub fn bind_named<T, F>(&mut self, name: &'static str, lifecycle: LifeCycle, factory: F) -> &mut Self
    where
        T: 'static,
        F: Fn(&Context) -> ResolveResult<T> + 'static,
    {
        self.insert_factory(key_of_type::<T>().named(name), lifecycle, factory)
    }

    /// Binds a ready instance, handed out as is to every lifecycle.
    pub fn bind_instance<T: 'static>(&mut self, value: T) -> &mut Self {
        self.insert_instance(key_of_type::<T>(), Rc::new(value))
    }

    pub fn bind_named_instance<T: 'static>(&mut self, name: &'static str, value: T) -> &mut Self {
        self.insert_instance(key_of_type::<T>().named(name), Rc::new(value))
    }

    /// Binds an abstract trait object type to a concrete factory.
    pub fn bind_trait<T, F>(&mut self, lifecycle: LifeCycle, factory: F) -> &mut Self
    where
        T: ?Sized + 'static,
        F: Fn(&Context) -> ResolveResult<Rc<T>> + 'static,
    {
        // Trait objects are stored as Rc<Rc<dyn T>>
        let ctor = Rc::new(move |context: &Context| factory(context).map(|rc| Rc::new(rc) as AnyRc));
        self.registry.insert(key_of_trait::<T>(), Registration::new(lifecycle, ctor));
        self
    }

    pub fn bind_trait_instance<T: ?Sized + 'static>(&mut self, value: Rc<T>) -> &mut Self {
        let stored: AnyRc = Rc::new(value);
        self.insert_instance_any(key_of_trait::<T>(), stored)
    }

    /// Lets the context build `T` from its descriptor table under `lifecycle`.
    pub fn bind_injectable<T: Injectable>(&mut self, lifecycle: LifeCycle) -> &mut Self {
        self.insert_factory(key_of_type::<T>(), lifecycle, |context| context.construct::<T>())
    }

    /// Makes `C` attachable wherever the context looks it up.
    pub fn bind_component<C: Attachable>(&mut self) -> &mut Self {
        self.registry.insert_component(ComponentType::attachable::<C>());
        self
    }

    pub fn bind_component_with<C, F>(&mut self, factory: F) -> &mut Self
    where
        C: 'static,
        F: Fn(NodeId) -> C + 'static,
    {
        self.registry.insert_component(ComponentType::with_factory(factory));
        self
    }

    /// Binds the template used to grow `C`'s prefab pool.
    pub fn bind_prefab<C, F>(&mut self, factory: F) -> &mut Self
    where
        C: 'static,
        F: Fn(&mut dyn NodeProvider) -> Attached<C> + 'static,
    {
        self.registry.insert_prefab::<C>(Rc::new(factory));
        self
    }

    pub fn add_observer(&mut self, observer: Rc<dyn ResolveObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Replaces the configuration after validating it.
    pub fn with_config(&mut self, config: ContainerConfig) -> ResolveResult<&mut Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn build(self) -> Context {
        tracing::debug!(
            bindings = self.registry.iter().count(),
            max_depth = self.config.max_depth,
            "Built resolution context"
        );
        Context::from_parts(self.registry, self.observers, self.config)
    }

    fn insert_factory<T, F>(&mut self, key: Key, lifecycle: LifeCycle, factory: F) -> &mut Self
    where
        T: 'static,
        F: Fn(&Context) -> ResolveResult<T> + 'static,
    {
        let ctor = Rc::new(move |context: &Context| factory(context).map(|value| Rc::new(value) as AnyRc));
        let registration = Registration::new(lifecycle, ctor).with_impl_name(type_name::<T>());
        self.registry.insert(key, registration);
        self
    }

    fn insert_instance<T: 'static>(&mut self, key: Key, value: Rc<T>) -> &mut Self {
        self.insert_instance_any(key, value)
    }

    fn insert_instance_any(&mut self, key: Key, value: AnyRc) -> &mut Self {
        let ctor = Rc::new(move |_: &Context| -> ResolveResult<AnyRc> { Ok(value.clone()) });
        self.registry.insert(key, Registration::new(LifeCycle::DEFAULT, ctor));
        self
    }
}
