//! Dependency descriptors for auto-constructed types.
//!
//! A type opts into construction by the context by implementing
//! [`Injectable`]: it lists its dependency slots once in a
//! [`DescriptorTable`] and then builds itself from the resolved
//! [`Wiring`](crate::Wiring). The context builds each type's table a single
//! time and walks the cached copy on every construction.

use std::any::type_name;

use crate::context::Wiring;
use crate::key::{key_of_trait, key_of_type, Key};
use crate::strategy::{Attachable, ComponentType, Locator};
use crate::{LifeCycle, ResolveResult};

/// What a slot is filled with.
#[derive(Debug, Clone)]
pub enum Target {
    /// A bound service, resolved through the binding table.
    Service(Key),
    /// One component located on the node hierarchy.
    Component(ComponentType),
    /// Every matching component.
    Components(ComponentType),
    /// An instance acquired from the prefab pool of the keyed type.
    Prefab(Key),
}

/// One dependency slot of an injectable type.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub slot: &'static str,
    pub lifecycle: LifeCycle,
    pub target: Target,
    /// Path or discriminator for component slots; ignored by service slots.
    pub locator: Locator,
    /// Type name reported when the slot cannot be filled.
    pub type_name: &'static str,
}

impl Dependency {
    /// The name or tag discriminator, if the locator carries one.
    pub fn discriminator(&self) -> Option<&str> {
        match &self.locator {
            Locator::ByName(by) => Some(by.name.as_str()),
            Locator::ByTag(by) => Some(by.tag.as_str()),
            _ => match &self.target {
                Target::Service(key) => key.discriminator(),
                _ => None,
            },
        }
    }

    /// The path string, if the locator is path based.
    pub fn path(&self) -> Option<&str> {
        match &self.locator {
            Locator::ByPath(by) => Some(by.path.as_str()),
            Locator::InChildren(by) => Some(by.path.as_str()),
            _ => None,
        }
    }
}

/// Ordered list of an injectable type's dependency slots.
///
/// # Examples
///
/// ```rust
/// use ferrous_resolver::{DescriptorTable, LifeCycle, Locator};
///
/// struct Clock;
/// struct Sprite;
///
/// let mut table = DescriptorTable::new();
/// table
///     .service::<Clock>("clock", LifeCycle::SINGLETON)
///     .component::<Sprite>("sprite", LifeCycle::COMPONENT, Locator::path("body"));
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.get("sprite").and_then(|d| d.path()), Some("body"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DescriptorTable {
    dependencies: Vec<Dependency>,
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service<T: 'static>(&mut self, slot: &'static str, lifecycle: LifeCycle) -> &mut Self {
        self.push(slot, lifecycle, Target::Service(key_of_type::<T>()), Locator::default(), type_name::<T>())
    }

    pub fn named_service<T: 'static>(
        &mut self,
        slot: &'static str,
        lifecycle: LifeCycle,
        name: &'static str,
    ) -> &mut Self {
        self.push(
            slot,
            lifecycle,
            Target::Service(key_of_type::<T>().named(name)),
            Locator::default(),
            type_name::<T>(),
        )
    }

    /// A trait-object service, bound with `bind_trait`.
    pub fn service_trait<T: ?Sized + 'static>(&mut self, slot: &'static str, lifecycle: LifeCycle) -> &mut Self {
        self.push(slot, lifecycle, Target::Service(key_of_trait::<T>()), Locator::default(), type_name::<T>())
    }

    /// A lookup-only component, unless the context binds `C` as attachable.
    pub fn component<C: 'static>(&mut self, slot: &'static str, lifecycle: LifeCycle, locator: Locator) -> &mut Self {
        self.push(
            slot,
            lifecycle,
            Target::Component(ComponentType::of::<C>()),
            locator,
            type_name::<C>(),
        )
    }

    pub fn attachable<C: Attachable>(&mut self, slot: &'static str, lifecycle: LifeCycle, locator: Locator) -> &mut Self {
        self.push(
            slot,
            lifecycle,
            Target::Component(ComponentType::attachable::<C>()),
            locator,
            type_name::<C>(),
        )
    }

    pub fn components<C: 'static>(&mut self, slot: &'static str, lifecycle: LifeCycle, locator: Locator) -> &mut Self {
        self.push(
            slot,
            lifecycle,
            Target::Components(ComponentType::of::<C>()),
            locator,
            type_name::<C>(),
        )
    }

    /// A pooled instance of `C`, owned by the constructing node.
    pub fn prefab<C: 'static>(&mut self, slot: &'static str) -> &mut Self {
        self.push(
            slot,
            LifeCycle::PREFAB,
            Target::Prefab(key_of_type::<C>()),
            Locator::default(),
            type_name::<C>(),
        )
    }

    fn push(
        &mut self,
        slot: &'static str,
        lifecycle: LifeCycle,
        target: Target,
        locator: Locator,
        type_name: &'static str,
    ) -> &mut Self {
        self.dependencies.retain(|dependency| dependency.slot != slot);
        self.dependencies.push(Dependency {
            slot,
            lifecycle,
            target,
            locator,
            type_name,
        });
        self
    }

    pub fn get(&self, slot: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|dependency| dependency.slot == slot)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dependency> {
        self.dependencies.iter()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

impl<'a> IntoIterator for &'a DescriptorTable {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Types the context can build by filling declared dependency slots.
///
/// # Examples
///
/// ```rust
/// use ferrous_resolver::{ContextBuilder, DescriptorTable, Injectable, LifeCycle, ResolveResult, Wiring};
/// use std::rc::Rc;
///
/// struct Settings { volume: u8 }
///
/// struct Mixer { settings: Rc<Settings> }
///
/// impl Injectable for Mixer {
///     fn describe(table: &mut DescriptorTable) {
///         table.service::<Settings>("settings", LifeCycle::SINGLETON);
///     }
///
///     fn construct(wiring: &Wiring) -> ResolveResult<Self> {
///         Ok(Mixer { settings: wiring.get("settings")? })
///     }
/// }
///
/// let mut builder = ContextBuilder::new();
/// builder.bind_instance(Settings { volume: 7 });
/// let context = builder.build();
///
/// let mixer = context.resolve_injectable::<Mixer>(LifeCycle::TRANSIENT).unwrap();
/// assert_eq!(mixer.settings.volume, 7);
/// ```
pub trait Injectable: Sized + 'static {
    fn describe(table: &mut DescriptorTable);

    fn construct(wiring: &Wiring) -> ResolveResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Enemy;

    #[test]
    fn redeclaring_a_slot_replaces_it() {
        let mut table = DescriptorTable::new();
        table
            .service::<u32>("value", LifeCycle::TRANSIENT)
            .named_service::<u32>("value", LifeCycle::SINGLETON, "port");
        assert_eq!(table.len(), 1);
        let value = table.get("value").unwrap();
        assert_eq!(value.lifecycle, LifeCycle::SINGLETON);
        assert_eq!(value.discriminator(), Some("port"));
    }

    #[test]
    fn component_slots_keep_locator_data() {
        let mut table = DescriptorTable::new();
        table
            .components::<Enemy>("all", LifeCycle::COMPONENT, Locator::children("/World"))
            .component::<Enemy>("named", LifeCycle::COMPONENT, Locator::name("Boss"));

        let all = table.get("all").unwrap();
        assert_eq!(all.path(), Some("/World"));
        assert!(matches!(all.target, Target::Components(_)));
        assert_eq!(table.get("named").unwrap().discriminator(), Some("Boss"));
        assert_eq!(table.iter().map(|d| d.slot).collect::<Vec<_>>(), vec!["all", "named"]);
    }

    #[test]
    fn prefab_slots_are_pooled() {
        let mut table = DescriptorTable::new();
        table.prefab::<Enemy>("spawn");

        let spawn = table.get("spawn").unwrap();
        assert!(spawn.lifecycle.is_pooled());
        assert!(matches!(spawn.target, Target::Prefab(key) if key == key_of_type::<Enemy>()));
        assert_eq!(spawn.discriminator(), None);
    }
}
