//! Binding key types for the resolution container.

use std::any::TypeId;
use std::hash::{Hash, Hasher};

use crate::lifecycle::Category;

/// Key for binding storage and lookup.
///
/// Keys identify what a caller asks for: a concrete type or a trait object,
/// optionally narrowed by a name discriminator when several bindings share a
/// type. Equality and hashing only look at the `TypeId` and the name; the
/// type name is carried for diagnostics.
///
/// # Examples
///
/// ```rust
/// use ferrous_resolver::{key_of_type, key_of_trait, Key};
///
/// trait Greeter {}
///
/// let plain = key_of_type::<u32>();
/// let named = plain.named("port");
/// assert_ne!(plain, named);
/// assert_eq!(named.discriminator(), Some("port"));
///
/// let abstract_key = key_of_trait::<dyn Greeter>();
/// assert!(abstract_key.display_name().contains("Greeter"));
/// ```
#[derive(Debug, Clone, Copy)]
pub enum Key {
    /// Concrete type key with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Trait object key; the TypeId is that of `dyn Trait`
    Trait(TypeId, &'static str),
    /// Concrete type narrowed by a discriminator
    TypeNamed(TypeId, &'static str, &'static str),
    /// Trait object narrowed by a discriminator
    TraitNamed(TypeId, &'static str, &'static str),
}

impl Key {
    /// Get the type or trait name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name)
            | Key::Trait(_, name)
            | Key::TypeNamed(_, name, _)
            | Key::TraitNamed(_, name, _) => name,
        }
    }

    /// Get the discriminator for named bindings, or None for unnamed ones
    pub fn discriminator(&self) -> Option<&'static str> {
        match self {
            Key::Type(..) | Key::Trait(..) => None,
            Key::TypeNamed(_, _, name) | Key::TraitNamed(_, _, name) => Some(name),
        }
    }

    pub fn type_id(&self) -> TypeId {
        match self {
            Key::Type(id, _)
            | Key::Trait(id, _)
            | Key::TypeNamed(id, _, _)
            | Key::TraitNamed(id, _, _) => *id,
        }
    }

    /// Returns the same key narrowed by `name`, replacing any previous name.
    pub fn named(self, name: &'static str) -> Key {
        match self {
            Key::Type(id, ty) | Key::TypeNamed(id, ty, _) => Key::TypeNamed(id, ty, name),
            Key::Trait(id, ty) | Key::TraitNamed(id, ty, _) => Key::TraitNamed(id, ty, name),
        }
    }

    fn is_trait(&self) -> bool {
        matches!(self, Key::Trait(..) | Key::TraitNamed(..))
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.is_trait() == other.is_trait()
            && self.type_id() == other.type_id()
            && self.discriminator() == other.discriminator()
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_trait().hash(state);
        self.type_id().hash(state);
        self.discriminator().hash(state);
    }
}

/// Singleton cache key: the binding key, the normalized lifecycle category and
/// an optional named scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub key: Key,
    pub category: Category,
    pub scope: Option<String>,
}

impl CacheKey {
    pub fn new(key: Key, category: Category, scope: Option<&str>) -> Self {
        Self {
            key,
            category,
            scope: scope.map(str::to_owned),
        }
    }
}

#[inline(always)]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

#[inline(always)]
pub fn key_of_trait<T: ?Sized + 'static>() -> Key {
    Key::Trait(TypeId::of::<T>(), std::any::type_name::<T>())
}
