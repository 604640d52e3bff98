//! Lifecycle flag definitions.

bitflags::bitflags! {
    /// Lifecycle flags controlling how an instance is located, cached and built.
    ///
    /// Flags combine freely with `|` and are tested with `&` or
    /// [`contains`](LifeCycle::contains). Comparing a requested lifecycle
    /// against the one a binding offers goes through
    /// [`is_compatible`](LifeCycle::is_compatible), never plain equality.
    ///
    /// # Flag Characteristics
    ///
    /// - **Transient**: a fresh instance per resolution, never cached
    /// - **Singleton**: one instance per context (and named scope), cached until dispose
    /// - **Component**: located on, or attached to, a node of the hierarchy
    /// - **Children**: like Component, but searched through the node's descendants
    /// - **Prefab**: drawn from a recyclable pool
    /// - **Cache**: cached like Singleton without asserting uniqueness
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ferrous_resolver::LifeCycle;
    ///
    /// let wanted = LifeCycle::SINGLETON | LifeCycle::COMPONENT;
    /// assert_eq!(wanted, LifeCycle::SINGLETON_COMPONENT);
    /// assert!(wanted.is_compatible(LifeCycle::SINGLETON));
    /// assert!(!LifeCycle::SINGLETON.is_compatible(LifeCycle::COMPONENT));
    ///
    /// // Anything below Singleton collapses into the transient category.
    /// assert!(LifeCycle::DEFAULT.is_compatible(LifeCycle::TRANSIENT));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LifeCycle: u8 {
        /// No explicit lifecycle; treated as transient for comparison.
        const DEFAULT = 0;
        const TRANSIENT = 1 << 0;
        const SINGLETON = 1 << 1;
        const COMPONENT = 1 << 2;
        const CHILDREN = 1 << 3;
        const PREFAB = 1 << 4;
        const CACHE = 1 << 5;

        const SINGLETON_COMPONENT = Self::SINGLETON.bits() | Self::COMPONENT.bits();
        /// Lifecycle used by plain injection slots.
        const INJECT = Self::DEFAULT.bits()
            | Self::CACHE.bits()
            | Self::COMPONENT.bits()
            | Self::PREFAB.bits();
    }
}

/// Caching category a lifecycle falls into once normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Built per request and handed out uncached.
    Transient,
    /// Built once per cache key and reused until the context is disposed.
    Singleton,
}

impl LifeCycle {
    /// Collapses every value numerically below [`SINGLETON`](Self::SINGLETON)
    /// into [`TRANSIENT`](Self::TRANSIENT). Values at or above it are kept as is.
    #[inline]
    pub const fn normalized(self) -> Self {
        if self.bits() < Self::SINGLETON.bits() {
            Self::TRANSIENT
        } else {
            self
        }
    }

    /// Whether `self` (the requested lifecycle) is satisfied by `offered`.
    ///
    /// Holds when `self` carries every flag of `offered`, or when both
    /// normalize to the same value.
    #[inline]
    pub fn is_compatible(self, offered: Self) -> bool {
        (self & offered) == offered || self.normalized() == offered.normalized()
    }

    /// Caching category: Singleton-class when the normalized value carries
    /// `SINGLETON` or `CACHE`.
    pub fn category(self) -> Category {
        if self.normalized().intersects(Self::SINGLETON | Self::CACHE) {
            Category::Singleton
        } else {
            Category::Transient
        }
    }

    /// Whether the lifecycle asks for a node-hosted component.
    #[inline]
    pub fn is_attachable(self) -> bool {
        self.intersects(Self::COMPONENT | Self::CHILDREN)
    }

    /// Whether the lifecycle asks for a pooled instance.
    #[inline]
    pub fn is_pooled(self) -> bool {
        self.contains(Self::PREFAB)
    }
}
