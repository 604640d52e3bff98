//! # ferrous-resolver
//!
//! Lifecycle-driven dependency resolution over a node hierarchy.
//!
//! ## Features
//!
//! - **Lifecycle flags**: a [`LifeCycle`] bit set decides whether a request is
//!   located on the hierarchy, drawn from a pool, cached or built fresh
//! - **Path resolution**: `"/World/Cells"` style paths, created on demand
//! - **Lookup strategies**: by path, in children, in parents, by type, name or tag
//! - **Prefab pools**: recycle inactive instances instead of rebuilding them
//! - **Explicit context**: no global container; disposal resets everything
//! - **Step sequencing**: cooperative multi-step workflows torn down with their scope
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_resolver::{ContextBuilder, LifeCycle};
//! use std::rc::Rc;
//!
//! trait Shape {
//!     fn sides(&self) -> u32;
//! }
//!
//! struct Square;
//!
//! impl Shape for Square {
//!     fn sides(&self) -> u32 {
//!         4
//!     }
//! }
//!
//! let mut builder = ContextBuilder::new();
//! builder.bind_trait::<dyn Shape, _>(LifeCycle::DEFAULT, |_| Ok(Rc::new(Square) as Rc<dyn Shape>));
//! let context = builder.build();
//!
//! // Transient requests build a new instance every time.
//! let a = context.resolve_trait::<dyn Shape>(LifeCycle::TRANSIENT).unwrap();
//! let b = context.resolve_trait::<dyn Shape>(LifeCycle::TRANSIENT).unwrap();
//! assert!(!Rc::ptr_eq(&a, &b));
//!
//! // Singleton requests share one until the context is disposed.
//! let c = context.resolve_trait::<dyn Shape>(LifeCycle::SINGLETON).unwrap();
//! let d = context.resolve_trait::<dyn Shape>(LifeCycle::SINGLETON).unwrap();
//! assert!(Rc::ptr_eq(&c, &d));
//!
//! context.dispose();
//! let e = context.resolve_trait::<dyn Shape>(LifeCycle::SINGLETON).unwrap();
//! assert!(!Rc::ptr_eq(&c, &e));
//! assert_eq!(e.sides(), 4);
//! ```
//!
//! ## Components on the hierarchy
//!
//! ```rust
//! use ferrous_resolver::{Attachable, ContextBuilder, LifeCycle, Locator, NodeId, NodeProvider, SceneTree};
//!
//! struct Collider {
//!     host: NodeId,
//! }
//!
//! impl Attachable for Collider {
//!     fn create(host: NodeId) -> Self {
//!         Collider { host }
//!     }
//! }
//!
//! let mut builder = ContextBuilder::new();
//! builder.bind_component::<Collider>();
//! let context = builder.build();
//!
//! let mut tree = SceneTree::new();
//! let player = tree.create_node("Player", None);
//!
//! let collider = context
//!     .resolve_component::<Collider>(&mut tree, Some(player), LifeCycle::COMPONENT, &Locator::path("Body"))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(tree.find_path(Some(player), "Body"), Some(collider.host));
//! ```
//!
//! ## Lifecycles
//!
//! - **Transient-class** (`DEFAULT`, `TRANSIENT`, plain `COMPONENT`, ...): never cached
//! - **Singleton-class** (anything carrying `SINGLETON` or `CACHE`): cached per
//!   key, category and optional scope until [`Context::dispose`]

pub mod config;
pub mod context;
pub mod descriptors;
pub mod error;
pub mod hierarchy;
pub mod key;
pub mod lifecycle;
pub mod observer;
pub mod pool;
pub mod sequence;
pub mod strategy;
pub mod traits;

mod internal;
mod registration;

pub use config::{ConfigSource, ContainerConfig, EnvironmentConfigSource, MapConfigSource};
pub use context::{BindingInfo, Context, ContextBuilder, Wiring};
pub use descriptors::{DescriptorTable, Dependency, Injectable, Target};
pub use error::{ResolveError, ResolveResult};
pub use hierarchy::{resolve_node, AnyRc, NodeId, NodeProvider, PathResolver, SceneTree, PATH_SEPARATOR};
pub use key::{key_of_trait, key_of_type, CacheKey, Key};
pub use lifecycle::{Category, LifeCycle};
pub use observer::{CountingObserver, Diagnostic, ResolveObserver, TracingObserver};
pub use pool::{
    Acquisition, AliveFlag, Attached, ObjectHost, OrderedPool, Pool, PoolHost, PoolStorage, Poolable,
    UnorderedPool,
};
pub use sequence::{ResumeToken, Scheduler, ScopeId, Step, StepList, Wait, Workflow};
pub use strategy::{
    Attachable, ByName, ByPath, ByTag, ByType, ComponentArrayResolvable, ComponentResolvable, ComponentType,
    InChildren, InParents, LocateCx, Locator,
};
pub use traits::Dispose;
