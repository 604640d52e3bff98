//! Component lookup strategies.
//!
//! Every strategy answers the same question: given a calling node and a
//! component type, which component instance(s) should be injected? When the
//! search comes back empty, attachable types get a fresh instance attached on
//! the strategy's host node; other types yield nothing plus a
//! [`Diagnostic`]. Only a missing name or tag discriminator is an error.

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use crate::hierarchy::{AnyRc, NodeId, NodeProvider, PathResolver};
use crate::observer::Diagnostic;
use crate::{ResolveError, ResolveResult};

/// Types that can be created directly on a node.
///
/// ```
/// use ferrous_resolver::{Attachable, ByPath, ComponentResolvable, ComponentType, LocateCx, NodeId, NodeProvider, SceneTree};
///
/// struct Health(u32);
///
/// impl Attachable for Health {
///     fn create(_host: NodeId) -> Self {
///         Health(100)
///     }
/// }
///
/// let mut tree = SceneTree::new();
/// let player = tree.create_node("player", None);
/// let mut cx = LocateCx::new(&mut tree, Some(player));
/// let found = ByPath::new("stats").locate(&mut cx, &ComponentType::attachable::<Health>()).unwrap();
/// assert!(found.is_some());
/// ```
pub trait Attachable: 'static {
    fn create(host: NodeId) -> Self;
}

type AttachFn = Rc<dyn Fn(NodeId) -> AnyRc>;

/// Runtime descriptor of a component type.
#[derive(Clone)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    attach: Option<AttachFn>,
}

impl ComponentType {
    /// A type that can only be looked up, never attached.
    pub fn of<C: 'static>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
            attach: None,
        }
    }

    /// Lookup-only descriptor for a type known only by id.
    pub(crate) fn lookup(id: TypeId, name: &'static str) -> Self {
        Self { id, name, attach: None }
    }

    pub fn attachable<C: Attachable>() -> Self {
        Self::with_factory(C::create)
    }

    /// An attachable type built by `factory` on the host node.
    pub fn with_factory<C, F>(factory: F) -> Self
    where
        C: 'static,
        F: Fn(NodeId) -> C + 'static,
    {
        Self {
            id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
            attach: Some(Rc::new(move |host| Rc::new(factory(host)) as AnyRc)),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_attachable(&self) -> bool {
        self.attach.is_some()
    }

    /// Builds and attaches a new instance on `host`, or reports why it could not.
    fn attach_or_report(
        &self,
        cx: &mut LocateCx<'_>,
        host: Option<NodeId>,
        strategy: &'static str,
    ) -> Option<AnyRc> {
        match (&self.attach, host) {
            (Some(attach), Some(host)) if cx.provider.exists(host) => {
                let instance = attach(host);
                cx.provider.attach(host, self.id, instance.clone());
                cx.diagnostics.push(Diagnostic::attached(self.name, host));
                Some(instance)
            }
            _ => {
                cx.diagnostics.push(Diagnostic::not_found(self.name, strategy, host));
                None
            }
        }
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("name", &self.name)
            .field("attachable", &self.is_attachable())
            .finish()
    }
}

/// Everything a strategy needs for one lookup.
pub struct LocateCx<'a> {
    pub provider: &'a mut dyn NodeProvider,
    pub caller: Option<NodeId>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> LocateCx<'a> {
    pub fn new(provider: &'a mut dyn NodeProvider, caller: Option<NodeId>) -> Self {
        Self {
            provider,
            caller,
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn resolve_path(&mut self, path: &str) -> Option<NodeId> {
        let mut resolver = PathResolver::new(&mut *self.provider);
        let node = resolver.resolve(self.caller, path);
        self.diagnostics.extend(resolver.take_diagnostics());
        node
    }
}

/// Finds (or attaches) a single component.
pub trait ComponentResolvable {
    /// Name used in diagnostics.
    fn label(&self) -> &'static str;

    fn locate(&self, cx: &mut LocateCx<'_>, ty: &ComponentType) -> ResolveResult<Option<AnyRc>>;
}

/// Finds every matching component.
pub trait ComponentArrayResolvable {
    fn locate_all(&self, cx: &mut LocateCx<'_>, ty: &ComponentType) -> ResolveResult<Vec<AnyRc>>;
}

/// Component on the node addressed by a path (empty path: the calling node).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByPath {
    pub path: String,
}

impl ByPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl ComponentResolvable for ByPath {
    fn label(&self) -> &'static str {
        "ByPath"
    }

    fn locate(&self, cx: &mut LocateCx<'_>, ty: &ComponentType) -> ResolveResult<Option<AnyRc>> {
        let host = cx.resolve_path(&self.path);
        if let Some(found) = host.and_then(|node| cx.provider.component(node, ty.id)) {
            return Ok(Some(found));
        }
        Ok(ty.attach_or_report(cx, host, self.label()))
    }
}

impl ComponentArrayResolvable for ByPath {
    fn locate_all(&self, cx: &mut LocateCx<'_>, ty: &ComponentType) -> ResolveResult<Vec<AnyRc>> {
        let host = cx.resolve_path(&self.path);
        let found = host
            .map(|node| cx.provider.components(node, ty.id))
            .unwrap_or_default();
        if !found.is_empty() {
            return Ok(found);
        }
        Ok(ty.attach_or_report(cx, host, self.label()).into_iter().collect())
    }
}

/// Component on the addressed node or any of its descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InChildren {
    pub path: String,
}

impl InChildren {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl ComponentResolvable for InChildren {
    fn label(&self) -> &'static str {
        "InChildren"
    }

    fn locate(&self, cx: &mut LocateCx<'_>, ty: &ComponentType) -> ResolveResult<Option<AnyRc>> {
        let host = cx.resolve_path(&self.path);
        if let Some(found) = host.and_then(|node| cx.provider.find_in_children(node, ty.id)) {
            return Ok(Some(found));
        }
        Ok(ty.attach_or_report(cx, host, self.label()))
    }
}

impl ComponentArrayResolvable for InChildren {
    fn locate_all(&self, cx: &mut LocateCx<'_>, ty: &ComponentType) -> ResolveResult<Vec<AnyRc>> {
        let host = cx.resolve_path(&self.path);
        let found = host
            .map(|node| cx.provider.all_in_children(node, ty.id))
            .unwrap_or_default();
        if !found.is_empty() {
            return Ok(found);
        }
        Ok(ty.attach_or_report(cx, host, self.label()).into_iter().collect())
    }
}

/// Component on the calling node or its nearest ancestor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InParents;

impl ComponentResolvable for InParents {
    fn label(&self) -> &'static str {
        "InParents"
    }

    fn locate(&self, cx: &mut LocateCx<'_>, ty: &ComponentType) -> ResolveResult<Option<AnyRc>> {
        if let Some(found) = cx.caller.and_then(|node| cx.provider.find_in_parents(node, ty.id)) {
            return Ok(Some(found));
        }
        let caller = cx.caller;
        Ok(ty.attach_or_report(cx, caller, self.label()))
    }
}

/// First component of the type anywhere in the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByType;

impl ComponentResolvable for ByType {
    fn label(&self) -> &'static str {
        "ByType"
    }

    fn locate(&self, cx: &mut LocateCx<'_>, ty: &ComponentType) -> ResolveResult<Option<AnyRc>> {
        if let Some(found) = cx.provider.find_by_type(ty.id) {
            return Ok(Some(found));
        }
        let caller = cx.caller;
        Ok(ty.attach_or_report(cx, caller, self.label()))
    }
}

/// Component on the first node with the given name (or path).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByName {
    pub name: String,
}

impl ByName {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ComponentResolvable for ByName {
    fn label(&self) -> &'static str {
        "ByName"
    }

    fn locate(&self, cx: &mut LocateCx<'_>, ty: &ComponentType) -> ResolveResult<Option<AnyRc>> {
        if self.name.is_empty() {
            return Err(ResolveError::Configuration {
                strategy: self.label(),
                discriminator: "name",
            });
        }
        let named = cx.provider.find_by_name(&self.name);
        if let Some(found) = named.and_then(|node| cx.provider.component(node, ty.id)) {
            return Ok(Some(found));
        }
        if named.is_none() {
            let caller = cx.caller;
            cx.diagnostics.push(Diagnostic::path_fallback(&self.name, caller));
        }
        let host = named.or(cx.caller);
        Ok(ty.attach_or_report(cx, host, self.label()))
    }
}

/// Component on the first node carrying the given tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByTag {
    pub tag: String,
}

impl ByTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl ComponentResolvable for ByTag {
    fn label(&self) -> &'static str {
        "ByTag"
    }

    fn locate(&self, cx: &mut LocateCx<'_>, ty: &ComponentType) -> ResolveResult<Option<AnyRc>> {
        if self.tag.is_empty() {
            return Err(ResolveError::Configuration {
                strategy: self.label(),
                discriminator: "tag",
            });
        }
        let found = cx
            .provider
            .find_with_tag(&self.tag)
            .into_iter()
            .find_map(|node| cx.provider.component(node, ty.id));
        if let Some(found) = found {
            return Ok(Some(found));
        }
        let caller = cx.caller;
        Ok(ty.attach_or_report(cx, caller, self.label()))
    }
}

/// Any of the strategies, as stored in descriptor tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    ByPath(ByPath),
    InChildren(InChildren),
    InParents,
    ByType,
    ByName(ByName),
    ByTag(ByTag),
}

impl Default for Locator {
    fn default() -> Self {
        Locator::ByPath(ByPath::default())
    }
}

impl Locator {
    pub fn path(path: impl Into<String>) -> Self {
        Locator::ByPath(ByPath::new(path))
    }

    pub fn children(path: impl Into<String>) -> Self {
        Locator::InChildren(InChildren::new(path))
    }

    pub fn name(name: impl Into<String>) -> Self {
        Locator::ByName(ByName::new(name))
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Locator::ByTag(ByTag::new(tag))
    }

    pub fn as_single(&self) -> &dyn ComponentResolvable {
        match self {
            Locator::ByPath(s) => s,
            Locator::InChildren(s) => s,
            Locator::InParents => &InParents,
            Locator::ByType => &ByType,
            Locator::ByName(s) => s,
            Locator::ByTag(s) => s,
        }
    }

    /// Strategies that can return several components.
    pub fn as_many(&self) -> Option<&dyn ComponentArrayResolvable> {
        match self {
            Locator::ByPath(s) => Some(s),
            Locator::InChildren(s) => Some(s),
            _ => None,
        }
    }
}
