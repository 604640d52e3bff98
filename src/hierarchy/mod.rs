//! Hierarchical node tree abstraction.
//!
//! The container never owns the scene graph. Hosts hand it a
//! [`NodeProvider`] and every path walk, component lookup and attachment goes
//! through that trait. [`SceneTree`] is an in-memory implementation for hosts
//! that do not bring their own tree, and for tests.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

pub mod path;
mod tree;

pub use path::{resolve_node, PathResolver, PATH_SEPARATOR};
pub use tree::SceneTree;

/// Type-erased, reference-counted component or instance.
pub type AnyRc = Rc<dyn Any>;

/// Opaque handle to a node of the host tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Wraps a host-side identifier.
    pub const fn from_raw(raw: u64) -> Self {
        NodeId(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Host-supplied hierarchical tree of addressable nodes.
///
/// Required methods are the primitive operations a scene graph offers: name
/// and parent/children navigation, node creation, liveness, the per-node
/// active flag, tags and component storage keyed by `TypeId`. The provided
/// methods build the searches the resolution strategies need on top of them.
///
/// Queries about a node that no longer exists return `None`, `false` or an
/// empty list. Mutations of a dead node are ignored.
pub trait NodeProvider {
    /// Root nodes of the active tree, in a stable order.
    fn roots(&self) -> Vec<NodeId>;

    fn name(&self, node: NodeId) -> Option<String>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Creates a node named `name` under `parent`, or as a new root.
    fn create_node(&mut self, name: &str, parent: Option<NodeId>) -> NodeId;

    /// Moves `node` under `parent` (or to the root level). Components and
    /// descendants travel with it.
    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>);

    /// Destroys `node` and its descendants.
    fn destroy(&mut self, node: NodeId);

    /// Whether the node still exists.
    fn exists(&self, node: NodeId) -> bool;

    /// The node's own active (visible) flag.
    fn is_active(&self, node: NodeId) -> bool;

    fn set_active(&mut self, node: NodeId, active: bool);

    fn tag(&self, node: NodeId) -> Option<String>;

    /// Every component of exactly `type_id` on `node`, in attach order.
    fn components(&self, node: NodeId, type_id: TypeId) -> Vec<AnyRc>;

    /// Attaches `component`, registered under `type_id`, to `node`.
    fn attach(&mut self, node: NodeId, type_id: TypeId, component: AnyRc);

    /// Removes and returns the first component of `type_id` from `node`.
    fn detach(&mut self, node: NodeId, type_id: TypeId) -> Option<AnyRc>;

    fn component(&self, node: NodeId, type_id: TypeId) -> Option<AnyRc> {
        self.components(node, type_id).into_iter().next()
    }

    /// Direct child of `parent` named `name`.
    fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .into_iter()
            .find(|child| self.name(*child).as_deref() == Some(name))
    }

    /// Root node named `name`.
    fn find_root(&self, name: &str) -> Option<NodeId> {
        self.roots()
            .into_iter()
            .find(|root| self.name(*root).as_deref() == Some(name))
    }

    /// Looks up a path without creating anything.
    ///
    /// With a leading separator the first segment names a root; otherwise the
    /// walk starts at `from`. Returns `None` if any segment is missing or a
    /// relative path is given without a starting node.
    fn find_path(&self, from: Option<NodeId>, path: &str) -> Option<NodeId> {
        let mut segments = path::segments(path).into_iter();
        let mut current = if path::is_absolute(path) {
            self.find_root(segments.next()?)?
        } else {
            from?
        };
        for segment in segments {
            current = self.find_child(current, segment)?;
        }
        Some(current)
    }

    /// First component of `type_id` on `node` or any descendant, depth first,
    /// `node` itself checked before its children.
    fn find_in_children(&self, node: NodeId, type_id: TypeId) -> Option<AnyRc> {
        if let Some(found) = self.component(node, type_id) {
            return Some(found);
        }
        self.children(node)
            .into_iter()
            .find_map(|child| self.find_in_children(child, type_id))
    }

    /// Every component of `type_id` on `node` and its descendants.
    fn all_in_children(&self, node: NodeId, type_id: TypeId) -> Vec<AnyRc> {
        let mut found = self.components(node, type_id);
        for child in self.children(node) {
            found.extend(self.all_in_children(child, type_id));
        }
        found
    }

    /// First component of `type_id` on `node` or the nearest ancestor.
    fn find_in_parents(&self, node: NodeId, type_id: TypeId) -> Option<AnyRc> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if let Some(found) = self.component(candidate, type_id) {
                return Some(found);
            }
            current = self.parent(candidate);
        }
        None
    }

    /// First component of `type_id` anywhere in the tree.
    fn find_by_type(&self, type_id: TypeId) -> Option<AnyRc> {
        self.roots()
            .into_iter()
            .find_map(|root| self.find_in_children(root, type_id))
    }

    /// First node named `name`, searched depth first from the roots. A name
    /// containing a separator is looked up as a path instead.
    fn find_by_name(&self, name: &str) -> Option<NodeId> {
        if name.contains(PATH_SEPARATOR) {
            let absolute = if path::is_absolute(name) {
                name.to_owned()
            } else {
                format!("{PATH_SEPARATOR}{name}")
            };
            return self.find_path(None, &absolute);
        }
        fn walk<P: NodeProvider + ?Sized>(provider: &P, node: NodeId, name: &str) -> Option<NodeId> {
            if provider.name(node).as_deref() == Some(name) {
                return Some(node);
            }
            provider
                .children(node)
                .into_iter()
                .find_map(|child| walk(provider, child, name))
        }
        self.roots().into_iter().find_map(|root| walk(self, root, name))
    }

    /// Every node tagged `tag`, depth first from the roots.
    fn find_with_tag(&self, tag: &str) -> Vec<NodeId> {
        fn walk<P: NodeProvider + ?Sized>(provider: &P, node: NodeId, tag: &str, out: &mut Vec<NodeId>) {
            if provider.tag(node).as_deref() == Some(tag) {
                out.push(node);
            }
            for child in provider.children(node) {
                walk(provider, child, tag, out);
            }
        }
        let mut out = Vec::new();
        for root in self.roots() {
            walk(self, root, tag, &mut out);
        }
        out
    }
}
