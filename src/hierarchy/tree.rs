//! In-memory node tree.

use std::any::TypeId;

use ahash::AHashMap;

use super::{AnyRc, NodeId, NodeProvider};

struct NodeData {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    active: bool,
    tag: Option<String>,
    components: Vec<(TypeId, AnyRc)>,
}

/// Arena-backed [`NodeProvider`].
///
/// Node ids are never reused, so a destroyed node stays dead for good.
#[derive(Default)]
pub struct SceneTree {
    nodes: AHashMap<NodeId, NodeData>,
    roots: Vec<NodeId>,
    next_id: u64,
    created: usize,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total nodes ever created in this tree, destroyed ones included.
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Nodes currently alive.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set_tag(&mut self, node: NodeId, tag: impl Into<String>) {
        if let Some(data) = self.nodes.get_mut(&node) {
            data.tag = Some(tag.into());
        }
    }

    /// Whether the node and all of its ancestors are active.
    pub fn is_active_in_hierarchy(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            match self.nodes.get(&id) {
                Some(data) if data.active => current = data.parent,
                _ => return false,
            }
        }
        true
    }

    /// Slash-separated absolute path of a live node.
    pub fn path_of(&self, node: NodeId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let data = self.nodes.get(&id)?;
            names.push(data.name.as_str());
            current = data.parent;
        }
        names.reverse();
        Some(format!("/{}", names.join("/")))
    }

    fn unlink(&mut self, node: NodeId) {
        let parent = self.nodes.get(&node).and_then(|data| data.parent);
        match parent {
            Some(parent) => {
                if let Some(data) = self.nodes.get_mut(&parent) {
                    data.children.retain(|child| *child != node);
                }
            }
            None => self.roots.retain(|root| *root != node),
        }
    }

    fn link(&mut self, node: NodeId, parent: Option<NodeId>) {
        let parent = parent.filter(|p| self.nodes.contains_key(p));
        match parent {
            Some(p) => {
                if let Some(data) = self.nodes.get_mut(&p) {
                    data.children.push(node);
                }
            }
            None => self.roots.push(node),
        }
        if let Some(data) = self.nodes.get_mut(&node) {
            data.parent = parent;
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|data| data.parent);
        }
        false
    }
}

impl NodeProvider for SceneTree {
    fn roots(&self) -> Vec<NodeId> {
        self.roots.clone()
    }

    fn name(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).map(|data| data.name.clone())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|data| data.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    fn create_node(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::from_raw(self.next_id);
        self.next_id += 1;
        self.created += 1;
        self.nodes.insert(
            id,
            NodeData {
                name: name.to_owned(),
                parent: None,
                children: Vec::new(),
                active: true,
                tag: None,
                components: Vec::new(),
            },
        );
        self.link(id, parent);
        id
    }

    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) {
        if !self.nodes.contains_key(&node) {
            return;
        }
        // Refuse moves that would detach a subtree into itself.
        if let Some(p) = parent {
            if self.is_ancestor(node, p) {
                return;
            }
        }
        if self.parent(node) == parent && (parent.is_some() || self.roots.contains(&node)) {
            return;
        }
        self.unlink(node);
        self.link(node, parent);
    }

    fn destroy(&mut self, node: NodeId) {
        if !self.nodes.contains_key(&node) {
            return;
        }
        self.unlink(node);
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            if let Some(data) = self.nodes.remove(&id) {
                pending.extend(data.children);
            }
        }
    }

    fn exists(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn is_active(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|data| data.active)
    }

    fn set_active(&mut self, node: NodeId, active: bool) {
        if let Some(data) = self.nodes.get_mut(&node) {
            data.active = active;
        }
    }

    fn tag(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).and_then(|data| data.tag.clone())
    }

    fn components(&self, node: NodeId, type_id: TypeId) -> Vec<AnyRc> {
        self.nodes
            .get(&node)
            .map(|data| {
                data.components
                    .iter()
                    .filter(|(id, _)| *id == type_id)
                    .map(|(_, component)| component.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn attach(&mut self, node: NodeId, type_id: TypeId, component: AnyRc) {
        if let Some(data) = self.nodes.get_mut(&node) {
            data.components.push((type_id, component));
        }
    }

    fn detach(&mut self, node: NodeId, type_id: TypeId) -> Option<AnyRc> {
        let data = self.nodes.get_mut(&node)?;
        let index = data.components.iter().position(|(id, _)| *id == type_id)?;
        Some(data.components.remove(index).1)
    }
}
