//! Path resolution against a [`NodeProvider`], creating missing nodes.
//!
//! Grammar: `"/a/b"` is absolute and starts at the root named `a`; `"a/b"` is
//! relative to the calling node; `""` is the calling node itself. Empty
//! segments are skipped, so `"a//b"` and `"a/b/"` address the same node as
//! `"a/b"`.

use smallvec::SmallVec;

use super::{NodeId, NodeProvider};
use crate::observer::Diagnostic;

pub const PATH_SEPARATOR: char = '/';

pub(crate) type Segments<'p> = SmallVec<[&'p str; 4]>;

pub(crate) fn segments(path: &str) -> Segments<'_> {
    path.split(PATH_SEPARATOR).filter(|s| !s.is_empty()).collect()
}

pub(crate) fn is_absolute(path: &str) -> bool {
    path.starts_with(PATH_SEPARATOR)
}

/// Resolves paths to nodes, creating missing segments on the way.
///
/// Resolving the same path twice against an unchanged tree returns the same
/// node and creates nothing the second time.
///
/// # Examples
///
/// ```rust
/// use ferrous_resolver::{NodeProvider, PathResolver, SceneTree};
///
/// let mut tree = SceneTree::new();
/// let mut resolver = PathResolver::new(&mut tree);
/// let c = resolver.resolve(None, "/A/B/C");
/// assert_eq!(resolver.created(), 3);
///
/// let again = resolver.resolve(None, "/A/B/C");
/// assert_eq!(c, again);
/// assert_eq!(resolver.created(), 3);
/// ```
pub struct PathResolver<'p> {
    provider: &'p mut dyn NodeProvider,
    created: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'p> PathResolver<'p> {
    pub fn new(provider: &'p mut dyn NodeProvider) -> Self {
        Self {
            provider,
            created: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Number of nodes this resolver has created so far.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Drains the non-fatal diagnostics gathered while resolving.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Resolves `path` relative to `caller`.
    ///
    /// Falls back to `caller` when nothing can be found or created; this is
    /// only `None` for a non-empty relative path with no calling node, or an
    /// empty path with no calling node.
    pub fn resolve(&mut self, caller: Option<NodeId>, path: &str) -> Option<NodeId> {
        if path.is_empty() {
            return caller;
        }

        let segments = segments(path);
        let absolute = is_absolute(path);

        let mut node = if absolute {
            self.provider.find_path(None, path)
        } else {
            caller.and_then(|from| self.provider.find_path(Some(from), path))
        };

        if node.is_none() {
            if let Some((first, rest)) = segments.split_first() {
                node = if absolute {
                    let root = match self.provider.find_root(first) {
                        Some(root) => root,
                        None => self.create(first, None),
                    };
                    Some(self.walk_or_create(root, rest))
                } else {
                    caller.map(|from| self.walk_or_create(from, &segments))
                };
            }
        }

        match node {
            Some(node) => Some(node),
            None => {
                self.diagnostics.push(Diagnostic::path_fallback(path, caller));
                caller
            }
        }
    }

    fn walk_or_create(&mut self, mut current: NodeId, segments: &[&str]) -> NodeId {
        for segment in segments {
            current = match self.provider.find_child(current, segment) {
                Some(child) => child,
                None => self.create(segment, Some(current)),
            };
        }
        current
    }

    fn create(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        let node = self.provider.create_node(name, parent);
        self.created += 1;
        tracing::debug!(name, ?parent, ?node, "Created node while resolving path");
        node
    }
}

/// One-shot form of [`PathResolver::resolve`].
pub fn resolve_node(
    provider: &mut dyn NodeProvider,
    caller: Option<NodeId>,
    path: &str,
) -> Option<NodeId> {
    PathResolver::new(provider).resolve(caller, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SceneTree;

    #[test]
    fn segments_skip_empty() {
        assert_eq!(segments("/a//b/").as_slice(), &["a", "b"]);
        assert!(segments("/").is_empty());
        assert!(is_absolute("/a"));
        assert!(!is_absolute("a/b"));
    }

    #[test]
    fn empty_path_is_caller() {
        let mut tree = SceneTree::new();
        let caller = tree.create_node("caller", None);
        assert_eq!(resolve_node(&mut tree, Some(caller), ""), Some(caller));
        assert_eq!(resolve_node(&mut tree, None, ""), None);
    }

    #[test]
    fn relative_path_walks_existing_then_creates() {
        let mut tree = SceneTree::new();
        let caller = tree.create_node("caller", None);
        let child = tree.create_node("child", Some(caller));

        let mut resolver = PathResolver::new(&mut tree);
        let leaf = resolver.resolve(Some(caller), "child/leaf").unwrap();
        assert_eq!(resolver.created(), 1);
        drop(resolver);

        assert_eq!(tree.parent(leaf), Some(child));
        assert_eq!(tree.name(leaf).as_deref(), Some("leaf"));
    }

    #[test]
    fn absolute_reuses_existing_root() {
        let mut tree = SceneTree::new();
        let root = tree.create_node("World", None);
        let node = resolve_node(&mut tree, None, "/World/Cells").unwrap();
        assert_eq!(tree.parent(node), Some(root));
        assert_eq!(tree.roots(), vec![root]);
    }

    #[test]
    fn root_only_path_falls_back_to_caller() {
        let mut tree = SceneTree::new();
        let caller = tree.create_node("caller", None);
        let mut resolver = PathResolver::new(&mut tree);
        assert_eq!(resolver.resolve(Some(caller), "/"), Some(caller));
        assert_eq!(resolver.created(), 0);
        assert_eq!(resolver.take_diagnostics().len(), 1);
    }

    #[test]
    fn relative_without_caller_reports_and_returns_none() {
        let mut tree = SceneTree::new();
        let mut resolver = PathResolver::new(&mut tree);
        assert_eq!(resolver.resolve(None, "a/b"), None);
        assert_eq!(resolver.created(), 0);
        assert!(matches!(
            resolver.take_diagnostics().as_slice(),
            [Diagnostic::PathFallback { .. }]
        ));
    }
}
