use ferrous_resolver::{resolve_node, NodeProvider, PathResolver, SceneTree};
use proptest::prelude::*;

#[test]
fn absolute_path_creates_exactly_its_segments() {
    let mut tree = SceneTree::new();
    let mut resolver = PathResolver::new(&mut tree);
    let c = resolver.resolve(None, "/A/B/C").unwrap();
    assert_eq!(resolver.created(), 3);

    let again = resolver.resolve(None, "/A/B/C").unwrap();
    assert_eq!(again, c);
    assert_eq!(resolver.created(), 3);
    drop(resolver);

    let roots = tree.roots();
    assert_eq!(roots.len(), 1);
    let a = roots[0];
    assert_eq!(tree.name(a).as_deref(), Some("A"));
    let b = tree.parent(c).unwrap();
    assert_eq!(tree.name(b).as_deref(), Some("B"));
    assert_eq!(tree.parent(b), Some(a));
    assert_eq!(tree.name(c).as_deref(), Some("C"));
    assert_eq!(tree.len(), 3);
}

#[test]
fn relative_path_is_created_under_caller() {
    let mut tree = SceneTree::new();
    let caller = tree.create_node("Enemy", None);
    let node = resolve_node(&mut tree, Some(caller), "Weapons/Left").unwrap();
    assert_eq!(tree.path_of(node).as_deref(), Some("/Enemy/Weapons/Left"));

    // A sibling path reuses the shared prefix.
    let right = resolve_node(&mut tree, Some(caller), "Weapons/Right").unwrap();
    assert_eq!(tree.parent(right), tree.parent(node));
    assert_eq!(tree.len(), 4);
}

#[test]
fn empty_path_and_fallbacks() {
    let mut tree = SceneTree::new();
    let caller = tree.create_node("caller", None);
    assert_eq!(resolve_node(&mut tree, Some(caller), ""), Some(caller));

    let mut resolver = PathResolver::new(&mut tree);
    assert_eq!(resolver.resolve(Some(caller), "///"), Some(caller));
    assert_eq!(resolver.take_diagnostics().len(), 1);
    assert_eq!(resolver.resolve(None, "relative"), None);
}

#[test]
fn absolute_lookup_ignores_caller() {
    let mut tree = SceneTree::new();
    let caller = tree.create_node("caller", None);
    let world = resolve_node(&mut tree, Some(caller), "/World").unwrap();
    assert_ne!(world, caller);
    assert_eq!(tree.parent(world), None);
}

fn segment() -> impl Strategy<Value = String> {
    "[a-c]{1,2}"
}

proptest! {
    #[test]
    fn resolving_twice_is_idempotent(
        segments in prop::collection::vec(segment(), 1..5),
        absolute in any::<bool>(),
    ) {
        let mut tree = SceneTree::new();
        let caller = tree.create_node("root", None);
        let joined = segments.join("/");
        let path = if absolute { format!("/{joined}") } else { joined };

        let first = resolve_node(&mut tree, Some(caller), &path);
        let size = tree.len();
        let second = resolve_node(&mut tree, Some(caller), &path);

        prop_assert!(first.is_some());
        prop_assert_eq!(first, second);
        prop_assert_eq!(tree.len(), size);
        prop_assert_eq!(tree.find_path(Some(caller), &path), first);
    }
}
