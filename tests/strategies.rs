use std::any::TypeId;
use std::rc::Rc;

use ferrous_resolver::{
    Attachable, ByName, ByPath, ByTag, ComponentArrayResolvable, ComponentResolvable, ComponentType, Diagnostic,
    InChildren, InParents, LocateCx, NodeId, NodeProvider, ResolveError, SceneTree,
};

struct Grid {
    host: NodeId,
}

impl Attachable for Grid {
    fn create(host: NodeId) -> Self {
        Grid { host }
    }
}

struct Cell;

fn grid() -> ComponentType {
    ComponentType::attachable::<Grid>()
}

fn downcast<T: 'static>(value: Rc<dyn std::any::Any>) -> Rc<T> {
    value.downcast::<T>().unwrap()
}

#[test]
fn in_parents_finds_nearest_ancestor() {
    let mut tree = SceneTree::new();
    let world = tree.create_node("World", None);
    let level = tree.create_node("Level", Some(world));
    let enemy = tree.create_node("Enemy", Some(level));
    let outer = Rc::new(Grid { host: world });
    let inner = Rc::new(Grid { host: level });
    tree.attach(world, TypeId::of::<Grid>(), outer);
    tree.attach(level, TypeId::of::<Grid>(), inner.clone());

    let mut cx = LocateCx::new(&mut tree, Some(enemy));
    let found = InParents.locate(&mut cx, &grid()).unwrap().unwrap();
    assert!(Rc::ptr_eq(&downcast::<Grid>(found), &inner));
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn in_parents_attaches_on_caller_when_missing() {
    let mut tree = SceneTree::new();
    let enemy = tree.create_node("Enemy", None);
    let mut cx = LocateCx::new(&mut tree, Some(enemy));
    let found = InParents.locate(&mut cx, &grid()).unwrap().unwrap();
    assert_eq!(downcast::<Grid>(found).host, enemy);
    assert!(matches!(cx.diagnostics(), [Diagnostic::Attached { node, .. }] if *node == enemy));
    drop(cx);
    assert!(tree.component(enemy, TypeId::of::<Grid>()).is_some());
}

#[test]
fn empty_name_or_tag_is_a_configuration_error() {
    let mut tree = SceneTree::new();
    let caller = tree.create_node("caller", None);
    let mut cx = LocateCx::new(&mut tree, Some(caller));
    for result in [ByName::new("").locate(&mut cx, &grid()), ByTag::new("").locate(&mut cx, &grid())] {
        assert!(matches!(result, Err(ResolveError::Configuration { .. })));
    }
    drop(cx);
    assert!(tree.component(caller, TypeId::of::<Grid>()).is_none());
}

#[test]
fn by_tag_finds_tagged_node() {
    let mut tree = SceneTree::new();
    let caller = tree.create_node("caller", None);
    let board = tree.create_node("board", None);
    tree.set_tag(board, "Board");
    let existing = Rc::new(Grid { host: board });
    tree.attach(board, TypeId::of::<Grid>(), existing.clone());

    let mut cx = LocateCx::new(&mut tree, Some(caller));
    let found = ByTag::new("Board").locate(&mut cx, &grid()).unwrap().unwrap();
    assert!(Rc::ptr_eq(&downcast::<Grid>(found), &existing));
}

#[test]
fn by_name_finds_named_node_or_falls_back_to_caller() {
    let mut tree = SceneTree::new();
    let caller = tree.create_node("caller", None);
    let world = tree.create_node("World", None);
    let cells = tree.create_node("Cells", Some(world));

    let mut cx = LocateCx::new(&mut tree, Some(caller));
    let found = ByName::new("Cells").locate(&mut cx, &grid()).unwrap().unwrap();
    assert_eq!(downcast::<Grid>(found).host, cells);

    let found = ByName::new("Nowhere").locate(&mut cx, &grid()).unwrap().unwrap();
    assert_eq!(downcast::<Grid>(found).host, caller);
    assert!(cx
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::PathFallback { path, .. } if path == "Nowhere")));
}

#[test]
fn by_path_creates_host_and_attaches_once() {
    let mut tree = SceneTree::new();
    let caller = tree.create_node("caller", None);
    let strategy = ByPath::new("World/Cells");

    let mut cx = LocateCx::new(&mut tree, Some(caller));
    let first = strategy.locate_all(&mut cx, &grid()).unwrap();
    let second = strategy.locate_all(&mut cx, &grid()).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert!(Rc::ptr_eq(&first[0], &second[0]));
    drop(cx);

    let host = tree.find_path(Some(caller), "World/Cells").unwrap();
    assert_eq!(tree.components(host, TypeId::of::<Grid>()).len(), 1);
}

#[test]
fn in_children_array_collects_descendants() {
    let mut tree = SceneTree::new();
    let board = tree.create_node("Board", None);
    for name in ["a", "b", "c"] {
        let cell = tree.create_node(name, Some(board));
        tree.attach(cell, TypeId::of::<Cell>(), Rc::new(Cell));
    }

    let mut cx = LocateCx::new(&mut tree, Some(board));
    let cells = InChildren::new("").locate_all(&mut cx, &ComponentType::of::<Cell>()).unwrap();
    assert_eq!(cells.len(), 3);
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn lookup_only_types_yield_nothing() {
    let mut tree = SceneTree::new();
    let board = tree.create_node("Board", None);
    let mut cx = LocateCx::new(&mut tree, Some(board));
    let cells = InChildren::new("rows").locate_all(&mut cx, &ComponentType::of::<Cell>()).unwrap();
    assert!(cells.is_empty());
    assert!(matches!(cx.diagnostics().last(), Some(Diagnostic::NotFound { strategy: "InChildren", .. })));
}
