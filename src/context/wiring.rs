//! Resolved dependency slots handed to [`Injectable::construct`](crate::Injectable::construct).

use std::any::type_name;
use std::rc::Rc;

use ahash::AHashMap;

use crate::descriptors::{DescriptorTable, Target};
use crate::hierarchy::{AnyRc, NodeId, NodeProvider};
use crate::{LifeCycle, ResolveError, ResolveResult};

use super::{downcast, downcast_trait, Context};

enum Slot {
    One(AnyRc),
    Many(Vec<AnyRc>),
    /// A component slot whose lookup came back empty.
    Missing,
}

struct Filled {
    slot: Slot,
    lifecycle: LifeCycle,
    type_name: &'static str,
}

/// Values for every slot of a descriptor table.
///
/// Slots are filled in declaration order before `construct` runs, so a
/// failing slot aborts construction without partial side effects on the
/// instance itself.
pub struct Wiring<'w> {
    context: &'w Context,
    caller: Option<NodeId>,
    slots: AHashMap<&'static str, Filled>,
}

impl<'w> Wiring<'w> {
    pub(crate) fn fill(
        context: &'w Context,
        table: &DescriptorTable,
        mut provider: Option<&mut dyn NodeProvider>,
        caller: Option<NodeId>,
    ) -> ResolveResult<Self> {
        let mut slots = AHashMap::with_capacity(table.len());
        for dependency in table {
            let slot = match &dependency.target {
                Target::Service(key) => Slot::One(match provider.as_deref_mut() {
                    Some(provider) => {
                        context.resolve_routed(*key, dependency.lifecycle, provider, caller, &dependency.locator)?
                    }
                    None => context.resolve_key(*key, dependency.lifecycle, None, None)?,
                }),
                Target::Prefab(key) => {
                    let Some(provider) = provider.as_deref_mut() else {
                        return Err(ResolveError::unresolvable(
                            dependency.type_name,
                            dependency.lifecycle,
                            "prefab slot needs a node provider",
                        ));
                    };
                    let Some(acquire) = context.registry.prefab_acquire(key.type_id()) else {
                        return Err(ResolveError::unresolvable(
                            dependency.type_name,
                            dependency.lifecycle,
                            "no prefab binding",
                        ));
                    };
                    Slot::One(acquire(context, provider, caller)?)
                }
                Target::Component(ty) | Target::Components(ty) => {
                    let Some(provider) = provider.as_deref_mut() else {
                        return Err(ResolveError::unresolvable(
                            dependency.type_name,
                            dependency.lifecycle,
                            "component slot needs a node provider",
                        ));
                    };
                    if matches!(dependency.target, Target::Components(_)) {
                        Slot::Many(context.locate_components(
                            provider,
                            caller,
                            dependency.lifecycle,
                            &dependency.locator,
                            ty,
                        )?)
                    } else {
                        context
                            .locate_component(provider, caller, dependency.lifecycle, &dependency.locator, ty)?
                            .map_or(Slot::Missing, Slot::One)
                    }
                }
            };
            slots.insert(
                dependency.slot,
                Filled {
                    slot,
                    lifecycle: dependency.lifecycle,
                    type_name: dependency.type_name,
                },
            );
        }
        Ok(Self {
            context,
            caller,
            slots,
        })
    }

    pub fn context(&self) -> &'w Context {
        self.context
    }

    /// The node components were located from.
    pub fn caller(&self) -> Option<NodeId> {
        self.caller
    }

    /// A required single-valued slot.
    pub fn get<T: 'static>(&self, slot: &str) -> ResolveResult<Rc<T>> {
        let filled = self.filled::<T>(slot)?;
        match &filled.slot {
            Slot::One(value) => downcast::<T>(value.clone()),
            Slot::Missing => Err(ResolveError::unresolvable(
                filled.type_name,
                filled.lifecycle,
                "component not found",
            )),
            Slot::Many(_) => Err(ResolveError::TypeMismatch(type_name::<T>())),
        }
    }

    /// A single-valued slot that may have come back empty.
    pub fn optional<T: 'static>(&self, slot: &str) -> ResolveResult<Option<Rc<T>>> {
        let filled = self.filled::<T>(slot)?;
        match &filled.slot {
            Slot::One(value) => downcast::<T>(value.clone()).map(Some),
            Slot::Missing => Ok(None),
            Slot::Many(_) => Err(ResolveError::TypeMismatch(type_name::<T>())),
        }
    }

    /// A trait-object service slot.
    pub fn get_trait<T: ?Sized + 'static>(&self, slot: &str) -> ResolveResult<Rc<T>> {
        let filled = self.filled::<T>(slot)?;
        match &filled.slot {
            Slot::One(value) => downcast_trait::<T>(value.clone()),
            _ => Err(ResolveError::TypeMismatch(type_name::<T>())),
        }
    }

    /// A multi-valued component slot.
    pub fn all<T: 'static>(&self, slot: &str) -> ResolveResult<Vec<Rc<T>>> {
        let filled = self.filled::<T>(slot)?;
        match &filled.slot {
            Slot::Many(values) => values.iter().cloned().map(downcast::<T>).collect(),
            Slot::One(value) => Ok(vec![downcast::<T>(value.clone())?]),
            Slot::Missing => Ok(Vec::new()),
        }
    }

    fn filled<T: ?Sized>(&self, slot: &str) -> ResolveResult<&Filled> {
        self.slots.get(slot).ok_or_else(|| {
            ResolveError::unresolvable(type_name::<T>(), LifeCycle::DEFAULT, "slot was never declared")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attachable, ContextBuilder, Injectable, Locator, SceneTree};

    struct Score(u32);

    struct Badge;

    impl Attachable for Badge {
        fn create(_host: NodeId) -> Self {
            Badge
        }
    }

    struct Hud {
        score: Rc<Score>,
        badge: Rc<Badge>,
        trophy: Option<Rc<Score>>,
    }

    impl Injectable for Hud {
        fn describe(table: &mut DescriptorTable) {
            table
                .service::<Score>("score", LifeCycle::SINGLETON)
                .attachable::<Badge>("badge", LifeCycle::COMPONENT, Locator::path("ui/badge"))
                .component::<Score>("trophy", LifeCycle::COMPONENT, Locator::ByType);
        }

        fn construct(wiring: &Wiring) -> ResolveResult<Self> {
            Ok(Hud {
                score: wiring.get("score")?,
                badge: wiring.get("badge")?,
                trophy: wiring.optional("trophy")?,
            })
        }
    }

    #[test]
    fn fills_services_and_components() {
        let mut builder = ContextBuilder::new();
        builder.bind_instance(Score(10));
        let context = builder.build();

        let mut tree = SceneTree::new();
        let player = tree.create_node("player", None);
        let hud = context.construct_on::<Hud>(&mut tree, Some(player)).unwrap();

        assert_eq!(hud.score.0, 10);
        assert!(hud.trophy.is_none());
        let host = tree.find_path(Some(player), "ui/badge").unwrap();
        let attached = tree.component(host, std::any::TypeId::of::<Badge>()).unwrap();
        assert!(Rc::ptr_eq(&downcast::<Badge>(attached).unwrap(), &hud.badge));
    }

    #[test]
    fn component_slots_need_a_provider() {
        let mut builder = ContextBuilder::new();
        builder.bind_instance(Score(1));
        let context = builder.build();
        assert!(matches!(
            context.construct::<Hud>(),
            Err(ResolveError::Unresolvable { .. })
        ));
    }

    struct Shell;

    struct Armor(u8);

    struct Cannon {
        shell: Rc<Shell>,
        armor: Rc<Armor>,
    }

    impl Injectable for Cannon {
        fn describe(table: &mut DescriptorTable) {
            table
                .prefab::<Shell>("shell")
                .service::<Armor>("armor", LifeCycle::COMPONENT);
        }

        fn construct(wiring: &Wiring) -> ResolveResult<Self> {
            Ok(Cannon {
                shell: wiring.get("shell")?,
                armor: wiring.get("armor")?,
            })
        }
    }

    fn shell_prefab(provider: &mut dyn NodeProvider) -> crate::Attached<Shell> {
        let node = provider.create_node("shell", None);
        crate::Attached::new(node, Rc::new(Shell))
    }

    #[test]
    fn prefab_and_component_slots_route_by_lifecycle() {
        let mut builder = ContextBuilder::new();
        builder.bind_prefab(shell_prefab).bind_instance(Armor(1));
        let context = builder.build();

        let mut tree = SceneTree::new();
        let turret = tree.create_node("turret", None);
        let plated = Rc::new(Armor(9));
        tree.attach(turret, std::any::TypeId::of::<Armor>(), plated.clone());

        let cannon = context.construct_on::<Cannon>(&mut tree, Some(turret)).unwrap();
        assert!(Rc::ptr_eq(&cannon.armor, &plated));
        assert_eq!(cannon.armor.0, 9);
        assert_eq!(context.prefab_pool_len::<Shell>(), 1);
        // The pooled shell is owned by the constructing node.
        assert_eq!(tree.children(turret).len(), 1);
        assert!(Rc::strong_count(&cannon.shell) >= 2);

        // Without a component on the host the binding table answers.
        let bare = tree.create_node("bare", None);
        let fallback = context.construct_on::<Cannon>(&mut tree, Some(bare)).unwrap();
        assert_eq!(fallback.armor.0, 1);
        assert_eq!(context.prefab_pool_len::<Shell>(), 2);
    }

    #[test]
    fn prefab_slots_need_a_provider() {
        let mut builder = ContextBuilder::new();
        builder.bind_prefab(shell_prefab).bind_instance(Armor(1));
        let context = builder.build();
        assert!(matches!(
            context.construct::<Cannon>(),
            Err(ResolveError::Unresolvable { .. })
        ));
    }

    #[test]
    fn descriptor_table_is_built_once() {
        let context = ContextBuilder::new().build();
        let first = context.descriptor_table::<Hud>();
        let second = context.descriptor_table::<Hud>();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 3);
    }
}
