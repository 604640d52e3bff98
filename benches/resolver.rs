use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ferrous_resolver::{resolve_node, ContextBuilder, LifeCycle, NodeId, NodeProvider, OrderedPool, SceneTree};

// ===== Context =====

fn bench_singleton_hit(c: &mut Criterion) {
    let mut builder = ContextBuilder::new();
    builder.bind_factory(LifeCycle::DEFAULT, |_| Ok(42u64));
    let context = builder.build();

    // Prime the cache
    let _ = context.resolve::<u64>(LifeCycle::SINGLETON).unwrap();

    c.bench_function("singleton_hit_u64", |b| {
        b.iter(|| {
            let v = context.resolve::<u64>(LifeCycle::SINGLETON).unwrap();
            black_box(v);
        })
    });
}

fn bench_transient_build(c: &mut Criterion) {
    struct Payload {
        data: [u8; 64],
    }

    let mut builder = ContextBuilder::new();
    builder.bind_factory(LifeCycle::TRANSIENT, |_| Ok(Payload { data: [0; 64] }));
    let context = builder.build();

    c.bench_function("transient_build", |b| {
        b.iter(|| {
            let v = context.resolve::<Payload>(LifeCycle::TRANSIENT).unwrap();
            black_box(&v.data);
        })
    });
}

fn bench_trait_chain(c: &mut Criterion) {
    trait Rules {
        fn size(&self) -> usize;
    }

    struct Classic;

    impl Rules for Classic {
        fn size(&self) -> usize {
            9
        }
    }

    struct Board {
        cells: usize,
    }

    let mut builder = ContextBuilder::new();
    builder
        .bind_trait::<dyn Rules, _>(LifeCycle::SINGLETON, |_| Ok(Rc::new(Classic) as Rc<dyn Rules>))
        .bind_factory(LifeCycle::TRANSIENT, |context| {
            let rules = context.resolve_trait::<dyn Rules>(LifeCycle::SINGLETON)?;
            Ok(Board {
                cells: rules.size() * rules.size(),
            })
        });
    let context = builder.build();

    c.bench_function("transient_with_singleton_trait_dep", |b| {
        b.iter(|| {
            let board = context.resolve::<Board>(LifeCycle::TRANSIENT).unwrap();
            black_box(board.cells);
        })
    });
}

// ===== Hierarchy =====

fn bench_path_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_resolve");

    let mut tree = SceneTree::new();
    let caller = tree.create_node("Player", None);
    resolve_node(&mut tree, Some(caller), "Body/Arm/Hand");

    group.bench_function("existing", |b| {
        b.iter(|| {
            let node = resolve_node(&mut tree, Some(caller), black_box("Body/Arm/Hand"));
            black_box(node);
        })
    });

    group.bench_function("create_absolute", |b| {
        b.iter_batched(
            SceneTree::new,
            |mut tree| {
                let node = resolve_node(&mut tree, None, black_box("/World/Level/Cells"));
                black_box(node);
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

// ===== Pools =====

fn bench_pool_acquire(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_acquire");

    group.bench_function("recycle", |b| {
        let mut tree = SceneTree::new();
        let mut pool: OrderedPool<NodeId> = OrderedPool::new();
        pool.preload(&mut tree, 64, None, |tree| tree.create_node("bullet", None));
        b.iter(|| {
            let node = pool.acquire(&mut tree, None, |tree| tree.create_node("bullet", None));
            tree.set_active(node, false);
            black_box(node);
        })
    });

    group.bench_function("grow", |b| {
        b.iter_batched(
            || (SceneTree::new(), OrderedPool::<NodeId>::new()),
            |(mut tree, mut pool)| {
                for _ in 0..32 {
                    black_box(pool.acquire(&mut tree, None, |tree| tree.create_node("bullet", None)));
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(context_benches, bench_singleton_hit, bench_transient_build, bench_trait_chain);
criterion_group!(hierarchy_benches, bench_path_resolve, bench_pool_acquire);
criterion_main!(context_benches, hierarchy_benches);
