use beanpod::sample::{register_app, Grade, Member, MemberService, OrderService, RequestLog, REQUEST_SCOPE};
use beanpod::{BeanDefinition, Container};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

// ===== Micro Benchmarks =====

trait Policy: Send + Sync {
    fn rate(&self) -> u64;
}

struct Flat;
impl Policy for Flat {
    fn rate(&self) -> u64 {
        10
    }
}

fn bench_singleton_hit(c: &mut Criterion) {
    let container = Container::new();
    container
        .register(
            BeanDefinition::builder::<Flat>("flat")
                .provides::<dyn Policy>(|bean| bean as Arc<dyn Policy>)
                .factory(|_| Ok(Flat)),
        )
        .unwrap();
    container.seal().unwrap();

    // Prime the singleton
    let _ = container.get_bean::<dyn Policy>().unwrap();

    c.bench_function("singleton_hit_trait", |b| {
        b.iter(|| {
            let policy = container.get_bean::<dyn Policy>().unwrap();
            black_box(policy.rate());
        })
    });
    c.bench_function("singleton_hit_by_id", |b| {
        b.iter(|| black_box(container.get_bean_by_id::<Flat>("flat").unwrap()))
    });
}

fn bench_singleton_cold(c: &mut Criterion) {
    c.bench_function("app_cold_order_service", |b| {
        b.iter_batched(
            || {
                let container = Container::new();
                register_app(&container).unwrap();
                container.seal().unwrap();
                container
            },
            |container| black_box(container.get_bean::<dyn OrderService>().unwrap()),
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_prototype_chain(c: &mut Criterion) {
    struct Link;

    let mut group = c.benchmark_group("prototype_chain");
    for depth in [1usize, 4, 16] {
        let container = Container::new();
        for i in 0..depth {
            let builder = BeanDefinition::builder::<Link>(format!("link{}", i))
                .qualifier(format!("link{}", i))
                .prototype();
            let builder = if i + 1 < depth {
                builder.depends_on_qualified::<Link>(format!("link{}", i + 1))
            } else {
                builder
            };
            container.register(builder.factory(|_| Ok(Link))).unwrap();
        }
        container.seal().unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| black_box(container.get_bean_qualified::<Link>("link0").unwrap()))
        });
    }
    group.finish();
}

fn bench_request_scope(c: &mut Criterion) {
    let container = Container::new();
    register_app(&container).unwrap();
    container.seal().unwrap();

    let members = container.get_bean::<dyn MemberService>().unwrap();
    members.join(Member::new(1, "memberA", Grade::Vip));
    let orders = container.get_bean::<dyn OrderService>().unwrap();

    let mut group = c.benchmark_group("request_scope");
    group.bench_function("begin_get_end", |b| {
        b.iter(|| {
            container.begin_scope(REQUEST_SCOPE, "bench").unwrap();
            let log = container.get_bean::<RequestLog>().unwrap();
            log.log("bench");
            black_box(container.end_scope(REQUEST_SCOPE, "bench").unwrap());
        })
    });
    group.bench_function("order_in_request", |b| {
        container.begin_scope(REQUEST_SCOPE, "orders").unwrap();
        b.iter(|| black_box(orders.create_order(1, "itemA", 10000).unwrap()));
        container.end_scope(REQUEST_SCOPE, "orders").unwrap();
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_singleton_hit,
    bench_singleton_cold,
    bench_prototype_chain,
    bench_request_scope
);
criterion_main!(benches);
