use beanpod::sample::{register_app, LogDemoService, RequestLog, REQUEST_SCOPE};
use beanpod::{BeanDefinition, Container, DiError, LazyProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Clock {
    tick: usize,
}

struct Scheduler {
    clock: LazyProvider<Clock>,
}

fn scheduler_container(builds: &Arc<AtomicUsize>) -> Container {
    let counter = builds.clone();
    let container = Container::new();
    container
        .register(BeanDefinition::builder::<Clock>("clock").prototype().factory(move |_| {
            Ok(Clock {
                tick: counter.fetch_add(1, Ordering::SeqCst),
            })
        }))
        .unwrap();
    container
        .register(
            BeanDefinition::builder::<Scheduler>("scheduler")
                .lazy::<Clock>()
                .factory(|deps| Ok(Scheduler { clock: deps.lazy::<Clock>(0)? })),
        )
        .unwrap();
    container.seal().unwrap();
    container
}

#[test]
fn test_lazy_provider_defers_construction() {
    let builds = Arc::new(AtomicUsize::new(0));
    let container = scheduler_container(&builds);

    let scheduler = container.get_bean::<Scheduler>().unwrap();
    assert_eq!(builds.load(Ordering::SeqCst), 0);

    // Prototype target: every call builds afresh
    assert_eq!(scheduler.clock.get().unwrap().tick, 0);
    assert_eq!(scheduler.clock.get().unwrap().tick, 1);
}

#[test]
fn test_lazy_provider_from_container() {
    let builds = Arc::new(AtomicUsize::new(0));
    let container = scheduler_container(&builds);

    let provider = container.lazy_provider::<Clock>(None);
    assert_eq!(provider.qualifier(), None);
    assert_eq!(provider.get().unwrap().tick, 0);

    let missing = container.lazy_provider::<String>(Some("nothing"));
    assert!(matches!(missing.get(), Err(DiError::NoSuchBean { .. })));
}

#[test]
fn test_handles_fail_after_container_dropped() {
    let builds = Arc::new(AtomicUsize::new(0));
    let container = scheduler_container(&builds);
    let provider = container.lazy_provider::<Clock>(None);

    drop(container);
    assert_eq!(provider.get().err(), Some(DiError::ShutDown));
}

#[test]
fn test_handles_fail_after_shutdown() {
    let builds = Arc::new(AtomicUsize::new(0));
    let container = scheduler_container(&builds);
    let scheduler = container.get_bean::<Scheduler>().unwrap();

    container.shutdown();
    assert_eq!(scheduler.clock.get().err(), Some(DiError::ShutDown));
}

#[test]
fn test_scoped_proxy_requires_known_target() {
    let container = Container::new();
    container.seal().unwrap();
    assert!(matches!(
        container.scoped_proxy::<RequestLog>(None),
        Err(DiError::NoSuchBean { .. })
    ));
}

#[test]
fn test_request_log_per_request() {
    let container = Container::new();
    register_app(&container).unwrap();
    container.seal().unwrap();

    let service = container.get_bean::<LogDemoService>().unwrap();
    let proxy = container.scoped_proxy::<RequestLog>(None).unwrap();
    assert_eq!(proxy.definition_id(), Some("requestLog"));

    container.begin_scope(REQUEST_SCOPE, "r1").unwrap();
    service.handle("http://localhost/log-demo", "testId").unwrap();
    let first = proxy.get().unwrap();
    assert_eq!(first.lines().len(), 2);
    assert!(first.lines()[1].ends_with("service id = testId"));
    assert!(first.lines()[0].contains("http://localhost/log-demo"));
    container.end_scope(REQUEST_SCOPE, "r1").unwrap();
    assert!(first.is_closed());

    container.begin_scope(REQUEST_SCOPE, "r2").unwrap();
    service.logic("other").unwrap();
    let second = proxy.get().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_ne!(first.tag(), second.tag());
    assert_eq!(second.lines().len(), 1);
    container.end_scope(REQUEST_SCOPE, "r2").unwrap();

    // Outside a request the proxy has nothing to forward to
    assert!(matches!(
        service.logic("late"),
        Err(DiError::ScopeNotActive { .. })
    ));
}
