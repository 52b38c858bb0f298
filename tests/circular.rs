use beanpod::{BeanDefinition, Container, ContainerConfig, DiError, LazyProvider};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

struct A {
    _b: Arc<B>,
}

struct B {
    _a: Arc<A>,
}

fn cyclic(container: &Container, scope_prototype: bool) {
    let a = BeanDefinition::builder::<A>("a").depends_on::<B>();
    let b = BeanDefinition::builder::<B>("b").depends_on::<A>();
    let (a, b) = if scope_prototype {
        (a.prototype(), b.prototype())
    } else {
        (a, b)
    };
    container
        .register(a.factory(|deps| Ok(A { _b: deps.bean::<B>(0)? })))
        .unwrap();
    container
        .register(b.factory(|deps| Ok(B { _a: deps.bean::<A>(0)? })))
        .unwrap();
    container.seal().unwrap();
}

#[test]
fn test_self_circular_dependency() {
    struct SelfReferencing;

    let container = Container::new();
    container
        .register(
            BeanDefinition::builder::<SelfReferencing>("self")
                .depends_on::<SelfReferencing>()
                .factory(|_| Ok(SelfReferencing)),
        )
        .unwrap();
    container.seal().unwrap();

    match container.get_bean::<SelfReferencing>() {
        Err(DiError::Circular(path)) => assert_eq!(path, vec!["self", "self"]),
        other => panic!("Expected circular error, got {:?}", other.err()),
    }
}

#[test]
fn test_singleton_cycle_reports_path() {
    let container = Container::new();
    cyclic(&container, false);

    match container.get_bean::<A>() {
        Err(DiError::Circular(path)) => assert_eq!(path, vec!["a", "b", "a"]),
        other => panic!("Expected circular error, got {:?}", other.err()),
    }
    // Nothing half-built is left behind, and the failure repeats
    assert_eq!(container.singleton_count(), 0);
    assert!(matches!(container.get_bean::<B>(), Err(DiError::Circular(_))));
}

#[test]
fn test_prototype_cycle_reports_path() {
    let container = Container::new();
    cyclic(&container, true);

    match container.get_bean::<B>() {
        Err(DiError::Circular(path)) => assert_eq!(path, vec!["b", "a", "b"]),
        other => panic!("Expected circular error, got {:?}", other.err()),
    }
}

#[test]
fn test_lazy_provider_breaks_cycle() {
    struct Parent {
        child: Arc<Child>,
    }
    struct Child {
        parent: LazyProvider<Parent>,
    }

    let container = Container::new();
    container
        .register(
            BeanDefinition::builder::<Parent>("parent")
                .depends_on::<Child>()
                .factory(|deps| Ok(Parent { child: deps.bean::<Child>(0)? })),
        )
        .unwrap();
    container
        .register(
            BeanDefinition::builder::<Child>("child")
                .lazy::<Parent>()
                .factory(|deps| Ok(Child { parent: deps.lazy::<Parent>(0)? })),
        )
        .unwrap();
    container.seal().unwrap();

    let parent = container.get_bean::<Parent>().unwrap();
    let through_child = parent.child.parent.get().unwrap();
    assert!(Arc::ptr_eq(&parent, &through_child));
}

#[test]
fn test_depth_limit() {
    struct Link;

    let container = Container::with_config(ContainerConfig::default().max_resolution_depth(3));
    let ids = ["l0", "l1", "l2", "l3", "l4"];
    for (i, id) in ids.iter().enumerate() {
        let builder = BeanDefinition::builder::<Link>(*id).qualifier(*id).prototype();
        let builder = match ids.get(i + 1) {
            Some(next) => builder.depends_on_qualified::<Link>(*next),
            None => builder,
        };
        container.register(builder.factory(|_| Ok(Link))).unwrap();
    }
    container.seal().unwrap();

    assert_eq!(
        container.get_bean_qualified::<Link>("l0").err(),
        Some(DiError::DepthExceeded(3))
    );
    assert!(container.get_bean_qualified::<Link>("l2").is_ok());
}

#[test]
fn test_cross_thread_cycle_does_not_deadlock() {
    struct Left {
        _right: Arc<Right>,
    }
    struct Right {
        _left: Arc<Left>,
    }

    // Each factory waits once so both threads hold their own slot before
    // asking for the other one.
    let barrier = Arc::new(Barrier::new(2));
    let container = Container::new();
    let (left_gate, right_gate) = (barrier.clone(), barrier);
    let (left_fired, right_fired) = (Arc::new(AtomicBool::new(false)), Arc::new(AtomicBool::new(false)));
    let left_container = container.clone();
    let right_container = container.clone();
    container
        .register(BeanDefinition::builder::<Left>("left").factory(move |_| {
            if !left_fired.swap(true, Ordering::SeqCst) {
                left_gate.wait();
            }
            Ok(Left {
                _right: left_container.get_bean::<Right>()?,
            })
        }))
        .unwrap();
    container
        .register(BeanDefinition::builder::<Right>("right").factory(move |_| {
            if !right_fired.swap(true, Ordering::SeqCst) {
                right_gate.wait();
            }
            Ok(Right {
                _left: right_container.get_bean::<Left>()?,
            })
        }))
        .unwrap();
    container.seal().unwrap();

    let (tx, rx) = mpsc::channel();
    for side in 0..2 {
        let container = container.clone();
        let tx = tx.clone();
        thread::spawn(move || {
            let result = if side == 0 {
                container.get_bean::<Left>().map(|_| ())
            } else {
                container.get_bean::<Right>().map(|_| ())
            };
            tx.send(result).unwrap();
        });
    }
    drop(tx);

    for _ in 0..2 {
        let result = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("resolution deadlocked");
        match result {
            Err(DiError::Circular(path)) => {
                assert!(path.contains(&"left".to_string()));
                assert!(path.contains(&"right".to_string()));
            }
            other => panic!("Expected circular error, got {:?}", other),
        }
    }
    assert_eq!(container.singleton_count(), 0);
}
