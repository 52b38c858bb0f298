use beanpod::sample::{register_app, NetworkClient, NETWORK_URL};
use beanpod::{BeanDefinition, BoxError, Container, DestructionError, DiError, InstanceState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

type Journal = Arc<Mutex<Vec<String>>>;

struct Database;
struct Repository {
    _db: Arc<Database>,
}
struct Service {
    _repository: Arc<Repository>,
}

fn note(journal: &Journal, event: &'static str) -> impl Fn() -> Result<(), BoxError> + Send + Sync + 'static {
    let journal = journal.clone();
    move || {
        journal.lock().unwrap().push(event.to_string());
        Ok(())
    }
}

fn layered(journal: &Journal) -> Container {
    let container = Container::new();
    let (init, close) = (note(journal, "init db"), note(journal, "close db"));
    container
        .register(
            BeanDefinition::builder::<Database>("db")
                .init_hook("open", move |_: &Database| init())
                .destroy_hook("close", move |_: &Database| close())
                .factory(|_| Ok(Database)),
        )
        .unwrap();
    let (init, close) = (note(journal, "init repository"), note(journal, "close repository"));
    container
        .register(
            BeanDefinition::builder::<Repository>("repository")
                .depends_on::<Database>()
                .init_hook("init", move |_: &Repository| init())
                .destroy_hook("close", move |_: &Repository| close())
                .factory(|deps| Ok(Repository { _db: deps.bean::<Database>(0)? })),
        )
        .unwrap();
    let (init, close) = (note(journal, "init service"), note(journal, "close service"));
    container
        .register(
            BeanDefinition::builder::<Service>("service")
                .depends_on::<Repository>()
                .init_hook("init", move |_: &Service| init())
                .destroy_hook("close", move |_: &Service| close())
                .factory(|deps| Ok(Service { _repository: deps.bean::<Repository>(0)? })),
        )
        .unwrap();
    container.seal().unwrap();
    container
}

#[test]
fn test_init_bottom_up_destroy_reverse() {
    let journal = Journal::default();
    let container = layered(&journal);

    container.get_bean::<Service>().unwrap();
    assert!(container.shutdown().is_empty());

    assert_eq!(
        *journal.lock().unwrap(),
        vec![
            "init db",
            "init repository",
            "init service",
            "close service",
            "close repository",
            "close db"
        ]
    );
}

#[test]
fn test_shutdown_is_final_and_idempotent() {
    let journal = Journal::default();
    let container = layered(&journal);
    container.pre_instantiate_singletons().unwrap();

    assert!(container.shutdown().is_empty());
    assert!(container.shutdown().is_empty());
    assert!(container.is_shut_down());
    assert_eq!(container.singleton_count(), 0);
    assert_eq!(container.get_bean::<Service>().err(), Some(DiError::ShutDown));
    assert_eq!(container.begin_scope("request", "r1").err(), Some(DiError::ShutDown));
    // Each destroy hook ran exactly once
    let closes = journal.lock().unwrap().iter().filter(|e| e.starts_with("close")).count();
    assert_eq!(closes, 3);
}

#[test]
fn test_destroy_failures_are_collected() {
    struct Flaky(&'static str);

    let closed = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    for (id, fails) in [("first", true), ("second", false), ("third", true)] {
        let closed = closed.clone();
        container
            .register(
                BeanDefinition::builder::<Flaky>(id)
                    .destroy_hook("close", move |bean: &Flaky| {
                        closed.fetch_add(1, Ordering::SeqCst);
                        if fails {
                            Err(format!("{} refused to close", bean.0).into())
                        } else {
                            Ok(())
                        }
                    })
                    .factory(move |_| Ok(Flaky(id))),
            )
            .unwrap();
    }
    container.seal().unwrap();
    container.pre_instantiate_singletons().unwrap();

    let errors = container.shutdown();
    assert_eq!(closed.load(Ordering::SeqCst), 3);
    assert_eq!(
        errors,
        vec![
            DestructionError {
                id: "third".to_string(),
                hook: "close".to_string(),
                message: "third refused to close".to_string()
            },
            DestructionError {
                id: "first".to_string(),
                hook: "close".to_string(),
                message: "first refused to close".to_string()
            },
        ]
    );
}

#[test]
fn test_failed_init_is_not_cached() {
    struct Flaky;

    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let container = Container::new();
    container
        .register(
            BeanDefinition::builder::<Flaky>("flaky")
                .init_hook("warm_up", move |_: &Flaky| {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err("cold start".into())
                    } else {
                        Ok(())
                    }
                })
                .factory(|_| Ok(Flaky)),
        )
        .unwrap();
    container.seal().unwrap();

    assert_eq!(
        container.get_bean::<Flaky>().err(),
        Some(DiError::Initialization {
            id: "flaky".to_string(),
            hook: "warm_up".to_string(),
            message: "cold start".to_string()
        })
    );
    assert_eq!(container.singleton_state("flaky"), None);

    container.get_bean::<Flaky>().unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(container.singleton_state("flaky"), Some(InstanceState::Initialized));
}

#[test]
fn test_contextual_destroyed_at_scope_end() {
    let journal = Journal::default();
    struct Session;

    let container = Container::new();
    let close = note(&journal, "close session");
    container
        .register(
            BeanDefinition::builder::<Session>("session")
                .contextual("session")
                .destroy_hook("close", move |_: &Session| close())
                .factory(|_| Ok(Session)),
        )
        .unwrap();
    container.seal().unwrap();

    container.begin_scope("session", "s1").unwrap();
    container.get_bean::<Session>().unwrap();
    assert!(journal.lock().unwrap().is_empty());
    assert!(container.end_scope("session", "s1").unwrap().is_empty());
    assert_eq!(*journal.lock().unwrap(), vec!["close session"]);

    // Ending the container also ends contexts that are still open
    container.begin_scope("session", "s2").unwrap();
    container.get_bean::<Session>().unwrap();
    container.shutdown();
    assert_eq!(journal.lock().unwrap().len(), 2);
}

#[test]
fn test_prototype_destroy_hook_never_runs() {
    let journal = Journal::default();
    struct Temp;

    let container = Container::new();
    let close = note(&journal, "close temp");
    container
        .register(
            BeanDefinition::builder::<Temp>("temp")
                .prototype()
                .destroy_hook("close", move |_: &Temp| close())
                .factory(|_| Ok(Temp)),
        )
        .unwrap();
    container.seal().unwrap();

    container.get_bean::<Temp>().unwrap();
    container.get_bean::<Temp>().unwrap();
    container.shutdown();
    assert!(journal.lock().unwrap().is_empty());
}

#[test]
fn test_network_client_hooks() {
    let container = Container::new();
    register_app(&container).unwrap();
    container.seal().unwrap();

    let client = container.get_bean::<NetworkClient>().unwrap();
    assert_eq!(
        client.events(),
        vec![
            format!("connect: {}", NETWORK_URL),
            format!("call: {} message = initial connection message", NETWORK_URL),
        ]
    );

    container.shutdown();
    assert_eq!(client.events().last().cloned(), Some(format!("close: {}", NETWORK_URL)));
}

#[test]
fn test_network_client_without_url_fails_init() {
    let container = Container::new();
    container
        .register(
            BeanDefinition::builder::<NetworkClient>("networkClient")
                .init_hook("init", NetworkClient::init)
                .factory(|_| Ok(NetworkClient::new(""))),
        )
        .unwrap();
    container.seal().unwrap();

    assert!(matches!(
        container.get_bean::<NetworkClient>(),
        Err(DiError::Initialization { ref hook, .. }) if hook == "init"
    ));
}

#[test]
fn test_singleton_finished_after_shutdown_is_destroyed() {
    struct Slow;

    let started = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let closes = Arc::new(AtomicUsize::new(0));

    let container = Container::new();
    let (factory_started, factory_release) = (started.clone(), release.clone());
    let counter = closes.clone();
    container
        .register(
            BeanDefinition::builder::<Slow>("slow")
                .destroy_hook("close", move |_: &Slow| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .factory(move |_| {
                    factory_started.wait();
                    factory_release.wait();
                    Ok(Slow)
                }),
        )
        .unwrap();
    container.seal().unwrap();

    let worker = {
        let container = container.clone();
        thread::spawn(move || container.get_bean::<Slow>().map(|_| ()))
    };

    started.wait();
    assert!(container.shutdown().is_empty());
    release.wait();

    assert_eq!(worker.join().unwrap(), Err(DiError::ShutDown));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(container.singleton_count(), 0);
    assert_eq!(container.singleton_state("slow"), None);
}
