//! Init and destroy sequencing.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{DestructionError, DiError, DiResult};
use crate::instance::{InstanceRecord, InstanceState};
use crate::observer::Observers;

/// Order in which the instances of one store reached `Initialized`.
#[derive(Default)]
pub(crate) struct CreationLog {
    records: Mutex<Vec<Arc<InstanceRecord>>>,
}

impl CreationLog {
    pub(crate) fn push(&self, record: Arc<InstanceRecord>) {
        self.records.lock().push(record);
    }

    /// Empties the log, returning records in creation order.
    pub(crate) fn take(&self) -> Vec<Arc<InstanceRecord>> {
        std::mem::take(&mut *self.records.lock())
    }
}

/// Runs the init hook of a freshly built instance and marks it `Initialized`.
///
/// Called once per instance, after all its direct dependencies are
/// initialized, so graphs initialize bottom-up.
pub(crate) fn run_init(record: &InstanceRecord) -> DiResult<()> {
    if let Some(hook) = &record.definition.init_hook {
        debug!(id = record.id(), hook = %hook.name, "running init hook");
        (hook.run)(&record.instance).map_err(|e| DiError::Initialization {
            id: record.id().to_string(),
            hook: hook.name.clone(),
            message: e.to_string(),
        })?;
    }
    record.advance(InstanceState::Initialized);
    Ok(())
}

/// Destroys `records` in exact reverse of their order.
///
/// Never stops early: a failing hook is recorded and teardown continues.
pub(crate) fn run_destroy_all(
    records: Vec<Arc<InstanceRecord>>,
    observers: &Observers,
) -> Vec<DestructionError> {
    let mut errors = Vec::new();

    for record in records.into_iter().rev() {
        if record.state() == InstanceState::Destroyed {
            continue;
        }
        if let Some(hook) = &record.definition.destroy_hook {
            debug!(id = record.id(), hook = %hook.name, "running destroy hook");
            if let Err(e) = (hook.run)(&record.instance) {
                warn!(id = record.id(), hook = %hook.name, error = %e, "destroy hook failed");
                errors.push(DestructionError {
                    id: record.id().to_string(),
                    hook: hook.name.clone(),
                    message: e.to_string(),
                });
            }
        }
        record.advance(InstanceState::Destroyed);
        observers.bean_destroyed(record.id());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::BeanDefinition;

    struct Noisy {
        name: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    fn record(
        name: &'static str,
        order: &Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    ) -> Arc<InstanceRecord> {
        let definition = BeanDefinition::builder::<Noisy>(name)
            .destroy_hook("close", move |bean: &Noisy| {
                bean.order.lock().push(bean.name);
                if fail {
                    Err("close failed".into())
                } else {
                    Ok(())
                }
            })
            .factory(|_| Err("unused".into()));
        let instance = Arc::new(Noisy {
            name,
            order: order.clone(),
        });
        let record = Arc::new(InstanceRecord::new(Arc::new(definition), instance));
        run_init(&record).unwrap();
        record
    }

    #[test]
    fn test_destroy_runs_in_reverse_and_continues_after_failure() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let log = CreationLog::default();
        log.push(record("first", &order, false));
        log.push(record("second", &order, true));
        log.push(record("third", &order, false));

        let records = log.take();
        assert!(log.take().is_empty());

        let errors = run_destroy_all(records.clone(), &Observers::new());

        assert_eq!(*order.lock(), vec!["third", "second", "first"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].id, "second");
        assert_eq!(errors[0].hook, "close");
        assert!(records.iter().all(|r| r.state() == InstanceState::Destroyed));
    }

    #[test]
    fn test_destroy_skips_already_destroyed() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let only = record("only", &order, false);

        run_destroy_all(vec![only.clone()], &Observers::new());
        run_destroy_all(vec![only], &Observers::new());

        assert_eq!(*order.lock(), vec!["only"]);
    }

    #[test]
    fn test_init_failure_is_reported() {
        struct Flaky;
        let definition = BeanDefinition::builder::<Flaky>("flaky")
            .init_hook("connect", |_| Err("refused".into()))
            .factory(|_| Ok(Flaky));
        let record = InstanceRecord::new(Arc::new(definition), Arc::new(Flaky));

        let err = run_init(&record).unwrap_err();
        assert_eq!(
            err,
            DiError::Initialization {
                id: "flaky".to_string(),
                hook: "connect".to_string(),
                message: "refused".to_string(),
            }
        );
        assert_eq!(record.state(), InstanceState::Created);
    }
}
