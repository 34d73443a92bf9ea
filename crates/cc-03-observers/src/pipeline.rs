//! # Observer Pipeline
//!
//! Runs registered observers over a notification sequence. Commit mode
//! walks notifications and observers in registration order; Rollback mode
//! walks both in reverse, the standard undo discipline. The ordering policy
//! is pluggable per pipeline; the hard invariant is symmetry, not a fixed
//! order.

use crate::context::{NotifyMode, ObserverContext, Resolvers};
use crate::errors::ObserverError;
use crate::notifications::Notification;
use crate::observer::Observer;
use cc_02_aggregate_cache::CompositeDelta;
use shared_types::Height;
use tracing::{debug, warn};

/// Observer execution order relative to the notify mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingPolicy {
    /// Registration order on Commit, reverse order on Rollback.
    ReverseOnRollback,
    /// Registration order in both modes.
    FixedRegistrationOrder,
}

/// An ordered chain of observers.
pub struct ObserverPipeline {
    observers: Vec<Box<dyn Observer>>,
    policy: OrderingPolicy,
    resolvers: Resolvers,
}

impl ObserverPipeline {
    /// Creates an empty pipeline with the standard undo ordering.
    pub fn new() -> Self {
        Self::with_policy(OrderingPolicy::ReverseOnRollback)
    }

    /// Creates an empty pipeline with an explicit ordering policy.
    pub fn with_policy(policy: OrderingPolicy) -> Self {
        Self {
            observers: Vec::new(),
            policy,
            resolvers: Resolvers::new(),
        }
    }

    /// Appends `observer` to the chain.
    pub fn register(&mut self, observer: Box<dyn Observer>) -> &mut Self {
        debug!(observer = observer.name(), "Observer registered");
        self.observers.push(observer);
        self
    }

    /// Replaces the alias resolvers handed to observers.
    pub fn set_resolvers(&mut self, resolvers: Resolvers) -> &mut Self {
        self.resolvers = resolvers;
        self
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// True if no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Runs the chain over one notification.
    pub fn notify(
        &self,
        notification: &Notification,
        delta: &mut CompositeDelta,
        height: Height,
        mode: NotifyMode,
    ) -> Result<(), ObserverError> {
        let reversed =
            NotifyMode::Rollback == mode && OrderingPolicy::ReverseOnRollback == self.policy;

        let mut run = |observer: &dyn Observer| -> Result<(), ObserverError> {
            let mut context = ObserverContext::new(delta, height, mode, &self.resolvers);
            observer.notify(notification, &mut context).map_err(|error| {
                warn!(
                    observer = observer.name(),
                    notification = notification.name(),
                    height,
                    %error,
                    "Observer rejected notification"
                );
                error
            })
        };

        if reversed {
            for observer in self.observers.iter().rev() {
                run(observer.as_ref())?;
            }
        } else {
            for observer in &self.observers {
                run(observer.as_ref())?;
            }
        }
        Ok(())
    }

    /// Runs the chain over a notification sequence.
    ///
    /// Commit mode walks the sequence forward; Rollback mode walks it in
    /// reverse so effects are undone in the opposite order they were made.
    pub fn notify_all(
        &self,
        notifications: &[Notification],
        delta: &mut CompositeDelta,
        height: Height,
        mode: NotifyMode,
    ) -> Result<(), ObserverError> {
        match mode {
            NotifyMode::Commit => {
                for notification in notifications {
                    self.notify(notification, delta, height, mode)?;
                }
            }
            NotifyMode::Rollback => {
                for notification in notifications.iter().rev() {
                    self.notify(notification, delta, height, mode)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for ObserverPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::FunctionalObserver;
    use cc_02_aggregate_cache::{
        account_state_cache, CompositeCache, CompositeCacheBuilder, PlainCacheStorage,
    };
    use shared_types::{AccountState, Address};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn composite() -> CompositeCache {
        let mut builder = CompositeCacheBuilder::new();
        builder
            .add_sub_cache(
                Arc::new(account_state_cache()),
                Arc::new(PlainCacheStorage::<Address, AccountState>::new()),
            )
            .unwrap();
        builder.build()
    }

    fn tracing_observer(name: &'static str, order: Arc<Mutex<Vec<String>>>) -> Box<dyn Observer> {
        Box::new(FunctionalObserver::new(name, move |_n: &Notification, context: &mut ObserverContext<'_>| {
            let suffix = match context.mode {
                NotifyMode::Commit => "commit",
                NotifyMode::Rollback => "rollback",
            };
            order.lock().unwrap().push(format!("{name}:{suffix}"));
            Ok(())
        }))
    }

    fn block_closed() -> Notification {
        Notification::BlockClosed {
            height: 1,
            harvester: [9; 20],
            timestamp: 0,
            difficulty: 1,
        }
    }

    #[test]
    fn test_commit_runs_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ObserverPipeline::new();
        pipeline.register(tracing_observer("first", order.clone()));
        pipeline.register(tracing_observer("second", order.clone()));

        let composite = composite();
        let mut delta = composite.create_delta().unwrap();
        pipeline
            .notify(&block_closed(), &mut delta, 1, NotifyMode::Commit)
            .unwrap();
        composite.rollback(delta);

        assert_eq!(
            *order.lock().unwrap(),
            vec!["first:commit", "second:commit"]
        );
    }

    #[test]
    fn test_rollback_runs_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ObserverPipeline::new();
        pipeline.register(tracing_observer("first", order.clone()));
        pipeline.register(tracing_observer("second", order.clone()));

        let composite = composite();
        let mut delta = composite.create_delta().unwrap();
        pipeline
            .notify(&block_closed(), &mut delta, 1, NotifyMode::Rollback)
            .unwrap();
        composite.rollback(delta);

        assert_eq!(
            *order.lock().unwrap(),
            vec!["second:rollback", "first:rollback"]
        );
    }

    #[test]
    fn test_fixed_policy_keeps_registration_order_on_rollback() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ObserverPipeline::with_policy(OrderingPolicy::FixedRegistrationOrder);
        pipeline.register(tracing_observer("first", order.clone()));
        pipeline.register(tracing_observer("second", order.clone()));

        let composite = composite();
        let mut delta = composite.create_delta().unwrap();
        pipeline
            .notify(&block_closed(), &mut delta, 1, NotifyMode::Rollback)
            .unwrap();
        composite.rollback(delta);

        assert_eq!(
            *order.lock().unwrap(),
            vec!["first:rollback", "second:rollback"]
        );
    }

    #[test]
    fn test_notify_all_reverses_notifications_on_rollback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_inner = seen.clone();
        let mut pipeline = ObserverPipeline::new();
        pipeline.register(Box::new(FunctionalObserver::new(
            "recorder",
            move |notification: &Notification, _context: &mut ObserverContext<'_>| {
                seen_inner.lock().unwrap().push(notification.name());
                Ok(())
            },
        )));

        let notifications = vec![
            Notification::BalanceCredit {
                address: [1; 20],
                amount: 1,
            },
            block_closed(),
        ];

        let composite = composite();
        let mut delta = composite.create_delta().unwrap();
        pipeline
            .notify_all(&notifications, &mut delta, 1, NotifyMode::Rollback)
            .unwrap();
        composite.rollback(delta);

        assert_eq!(*seen.lock().unwrap(), vec!["block_closed", "balance_credit"]);
    }

    #[test]
    fn test_failure_short_circuits_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_inner = calls.clone();

        let mut pipeline = ObserverPipeline::new();
        pipeline.register(Box::new(FunctionalObserver::new(
            "rejecting",
            |_n: &Notification, _c: &mut ObserverContext<'_>| {
                Err(ObserverError::Rejected("invalid".into()))
            },
        )));
        pipeline.register(Box::new(FunctionalObserver::new(
            "counting",
            move |_n: &Notification, _c: &mut ObserverContext<'_>| {
                calls_inner.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )));

        let composite = composite();
        let mut delta = composite.create_delta().unwrap();
        let result = pipeline.notify(&block_closed(), &mut delta, 1, NotifyMode::Commit);
        composite.rollback(delta);

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
