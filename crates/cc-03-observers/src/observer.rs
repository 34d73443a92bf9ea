//! # Observer Trait
//!
//! An observer is a pure function of `(notification, context)`. Observers
//! receive every notification and ignore the variants they do not handle.

use crate::context::ObserverContext;
use crate::errors::ObserverError;
use crate::notifications::Notification;

/// A pure function invoked once per notification.
pub trait Observer: Send + Sync {
    /// Observer name, for logs and abort reasons.
    fn name(&self) -> &str;

    /// Applies (or undoes, per the context mode) one notification.
    fn notify(
        &self,
        notification: &Notification,
        context: &mut ObserverContext<'_>,
    ) -> Result<(), ObserverError>;
}

/// Adapter wrapping a closure as an [`Observer`].
pub struct FunctionalObserver<F> {
    name: String,
    handler: F,
}

impl<F> FunctionalObserver<F>
where
    F: Fn(&Notification, &mut ObserverContext<'_>) -> Result<(), ObserverError> + Send + Sync,
{
    /// Wraps `handler` under `name`.
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> Observer for FunctionalObserver<F>
where
    F: Fn(&Notification, &mut ObserverContext<'_>) -> Result<(), ObserverError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn notify(
        &self,
        notification: &Notification,
        context: &mut ObserverContext<'_>,
    ) -> Result<(), ObserverError> {
        (self.handler)(notification, context)
    }
}
