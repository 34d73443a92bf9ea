//! # Sub-Cache Traits
//!
//! Object-safe handles over heterogeneous delta-set containers, so the
//! composite cache can open, commit, and roll back every member uniformly
//! while observers recover the concrete cache types by downcast.

use crate::errors::CacheError;
use crate::summary::CacheSummary;
use cc_01_delta_set::DeltaStats;
use shared_types::Height;
use std::any::Any;

/// A named, independently-versioned member of the composite cache.
pub trait SubCache: Send + Sync {
    /// Unique name this cache is registered under.
    fn name(&self) -> &'static str;

    /// Opens a delta on this cache.
    ///
    /// # Errors
    ///
    /// `CacheError::Delta(ConcurrencyViolation)` if a delta is outstanding.
    fn create_delta(&self) -> Result<Box<dyn SubCacheDelta>, CacheError>;

    /// Takes a read-only snapshot of the committed baseline.
    fn create_view(&self) -> Box<dyn SubCacheView>;

    /// Commits `delta` back into this cache.
    ///
    /// # Errors
    ///
    /// `CacheError::TypeMismatch` if `delta` was not created by this cache.
    fn commit(&self, delta: Box<dyn SubCacheDelta>) -> Result<(), CacheError>;
}

/// Writer-exclusive transactional handle of one sub-cache.
pub trait SubCacheDelta: Send {
    /// Concrete-type access for observers and validators.
    fn as_any(&self) -> &dyn Any;

    /// Mutable concrete-type access.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Consumes the boxed handle for the commit downcast.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Counts of pending mutations.
    fn stats(&self) -> DeltaStats;

    /// Evicts entries whose validity window expired relative to `height`.
    ///
    /// Returns the number of evicted records. The default is a no-op;
    /// history-keyed caches override it with their prune policy.
    fn prune(&mut self, height: Height) -> usize {
        let _ = height;
        0
    }
}

/// Read-only snapshot handle of one sub-cache.
pub trait SubCacheView: Send {
    /// Concrete-type access for readers.
    fn as_any(&self) -> &dyn Any;

    /// Number of committed records.
    fn len(&self) -> usize;

    /// True if the snapshot holds no records.
    fn is_empty(&self) -> bool {
        0 == self.len()
    }

    /// Summary projection over the snapshot, used at checkpoint boundaries.
    fn summarize(&self) -> CacheSummary;
}

/// Downcasts a delta handle to its concrete cache delta type.
pub(crate) fn downcast_delta<'a, T: 'static>(
    name: &str,
    delta: &'a mut dyn SubCacheDelta,
) -> Result<&'a mut T, CacheError> {
    delta
        .as_any_mut()
        .downcast_mut::<T>()
        .ok_or_else(|| CacheError::TypeMismatch {
            name: name.to_string(),
        })
}

/// Downcasts a view handle to its concrete cache view type.
pub(crate) fn downcast_view<'a, T: 'static>(
    name: &str,
    view: &'a dyn SubCacheView,
) -> Result<&'a T, CacheError> {
    view.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| CacheError::TypeMismatch {
            name: name.to_string(),
        })
}
