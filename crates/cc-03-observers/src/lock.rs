//! # Hash Lock Observer
//!
//! Lock creation debits the owner and registers the lock; lock completion
//! marks the lock used and pays the beneficiary. Both are self-inverse.

use crate::context::{NotifyMode, ObserverContext};
use crate::errors::ObserverError;
use crate::notifications::Notification;
use crate::observer::Observer;
use cc_02_aggregate_cache::{
    AccountStateCacheDelta, CacheError, HashLockInfoCacheDelta, ACCOUNT_STATE_CACHE_NAME,
    HASH_LOCK_CACHE_NAME,
};
use shared_types::{HashLockInfo, LockStatus};

/// Applies [`Notification::LockCreated`] and [`Notification::LockCompleted`]
/// to the hash lock and account state caches.
pub struct HashLockObserver;

impl Observer for HashLockObserver {
    fn name(&self) -> &str {
        "hash_lock"
    }

    fn notify(
        &self,
        notification: &Notification,
        context: &mut ObserverContext<'_>,
    ) -> Result<(), ObserverError> {
        match notification {
            Notification::LockCreated {
                hash,
                owner,
                amount,
                expiry_height,
            } => {
                let owner = context.resolvers.resolve_address(owner);
                let height = context.height;

                match context.mode {
                    NotifyMode::Commit => {
                        context
                            .delta
                            .sub_cache_mut::<AccountStateCacheDelta>(ACCOUNT_STATE_CACHE_NAME)?
                            .debit(&owner, *amount, height)?;
                        context
                            .delta
                            .sub_cache_mut::<HashLockInfoCacheDelta>(HASH_LOCK_CACHE_NAME)?
                            .add_lock(
                                *hash,
                                HashLockInfo {
                                    owner,
                                    amount: *amount,
                                    expiry_height: *expiry_height,
                                    status: LockStatus::Unused,
                                },
                            );
                    }
                    NotifyMode::Rollback => {
                        context
                            .delta
                            .sub_cache_mut::<HashLockInfoCacheDelta>(HASH_LOCK_CACHE_NAME)?
                            .remove_lock(hash);
                        context
                            .delta
                            .sub_cache_mut::<AccountStateCacheDelta>(ACCOUNT_STATE_CACHE_NAME)?
                            .credit(&owner, *amount, height);
                    }
                }
                Ok(())
            }
            Notification::LockCompleted { hash, beneficiary } => {
                let beneficiary = context.resolvers.resolve_address(beneficiary);
                let height = context.height;

                let locks = context
                    .delta
                    .sub_cache_mut::<HashLockInfoCacheDelta>(HASH_LOCK_CACHE_NAME)?;
                let amount = locks
                    .most_recent(hash)
                    .map(|lock| lock.amount)
                    .ok_or(CacheError::LockNotFound { hash: *hash })?;

                match context.mode {
                    NotifyMode::Commit => {
                        locks.complete_lock(hash)?;
                        context
                            .delta
                            .sub_cache_mut::<AccountStateCacheDelta>(ACCOUNT_STATE_CACHE_NAME)?
                            .credit(&beneficiary, amount, height);
                    }
                    NotifyMode::Rollback => {
                        locks.reopen_lock(hash)?;
                        context
                            .delta
                            .sub_cache_mut::<AccountStateCacheDelta>(ACCOUNT_STATE_CACHE_NAME)?
                            .debit(&beneficiary, amount, height)?;
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
