//! # Observer Symmetry Properties
//!
//! For every non-pruning observer, applying a notification sequence in
//! Commit mode and replaying it in Rollback mode restores the composite
//! state exactly.

#[cfg(test)]
mod tests {
    use cc_02_aggregate_cache::{
        account_state_cache_with, block_statistic_cache, hash_lock_cache, CacheSummary,
        CompositeCache, CompositeCacheBuilder, HistoryCacheStorage, PlainCacheStorage,
    };
    use cc_03_observers::{
        BalanceChangeObserver, BalanceTransferObserver, BlockStatisticObserver, HashLockObserver,
        Notification, NotifyMode, ObserverPipeline,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::{AccountState, Address, BlockStatistic, Hash, HashLockInfo, Height};
    use std::sync::Arc;

    const ACCOUNTS: usize = 6;
    const INITIAL_BALANCE: u128 = 1_000_000;

    fn account(index: usize) -> Address {
        let mut address = [0u8; 20];
        address[0] = index as u8 + 1;
        address
    }

    fn build_composite() -> CompositeCache {
        let accounts: Vec<(Address, AccountState)> = (0..ACCOUNTS)
            .map(|index| (account(index), AccountState::new(INITIAL_BALANCE)))
            .collect();

        let mut builder = CompositeCacheBuilder::new();
        builder
            .add_sub_cache(
                Arc::new(account_state_cache_with(accounts)),
                Arc::new(PlainCacheStorage::<Address, AccountState>::new()),
            )
            .unwrap();
        builder
            .add_sub_cache(
                Arc::new(block_statistic_cache(1_000)),
                Arc::new(HistoryCacheStorage::<Height, BlockStatistic>::new()),
            )
            .unwrap();
        builder
            .add_sub_cache(
                Arc::new(hash_lock_cache()),
                Arc::new(HistoryCacheStorage::<Hash, HashLockInfo>::new()),
            )
            .unwrap();
        builder.build()
    }

    /// The non-pruning pipeline under test.
    fn build_pipeline() -> ObserverPipeline {
        let mut pipeline = ObserverPipeline::new();
        pipeline
            .register(Box::new(BalanceTransferObserver))
            .register(Box::new(BalanceChangeObserver))
            .register(Box::new(HashLockObserver))
            .register(Box::new(BlockStatisticObserver));
        pipeline
    }

    fn random_notifications(rng: &mut StdRng, height: Height) -> Vec<Notification> {
        let mut notifications = Vec::new();
        let mut created_locks: Vec<Hash> = Vec::new();

        for _ in 0..rng.gen_range(1..20) {
            let sender = account(rng.gen_range(0..ACCOUNTS));
            match rng.gen_range(0..4) {
                0 => {
                    let recipient = account(rng.gen_range(0..ACCOUNTS));
                    if recipient != sender {
                        notifications.push(Notification::BalanceTransfer {
                            sender,
                            recipient,
                            amount: rng.gen_range(1..1_000),
                        });
                    }
                }
                1 => notifications.push(Notification::BalanceCredit {
                    address: sender,
                    amount: rng.gen_range(1..1_000),
                }),
                2 => {
                    let hash: Hash = rng.gen();
                    created_locks.push(hash);
                    notifications.push(Notification::LockCreated {
                        hash,
                        owner: sender,
                        amount: rng.gen_range(1..1_000),
                        expiry_height: height + rng.gen_range(1..100),
                    });
                }
                _ => {
                    if let Some(hash) = created_locks.pop() {
                        notifications.push(Notification::LockCompleted {
                            hash,
                            beneficiary: sender,
                        });
                    }
                }
            }
        }

        notifications.push(Notification::BlockClosed {
            height,
            harvester: account(0),
            timestamp: height * 1_000,
            difficulty: rng.gen_range(50..150),
        });
        notifications
    }

    fn summaries(composite: &CompositeCache) -> Vec<(&'static str, CacheSummary)> {
        composite.create_view().summaries()
    }

    #[test]
    fn test_commit_then_rollback_restores_state_exactly() {
        let mut rng = StdRng::seed_from_u64(0x5E1F1);

        for round in 0..100u64 {
            let composite = build_composite();
            let pipeline = build_pipeline();
            let height = round + 1;
            let notifications = random_notifications(&mut rng, height);

            let before = summaries(&composite);

            let mut delta = composite.create_delta().unwrap();
            pipeline
                .notify_all(&notifications, &mut delta, height, NotifyMode::Commit)
                .unwrap();
            pipeline
                .notify_all(&notifications, &mut delta, height, NotifyMode::Rollback)
                .unwrap();
            composite.commit(delta, height).unwrap();

            assert_eq!(
                summaries(&composite),
                before,
                "round {round}: commit+rollback must be the identity"
            );
        }
    }

    #[test]
    fn test_committed_block_then_unwind_restores_state_exactly() {
        let mut rng = StdRng::seed_from_u64(0xF00D);

        for round in 0..50u64 {
            let composite = build_composite();
            let pipeline = build_pipeline();
            let height = round + 1;
            let notifications = random_notifications(&mut rng, height);

            let before = summaries(&composite);

            // commit the block for real
            let mut delta = composite.create_delta().unwrap();
            pipeline
                .notify_all(&notifications, &mut delta, height, NotifyMode::Commit)
                .unwrap();
            composite.commit(delta, height).unwrap();

            // then unwind it in a second transaction (reorg path)
            let mut delta = composite.create_delta().unwrap();
            pipeline
                .notify_all(&notifications, &mut delta, height, NotifyMode::Rollback)
                .unwrap();
            composite.commit(delta, height - 1).unwrap();

            assert_eq!(
                summaries(&composite),
                before,
                "round {round}: unwind must restore the pre-block state"
            );
        }
    }

    #[test]
    fn test_total_balance_is_conserved_by_transfers() {
        let mut rng = StdRng::seed_from_u64(0xBA1A);
        let composite = build_composite();
        let pipeline = build_pipeline();

        let mut delta = composite.create_delta().unwrap();
        for _ in 0..100 {
            let sender = account(rng.gen_range(0..ACCOUNTS));
            let recipient = account(rng.gen_range(0..ACCOUNTS));
            if sender == recipient {
                continue;
            }
            pipeline
                .notify(
                    &Notification::BalanceTransfer {
                        sender,
                        recipient,
                        amount: rng.gen_range(1..1_000),
                    },
                    &mut delta,
                    1,
                    NotifyMode::Commit,
                )
                .unwrap();
        }
        composite.commit(delta, 1).unwrap();

        let view = composite.create_view();
        let accounts = view
            .sub_cache::<cc_02_aggregate_cache::AccountStateCacheView>(
                cc_02_aggregate_cache::ACCOUNT_STATE_CACHE_NAME,
            )
            .unwrap();
        let total: u128 = accounts.iter().map(|(_, state)| state.balance).sum();
        assert_eq!(total, ACCOUNTS as u128 * INITIAL_BALANCE);
    }
}
