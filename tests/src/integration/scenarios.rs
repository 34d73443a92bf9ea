//! # End-to-End Scenarios
//!
//! Walkthroughs exercised through the composite cache and the wired node
//! runtime together.

#[cfg(test)]
mod tests {
    use cc_02_aggregate_cache::{
        account_state_cache, AccountStateCacheDelta, AccountStateCacheView, CompositeCache,
        CompositeCacheBuilder, PlainCacheStorage, ACCOUNT_STATE_CACHE_NAME,
    };
    use cc_04_dispatcher::Verdict;
    use node_runtime::{build_node, NodeConfig, RandomSource, WorkloadGenerator};
    use shared_types::{AccountState, Address};
    use std::sync::Arc;

    const A: Address = [0xA0; 20];
    const B: Address = [0xB0; 20];

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

    #[test]
    fn test_scenario_insert_commit_remove_commit() {
        // insert {A:1, B:2} into a delta, commit; open a new delta, remove
        // A, commit; a fresh view shows {B:2} and contains(A) == false
        let composite = composite();

        let mut delta = composite.create_delta().unwrap();
        {
            let accounts = delta
                .sub_cache_mut::<AccountStateCacheDelta>(ACCOUNT_STATE_CACHE_NAME)
                .unwrap();
            accounts.insert(A, AccountState::new(1));
            accounts.insert(B, AccountState::new(2));
        }
        composite.commit(delta, 1).unwrap();

        let mut delta = composite.create_delta().unwrap();
        delta
            .sub_cache_mut::<AccountStateCacheDelta>(ACCOUNT_STATE_CACHE_NAME)
            .unwrap()
            .remove(&A);
        composite.commit(delta, 2).unwrap();

        let view = composite.create_view();
        let accounts = view
            .sub_cache::<AccountStateCacheView>(ACCOUNT_STATE_CACHE_NAME)
            .unwrap();
        assert!(!accounts.contains(&A));
        assert_eq!(accounts.get(&B).unwrap().balance, 2);
        assert_eq!(accounts.iter().count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_node_processes_a_seeded_chain() {
        let config = NodeConfig {
            dispatcher_capacity: 16,
            prune_interval: 4,
            statistic_retention: 8,
            ..NodeConfig::default()
        };
        let node = Arc::new(build_node(config).unwrap());
        let mut workload = WorkloadGenerator::new(RandomSource::from_seed(99), 6);
        node.seed_genesis(workload.genesis_balances(1_000_000))
            .unwrap();

        for expected_height in 1..=10u64 {
            let block = workload.next_block(3);
            let verdict = node
                .submit_blocks(vec![block])
                .unwrap()
                .verdict()
                .await
                .unwrap();
            assert_eq!(verdict, Verdict::Success);
            assert_eq!(node.cache.height(), expected_height);
        }

        // total balance conserved: transfers and fees move value between
        // accounts of the same closed set
        let view = node.view();
        let accounts = view
            .sub_cache::<AccountStateCacheView>(ACCOUNT_STATE_CACHE_NAME)
            .unwrap();
        let total: u128 = accounts.iter().map(|(_, state)| state.balance).sum();
        assert_eq!(total, 6 * 1_000_000);

        node.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_multi_block_range_is_atomic_per_block() {
        let node = Arc::new(build_node(NodeConfig::default()).unwrap());
        let mut workload = WorkloadGenerator::new(RandomSource::from_seed(7), 4);
        node.seed_genesis(workload.genesis_balances(1_000_000))
            .unwrap();

        let range: Vec<_> = (0..4).map(|_| workload.next_block(2)).collect();
        let verdict = node
            .submit_blocks(range)
            .unwrap()
            .verdict()
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Success);
        assert_eq!(node.cache.height(), 4);

        node.shutdown().await;
    }
}
