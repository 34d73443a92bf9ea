//! # Dispatcher Ordering and Backpressure Properties
//!
//! Completion order equals admission order for all interleavings, and
//! capacity is enforced under both full-queue policies.

#[cfg(test)]
mod tests {
    use cc_04_dispatcher::{
        ConsumerChain, ConsumerResult, Dispatcher, DispatcherConfig, DispatcherElement,
        DispatcherError, ElementInput, FullQueuePolicy, FunctionalConsumer, NullMetricsSink,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn empty_input() -> ElementInput {
        ElementInput::Transactions(vec![])
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_completion_order_equals_admission_order() {
        let mut rng = StdRng::seed_from_u64(0x0FD3);
        let delays: Vec<u64> = (0..24).map(|_| rng.gen_range(0..15)).collect();

        let completed: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let completed_inner = completed.clone();
        let delays_inner = delays.clone();

        let chain = ConsumerChain::new().add_stage(Box::new(FunctionalConsumer::new(
            "random_latency",
            move |element: &mut DispatcherElement| {
                let delay = delays_inner[(element.id as usize - 1) % delays_inner.len()];
                std::thread::sleep(Duration::from_millis(delay));
                completed_inner.lock().unwrap().push(element.id);
                ConsumerResult::Continue
            },
        )));

        let dispatcher = Dispatcher::spawn(
            DispatcherConfig::new("ordering").with_capacity(64),
            chain,
            Arc::new(NullMetricsSink),
        );

        let handles: Vec<_> = (0..24)
            .map(|_| dispatcher.submit(empty_input()).unwrap())
            .collect();
        for handle in handles {
            assert!(handle.verdict().await.unwrap().is_success());
        }

        let order = completed.lock().unwrap().clone();
        assert_eq!(order, (1..=24).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_capacity_plus_one_is_rejected_then_readmitted() {
        // capacity 2, ReturnError: the 3rd submission is rejected; after
        // draining one element a 4th is admitted
        let dispatcher = Dispatcher::spawn(
            DispatcherConfig::new("backpressure").with_capacity(2),
            ConsumerChain::new(),
            Arc::new(NullMetricsSink),
        );

        let first = dispatcher.submit(empty_input()).unwrap();
        let _second = dispatcher.submit(empty_input()).unwrap();

        assert!(matches!(
            dispatcher.submit(empty_input()),
            Err(DispatcherError::AdmissionRejected { capacity: 2, .. })
        ));

        assert!(first.verdict().await.unwrap().is_success());
        assert!(dispatcher.submit(empty_input()).is_ok());
    }

    #[tokio::test]
    async fn test_fail_fast_raises_before_admission() {
        let admitted = Arc::new(AtomicU64::new(0));
        let admitted_inner = admitted.clone();

        let chain = ConsumerChain::new().add_stage(Box::new(FunctionalConsumer::new(
            "count",
            move |_element: &mut DispatcherElement| {
                admitted_inner.fetch_add(1, Ordering::SeqCst);
                ConsumerResult::Continue
            },
        )));

        let dispatcher = Dispatcher::spawn(
            DispatcherConfig::new("fail_fast")
                .with_capacity(2)
                .with_full_queue_policy(FullQueuePolicy::FailFast),
            chain,
            Arc::new(NullMetricsSink),
        );

        let handles = vec![
            dispatcher.submit(empty_input()).unwrap(),
            dispatcher.submit(empty_input()).unwrap(),
        ];
        assert!(matches!(
            dispatcher.submit(empty_input()),
            Err(DispatcherError::AdmissionFatal { capacity: 2, .. })
        ));

        for handle in handles {
            handle.verdict().await.unwrap();
        }
        // the rejected element was never admitted
        assert_eq!(admitted.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_verdicts_are_delivered_exactly_once_per_element() {
        let dispatcher = Arc::new(Dispatcher::spawn(
            DispatcherConfig::new("exactly_once").with_capacity(128),
            ConsumerChain::new(),
            Arc::new(NullMetricsSink),
        ));

        let mut joins = Vec::new();
        for _ in 0..4 {
            let dispatcher = dispatcher.clone();
            joins.push(tokio::spawn(async move {
                let mut delivered = 0usize;
                for _ in 0..25 {
                    let handle = loop {
                        match dispatcher.submit(ElementInput::Transactions(vec![])) {
                            Ok(handle) => break handle,
                            Err(DispatcherError::AdmissionRejected { .. }) => {
                                tokio::time::sleep(Duration::from_millis(1)).await;
                            }
                            Err(other) => panic!("unexpected submit error: {other}"),
                        }
                    };
                    assert!(handle.verdict().await.unwrap().is_success());
                    delivered += 1;
                }
                delivered
            }));
        }

        let mut total = 0usize;
        for join in joins {
            total += join.await.unwrap();
        }
        assert_eq!(total, 100);
        assert_eq!(dispatcher.occupancy(), 0);
    }
}
