//! # Delta-Set Properties
//!
//! Commit/rollback identity over randomized operation sequences, and
//! single-writer enforcement.

#[cfg(test)]
mod tests {
    use cc_01_delta_set::{BaseSet, DeltaError};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    fn materialize(set: &BaseSet<u32, u64>) -> Vec<(u32, u64)> {
        set.snapshot().iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn seeded_set(rng: &mut StdRng) -> BaseSet<u32, u64> {
        let entries: Vec<(u32, u64)> = (0..rng.gen_range(0..40))
            .map(|_| (rng.gen_range(0..64), rng.gen()))
            .collect();
        BaseSet::from_entries(entries)
    }

    /// Mirrors a random operation into the delta and a reference model.
    fn apply_random_op(
        rng: &mut StdRng,
        delta: &mut cc_01_delta_set::SetDelta<u32, u64>,
        model: &mut BTreeMap<u32, u64>,
    ) {
        let key = rng.gen_range(0..64);
        match rng.gen_range(0..3) {
            0 => {
                let value = rng.gen();
                delta.insert(key, value);
                model.insert(key, value);
            }
            1 => {
                delta.remove(&key);
                model.remove(&key);
            }
            _ => {
                if let Some(value) = delta.get_mut(&key) {
                    *value = value.wrapping_add(1);
                }
                if let Some(value) = model.get_mut(&key) {
                    *value = value.wrapping_add(1);
                }
            }
        }
    }

    #[test]
    fn test_rollback_identity_over_random_sequences() {
        let mut rng = StdRng::seed_from_u64(0xD317A);

        for _round in 0..200 {
            let set = seeded_set(&mut rng);
            let before = materialize(&set);

            let mut delta = set.create_delta().unwrap();
            let mut model = BTreeMap::new();
            for _ in 0..rng.gen_range(1..50) {
                apply_random_op(&mut rng, &mut delta, &mut model);
            }
            set.rollback(delta);

            assert_eq!(materialize(&set), before, "rollback must be a no-op");
        }
    }

    #[test]
    fn test_commit_applies_exactly_the_mutations() {
        let mut rng = StdRng::seed_from_u64(0xC0117);

        for _round in 0..200 {
            let mut set = seeded_set(&mut rng);
            let mut model: BTreeMap<u32, u64> =
                set.snapshot().iter().map(|(k, v)| (*k, *v)).collect();

            let mut delta = set.create_delta().unwrap();
            for _ in 0..rng.gen_range(1..50) {
                apply_random_op(&mut rng, &mut delta, &mut model);
            }

            // the delta's effective state equals the model before commit
            let effective: Vec<(u32, u64)> = {
                let mut entries: Vec<(u32, u64)> =
                    delta.iter().map(|(k, v)| (*k, *v)).collect();
                entries.sort();
                entries
            };
            let expected: Vec<(u32, u64)> = model.iter().map(|(k, v)| (*k, *v)).collect();
            assert_eq!(effective, expected);

            set.commit(delta).unwrap();
            assert_eq!(materialize(&set), expected, "commit must match the model");
        }
    }

    #[test]
    fn test_single_writer_is_always_enforced() {
        let set: BaseSet<u32, u64> = BaseSet::new();

        for _ in 0..10 {
            let delta = set.create_delta().unwrap();
            assert_eq!(
                set.create_delta().unwrap_err(),
                DeltaError::ConcurrencyViolation
            );
            drop(delta);
        }
    }

    #[test]
    fn test_readers_see_stable_snapshots_across_commits() {
        let mut set = BaseSet::from_entries([(1u32, 1u64)]);
        let mut snapshots = vec![set.snapshot()];

        for round in 0..10u64 {
            let mut delta = set.create_delta().unwrap();
            delta.insert(round as u32 + 2, round);
            set.commit(delta).unwrap();
            snapshots.push(set.snapshot());
        }

        // each snapshot kept the length it had when taken
        for (index, snapshot) in snapshots.iter().enumerate() {
            assert_eq!(snapshot.len(), index + 1);
        }
    }
}
