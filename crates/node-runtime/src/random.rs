//! # Random Source
//!
//! An explicit, seedable randomness context handed to the components that
//! need it (workload generation, harvesting jitter). Nothing in the node
//! reaches for an ambient process-wide generator.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::Address;

/// Seedable randomness context.
pub struct RandomSource {
    rng: Mutex<StdRng>,
}

impl RandomSource {
    /// Creates a source from an explicit seed (reproducible workloads).
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Creates a source seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A uniform value in `[low, high)`.
    pub fn amount_in(&self, low: u128, high: u128) -> u128 {
        self.rng.lock().gen_range(low..high)
    }

    /// A uniform index in `[0, len)`.
    pub fn index(&self, len: usize) -> usize {
        self.rng.lock().gen_range(0..len)
    }

    /// A random account address.
    pub fn address(&self) -> Address {
        self.rng.lock().gen()
    }
}
