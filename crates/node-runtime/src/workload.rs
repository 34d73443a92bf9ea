//! # Workload Generator
//!
//! Deterministic local block production for demos and integration tests.
//! All randomness flows through the explicit [`RandomSource`] context, so
//! a fixed seed reproduces the exact block sequence.

use crate::random::RandomSource;
use shared_types::{Address, Amount, Block, Hash, Height, Timestamp, Transaction};
use std::collections::HashMap;

/// Deterministic producer of consecutive blocks.
pub struct WorkloadGenerator {
    random: RandomSource,
    accounts: Vec<Address>,
    nonces: HashMap<Address, u64>,
    last_hash: Hash,
    next_height: Height,
    timestamp: Timestamp,
}

impl WorkloadGenerator {
    /// Creates a generator with `account_count` random accounts.
    pub fn new(random: RandomSource, account_count: usize) -> Self {
        let accounts = (0..account_count.max(2))
            .map(|_| random.address())
            .collect();
        Self {
            random,
            accounts,
            nonces: HashMap::new(),
            last_hash: [0; 32],
            next_height: 1,
            timestamp: 1_000,
        }
    }

    /// The generated account set.
    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    /// Genesis balances funding every account with `initial`.
    pub fn genesis_balances(&self, initial: Amount) -> Vec<(Address, Amount)> {
        self.accounts
            .iter()
            .map(|address| (*address, initial))
            .collect()
    }

    /// Produces the next consecutive block with `tx_count` transfers.
    pub fn next_block(&mut self, tx_count: usize) -> Block {
        let mut transactions = Vec::with_capacity(tx_count);
        for _ in 0..tx_count {
            let sender = self.accounts[self.random.index(self.accounts.len())];
            let recipient = loop {
                let candidate = self.accounts[self.random.index(self.accounts.len())];
                if candidate != sender {
                    break candidate;
                }
            };
            let amount = self.random.amount_in(1, 1_000);
            let fee = self.random.amount_in(1, 10);
            let nonce = self.nonces.entry(sender).or_insert(0);
            transactions.push(Transaction::new(sender, recipient, amount, fee, *nonce));
            *nonce += 1;
        }

        let harvester = self.accounts[self.random.index(self.accounts.len())];
        let difficulty = 100 + self.random.amount_in(0, 50) as u64;
        let block = Block::new(
            self.next_height,
            self.last_hash,
            self.timestamp,
            harvester,
            difficulty,
            transactions,
        );

        self.last_hash = block.hash;
        self.next_height += 1;
        self.timestamp += 15_000;
        block
    }
}
