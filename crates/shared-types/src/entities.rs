//! # Core Domain Entities
//!
//! Defines the entities that flow through the processing pipeline and the
//! state caches.
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `Transaction`
//! - **State**: `AccountState`, `BlockStatistic`, `HashLockInfo`

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 20-byte account address.
pub type Address = [u8; 20];

/// Block height in the chain.
pub type Height = u64;

/// An amount of the base currency in atomic units.
pub type Amount = u128;

/// Unix timestamp in milliseconds.
pub type Timestamp = u64;

/// Computes the Keccak-256 digest of the canonical bincode encoding.
///
/// All entity identities in the system derive from this one function so
/// that every subsystem agrees on ids without sharing encoder state.
pub fn entity_hash<T: Serialize>(entity: &T) -> Hash {
    let encoded = bincode::serialize(entity).unwrap_or_default();
    let mut hasher = Keccak256::new();
    hasher.update(&encoded);
    hasher.finalize().into()
}

/// A transfer transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction hash (identity).
    pub hash: Hash,
    /// Sender address.
    pub sender: Address,
    /// Recipient address.
    pub recipient: Address,
    /// Transferred amount in atomic units.
    pub amount: Amount,
    /// Fee paid to the block harvester.
    pub fee: Amount,
    /// Sender's nonce to prevent replay.
    pub nonce: u64,
}

impl Transaction {
    /// Creates a transaction and seals its hash over the remaining fields.
    pub fn new(sender: Address, recipient: Address, amount: Amount, fee: Amount, nonce: u64) -> Self {
        let mut tx = Self {
            hash: [0; 32],
            sender,
            recipient,
            amount,
            fee,
            nonce,
        };
        tx.hash = entity_hash(&(tx.sender, tx.recipient, tx.amount, tx.fee, tx.nonce));
        tx
    }
}

/// A block of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    /// Block height in the chain.
    pub height: Height,
    /// Block hash (identity).
    pub hash: Hash,
    /// Hash of the parent block.
    pub parent_hash: Hash,
    /// Unix timestamp when the block was harvested.
    pub timestamp: Timestamp,
    /// Address of the harvester collecting the fees.
    pub harvester: Address,
    /// Difficulty target this block was harvested at.
    pub difficulty: u64,
    /// All transactions in this block.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Creates a block at `height` on top of `parent_hash` and seals its hash.
    pub fn new(
        height: Height,
        parent_hash: Hash,
        timestamp: Timestamp,
        harvester: Address,
        difficulty: u64,
        transactions: Vec<Transaction>,
    ) -> Self {
        let mut block = Self {
            height,
            hash: [0; 32],
            parent_hash,
            timestamp,
            harvester,
            difficulty,
            transactions,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Recomputes the block hash over the header fields and transaction ids.
    pub fn compute_hash(&self) -> Hash {
        let tx_hashes: Vec<Hash> = self.transactions.iter().map(|tx| tx.hash).collect();
        entity_hash(&(
            self.height,
            self.parent_hash,
            self.timestamp,
            self.harvester,
            self.difficulty,
            tx_hashes,
        ))
    }

    /// Total fees carried by this block's transactions.
    pub fn total_fees(&self) -> Amount {
        self.transactions.iter().map(|tx| tx.fee).sum()
    }
}

/// The state of a single account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AccountState {
    /// Spendable balance in atomic units.
    pub balance: Amount,
    /// Next expected nonce.
    pub nonce: u64,
    /// Height at which this account was last touched.
    pub updated_height: Height,
}

impl AccountState {
    /// Creates an account state with `balance` and a zero nonce.
    pub fn new(balance: Amount) -> Self {
        Self {
            balance,
            nonce: 0,
            updated_height: 0,
        }
    }
}

/// Per-block chain statistics retained for difficulty adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockStatistic {
    /// Height the statistic was recorded at.
    pub height: Height,
    /// Timestamp of the recorded block.
    pub timestamp: Timestamp,
    /// Difficulty of the recorded block.
    pub difficulty: u64,
}

/// Status of a hash lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LockStatus {
    /// Lock is active and may still be completed.
    #[default]
    Unused,
    /// Lock was completed by the matching secret/aggregate.
    Used,
}

/// Funds locked against a hash until an expiry height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HashLockInfo {
    /// Account that locked the funds.
    pub owner: Address,
    /// Locked amount.
    pub amount: Amount,
    /// Height at which the lock expires.
    pub expiry_height: Height,
    /// Current lock status.
    pub status: LockStatus,
}

/// Formats a hash as an abbreviated hex string for log output.
pub fn short_hash(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}
