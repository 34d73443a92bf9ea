//! # Notifications
//!
//! Semantic events extracted from a block, in the order observers consume
//! them during Commit mode. Rollback replays the same sequence in reverse.

use shared_types::{Address, Amount, Block, Hash, Height, Timestamp};

/// A semantic event driving observer execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Funds moved from `sender` to `recipient`.
    BalanceTransfer {
        /// Paying account.
        sender: Address,
        /// Receiving account.
        recipient: Address,
        /// Transferred amount.
        amount: Amount,
    },
    /// Funds credited to `address` (fee payout, reward).
    BalanceCredit {
        /// Receiving account.
        address: Address,
        /// Credited amount.
        amount: Amount,
    },
    /// Funds debited from `address` (fee charge).
    BalanceDebit {
        /// Paying account.
        address: Address,
        /// Debited amount.
        amount: Amount,
    },
    /// Funds locked against `hash` until `expiry_height`.
    LockCreated {
        /// Lock identity.
        hash: Hash,
        /// Locking account.
        owner: Address,
        /// Locked amount.
        amount: Amount,
        /// Height the lock expires at.
        expiry_height: Height,
    },
    /// The lock under `hash` was completed in favor of `beneficiary`.
    LockCompleted {
        /// Lock identity.
        hash: Hash,
        /// Account receiving the locked funds.
        beneficiary: Address,
    },
    /// Terminal notification of a block: all per-transaction notifications
    /// of the block precede it.
    BlockClosed {
        /// Height of the closed block.
        height: Height,
        /// Harvester of the closed block.
        harvester: Address,
        /// Timestamp of the closed block.
        timestamp: Timestamp,
        /// Difficulty of the closed block.
        difficulty: u64,
    },
}

impl Notification {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BalanceTransfer { .. } => "balance_transfer",
            Self::BalanceCredit { .. } => "balance_credit",
            Self::BalanceDebit { .. } => "balance_debit",
            Self::LockCreated { .. } => "lock_created",
            Self::LockCompleted { .. } => "lock_completed",
            Self::BlockClosed { .. } => "block_closed",
        }
    }
}

/// Decomposes `block` into its notification sequence.
///
/// Per transaction: the transfer, then the fee debit. After all
/// transactions: the harvester's fee credit, then the terminal
/// [`Notification::BlockClosed`].
pub fn extract_from_block(block: &Block) -> Vec<Notification> {
    let mut notifications = Vec::with_capacity(2 * block.transactions.len() + 2);

    for tx in &block.transactions {
        notifications.push(Notification::BalanceTransfer {
            sender: tx.sender,
            recipient: tx.recipient,
            amount: tx.amount,
        });
        if tx.fee > 0 {
            notifications.push(Notification::BalanceDebit {
                address: tx.sender,
                amount: tx.fee,
            });
        }
    }

    let total_fees = block.total_fees();
    if total_fees > 0 {
        notifications.push(Notification::BalanceCredit {
            address: block.harvester,
            amount: total_fees,
        });
    }

    notifications.push(Notification::BlockClosed {
        height: block.height,
        harvester: block.harvester,
        timestamp: block.timestamp,
        difficulty: block.difficulty,
    });

    notifications
}
