//! # Observers - Notification Pipeline
//!
//! Blocks are decomposed into semantic notifications, and each observer
//! mutates the composite cache delta once per notification it understands.
//!
//! ## Symmetry Discipline
//!
//! Every value-mutating observer is self-inverse with respect to the notify
//! mode: applying a notification in `Commit` mode and then in `Rollback`
//! mode restores the pre-commit cache state exactly. Rollback therefore
//! needs no separate inverse implementation; the pipeline replays the same
//! notifications in reverse with the mode flipped.
//!
//! The single sanctioned exception is [`HistoryPruningObserver`]: pruned
//! history is not restorable, which bounds the reorg depth the node accepts.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod balance;
pub mod context;
pub mod errors;
pub mod lock;
pub mod notifications;
pub mod observer;
pub mod pipeline;
pub mod pruning;
pub mod statistic;

pub use balance::{BalanceChangeObserver, BalanceTransferObserver};
pub use context::{NotifyMode, ObserverContext, Resolvers};
pub use errors::ObserverError;
pub use lock::HashLockObserver;
pub use notifications::{extract_from_block, Notification};
pub use observer::{FunctionalObserver, Observer};
pub use pipeline::{ObserverPipeline, OrderingPolicy};
pub use pruning::HistoryPruningObserver;
pub use statistic::BlockStatisticObserver;
