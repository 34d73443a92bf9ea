//! # Observer Context
//!
//! Everything an observer may touch: the composite cache delta, the height
//! being processed, the notify mode, and the alias resolvers. Observers
//! never receive wider access than this; scheduled maintenance and block
//! processing share the same single-writer contract through it.

use cc_02_aggregate_cache::CompositeDelta;
use shared_types::{Address, Height};
use std::collections::HashMap;

/// Direction of state-change application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyMode {
    /// Apply the notification's effects.
    Commit,
    /// Undo the notification's effects.
    Rollback,
}

/// Resolves aliased identifiers to their canonical form.
///
/// The default resolver is the identity mapping; alias registrations come
/// from collaborators outside this crate.
#[derive(Debug, Clone, Default)]
pub struct Resolvers {
    addresses: HashMap<Address, Address>,
}

impl Resolvers {
    /// Creates identity resolvers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `alias` as resolving to `canonical`.
    pub fn register_address(&mut self, alias: Address, canonical: Address) {
        self.addresses.insert(alias, canonical);
    }

    /// Resolves `address`, returning it unchanged if unaliased.
    pub fn resolve_address(&self, address: &Address) -> Address {
        self.addresses.get(address).copied().unwrap_or(*address)
    }
}

/// Execution context handed to every observer invocation.
pub struct ObserverContext<'a> {
    /// The element's composite cache delta.
    pub delta: &'a mut CompositeDelta,
    /// Height of the block being processed.
    pub height: Height,
    /// Direction of application.
    pub mode: NotifyMode,
    /// Alias resolvers.
    pub resolvers: &'a Resolvers,
}

impl<'a> ObserverContext<'a> {
    /// Creates a context for one element at `height`.
    pub fn new(
        delta: &'a mut CompositeDelta,
        height: Height,
        mode: NotifyMode,
        resolvers: &'a Resolvers,
    ) -> Self {
        Self {
            delta,
            height,
            mode,
            resolvers,
        }
    }

    /// True if the context applies effects (Commit mode).
    pub fn is_commit(&self) -> bool {
        NotifyMode::Commit == self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolvers_identity_by_default() {
        let resolvers = Resolvers::new();
        let address = [0x42; 20];
        assert_eq!(resolvers.resolve_address(&address), address);
    }

    #[test]
    fn test_resolvers_alias() {
        let mut resolvers = Resolvers::new();
        resolvers.register_address([0x01; 20], [0x02; 20]);
        assert_eq!(resolvers.resolve_address(&[0x01; 20]), [0x02; 20]);
    }
}
