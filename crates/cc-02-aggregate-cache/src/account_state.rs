//! # Account State Cache
//!
//! The plain sub-cache holding the state of every account, plus the typed
//! credit/debit helpers observers use to mutate balances symmetrically.
//!
//! ## Account Lifetime
//!
//! Accounts are created by the first credit that touches them; a rollback
//! debit that drains an account created at the same height removes it
//! again, so commit-then-rollback restores the cache exactly.

use crate::errors::CacheError;
use crate::plain_cache::{PlainCache, PlainCacheDelta, PlainCacheView};
use shared_types::{AccountState, Address, Amount, Height};

/// Registration name of the account state cache.
pub const ACCOUNT_STATE_CACHE_NAME: &str = "account_state";

/// The account state sub-cache.
pub type AccountStateCache = PlainCache<Address, AccountState>;

/// Transactional handle of the account state cache.
pub type AccountStateCacheDelta = PlainCacheDelta<Address, AccountState>;

/// Read-only snapshot of the account state cache.
pub type AccountStateCacheView = PlainCacheView<Address, AccountState>;

/// Creates an empty account state cache.
pub fn account_state_cache() -> AccountStateCache {
    PlainCache::new(ACCOUNT_STATE_CACHE_NAME)
}

/// Creates an account state cache seeded with `accounts`.
pub fn account_state_cache_with(
    accounts: impl IntoIterator<Item = (Address, AccountState)>,
) -> AccountStateCache {
    PlainCache::from_entries(ACCOUNT_STATE_CACHE_NAME, accounts)
}

impl PlainCacheDelta<Address, AccountState> {
    /// Credits `amount` to `address`, creating the account if absent.
    ///
    /// A created account records `height` as its creation height so the
    /// matching rollback debit can remove it again.
    pub fn credit(&mut self, address: &Address, amount: Amount, height: Height) {
        match self.get_mut(address) {
            Some(state) => state.balance += amount,
            None => {
                let mut state = AccountState::new(amount);
                state.updated_height = height;
                self.insert(*address, state);
            }
        }
    }

    /// Debits `amount` from `address`.
    ///
    /// An account drained to a zero balance and zero nonce that was created
    /// at `height` is removed, mirroring the creating credit.
    ///
    /// # Errors
    ///
    /// `CacheError::AccountNotFound` if the account does not exist;
    /// `CacheError::InsufficientBalance` if `amount` exceeds the balance.
    pub fn debit(
        &mut self,
        address: &Address,
        amount: Amount,
        height: Height,
    ) -> Result<(), CacheError> {
        let state = self
            .get_mut(address)
            .ok_or(CacheError::AccountNotFound { address: *address })?;

        if state.balance < amount {
            return Err(CacheError::InsufficientBalance {
                required: amount,
                available: state.balance,
            });
        }

        state.balance -= amount;
        let drained_creation =
            0 == state.balance && 0 == state.nonce && height == state.updated_height;
        if drained_creation {
            self.remove(address);
        }
        Ok(())
    }

    /// Advances the account's nonce by one.
    pub fn increment_nonce(&mut self, address: &Address) -> Result<(), CacheError> {
        let state = self
            .get_mut(address)
            .ok_or(CacheError::AccountNotFound { address: *address })?;
        state.nonce += 1;
        Ok(())
    }

    /// Rewinds the account's nonce by one.
    pub fn decrement_nonce(&mut self, address: &Address) -> Result<(), CacheError> {
        let state = self
            .get_mut(address)
            .ok_or(CacheError::AccountNotFound { address: *address })?;
        state.nonce = state.nonce.saturating_sub(1);
        Ok(())
    }

    /// The spendable balance of `address`, zero if the account is absent.
    pub fn balance(&self, address: &Address) -> Amount {
        self.get(address).map(|state| state.balance).unwrap_or(0)
    }
}

impl PlainCacheView<Address, AccountState> {
    /// The spendable balance of `address`, zero if the account is absent.
    pub fn balance(&self, address: &Address) -> Amount {
        self.get(address).map(|state| state.balance).unwrap_or(0)
    }

    /// The next expected nonce of `address`, zero if the account is absent.
    pub fn nonce(&self, address: &Address) -> u64 {
        self.get(address).map(|state| state.nonce).unwrap_or(0)
    }
}
