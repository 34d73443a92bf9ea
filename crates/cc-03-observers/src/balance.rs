//! # Balance Observers
//!
//! Self-inverse observers over the account state cache. A transfer applied
//! in Commit mode and replayed in Rollback mode restores both accounts
//! exactly, including removal of accounts the transfer created.

use crate::context::{NotifyMode, ObserverContext};
use crate::errors::ObserverError;
use crate::notifications::Notification;
use crate::observer::Observer;
use cc_02_aggregate_cache::{AccountStateCacheDelta, ACCOUNT_STATE_CACHE_NAME};

/// Applies [`Notification::BalanceTransfer`] to the account state cache.
pub struct BalanceTransferObserver;

impl Observer for BalanceTransferObserver {
    fn name(&self) -> &str {
        "balance_transfer"
    }

    fn notify(
        &self,
        notification: &Notification,
        context: &mut ObserverContext<'_>,
    ) -> Result<(), ObserverError> {
        let Notification::BalanceTransfer {
            sender,
            recipient,
            amount,
        } = notification
        else {
            return Ok(());
        };

        let sender = context.resolvers.resolve_address(sender);
        let recipient = context.resolvers.resolve_address(recipient);
        let height = context.height;
        let accounts = context
            .delta
            .sub_cache_mut::<AccountStateCacheDelta>(ACCOUNT_STATE_CACHE_NAME)?;

        match context.mode {
            NotifyMode::Commit => {
                accounts.debit(&sender, *amount, height)?;
                accounts.credit(&recipient, *amount, height);
            }
            NotifyMode::Rollback => {
                accounts.debit(&recipient, *amount, height)?;
                accounts.credit(&sender, *amount, height);
            }
        }
        Ok(())
    }
}

/// Applies [`Notification::BalanceCredit`] and [`Notification::BalanceDebit`]
/// to the account state cache.
pub struct BalanceChangeObserver;

impl Observer for BalanceChangeObserver {
    fn name(&self) -> &str {
        "balance_change"
    }

    fn notify(
        &self,
        notification: &Notification,
        context: &mut ObserverContext<'_>,
    ) -> Result<(), ObserverError> {
        let (address, amount, credit_on_commit) = match notification {
            Notification::BalanceCredit { address, amount } => (address, amount, true),
            Notification::BalanceDebit { address, amount } => (address, amount, false),
            _ => return Ok(()),
        };

        let address = context.resolvers.resolve_address(address);
        let height = context.height;
        let apply_credit = credit_on_commit == context.is_commit();
        let accounts = context
            .delta
            .sub_cache_mut::<AccountStateCacheDelta>(ACCOUNT_STATE_CACHE_NAME)?;

        if apply_credit {
            accounts.credit(&address, *amount, height);
        } else {
            accounts.debit(&address, *amount, height)?;
        }
        Ok(())
    }
}
