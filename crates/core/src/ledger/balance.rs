//! Balance deltas for transaction mutations.
//!
//! A transaction's delta is `+amount` for income and `-amount` for expense.
//! Creating applies the delta, deleting applies its reversal, and updating
//! applies the reversal of the old delta followed by the new delta.

use fintrack_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A signed adjustment to one account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    /// Account to adjust.
    pub account_id: AccountId,
    /// Signed amount to add to the balance.
    pub delta: Decimal,
}

impl BalanceChange {
    /// Creates a balance change.
    #[must_use]
    pub const fn new(account_id: AccountId, delta: Decimal) -> Self {
        Self { account_id, delta }
    }

    /// The change that undoes this one.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            account_id: self.account_id,
            delta: -self.delta,
        }
    }
}

/// Computes the balance changes for replacing `old` with `new`.
///
/// `old` is the effect currently applied (`None` on create), `new` is the
/// effect after the mutation (`None` on delete). Changes on the same account
/// are netted into one entry; entries that net to zero are dropped. The
/// result is ordered by account id so that callers touching several accounts
/// always stage them in the same order.
#[must_use]
pub fn balance_changes(old: Option<BalanceChange>, new: Option<BalanceChange>) -> Vec<BalanceChange> {
    let mut changes: Vec<BalanceChange> = Vec::with_capacity(2);

    for change in old.map(BalanceChange::reversed).into_iter().chain(new) {
        match changes.iter_mut().find(|c| c.account_id == change.account_id) {
            Some(existing) => existing.delta += change.delta,
            None => changes.push(change),
        }
    }

    changes.retain(|c| !c.delta.is_zero());
    changes.sort_by_key(|c| c.account_id);
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_applies_forward_delta() {
        let account = AccountId::new();
        let changes = balance_changes(None, Some(BalanceChange::new(account, dec!(-40))));
        assert_eq!(changes, vec![BalanceChange::new(account, dec!(-40))]);
    }

    #[test]
    fn test_delete_applies_reversal() {
        let account = AccountId::new();
        let changes = balance_changes(Some(BalanceChange::new(account, dec!(100))), None);
        assert_eq!(changes, vec![BalanceChange::new(account, dec!(-100))]);
    }

    #[test]
    fn test_update_same_account_nets_out() {
        let account = AccountId::new();
        let changes = balance_changes(
            Some(BalanceChange::new(account, dec!(-40))),
            Some(BalanceChange::new(account, dec!(100))),
        );
        assert_eq!(changes, vec![BalanceChange::new(account, dec!(140))]);
    }

    #[test]
    fn test_update_without_effect_is_empty() {
        let account = AccountId::new();
        let change = BalanceChange::new(account, dec!(25));
        assert!(balance_changes(Some(change), Some(change)).is_empty());
    }

    #[test]
    fn test_update_moving_accounts_touches_both() {
        let from = AccountId::new();
        let to = AccountId::new();
        let changes = balance_changes(
            Some(BalanceChange::new(from, dec!(10))),
            Some(BalanceChange::new(to, dec!(10))),
        );
        assert_eq!(changes.len(), 2);
        assert!(changes.contains(&BalanceChange::new(from, dec!(-10))));
        assert!(changes.contains(&BalanceChange::new(to, dec!(10))));
        assert!(changes[0].account_id < changes[1].account_id);
    }
}
