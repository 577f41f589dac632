//! Share ledger — fungible share balances and total supply
//!
//! Shares are created and destroyed only through `mint` and `burn`. The sum
//! of all balances always equals `total_supply`.

use fund_types::ids::Address;
use fund_types::numeric::Amount;
use std::collections::HashMap;

use crate::errors::LedgerError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShareLedger {
    balances: HashMap<Address, Amount>,
    total_supply: Amount,
}

impl ShareLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `quantity` new shares to `to`.
    pub fn mint(&mut self, to: Address, quantity: Amount) -> Result<(), LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let new_supply = self
            .total_supply
            .checked_add(quantity)
            .ok_or(LedgerError::Overflow)?;
        // Cannot overflow: a balance never exceeds the supply.
        *self.balances.entry(to).or_insert(0) += quantity;
        self.total_supply = new_supply;
        Ok(())
    }

    /// Destroy `quantity` shares held by `from`.
    pub fn burn(&mut self, from: &Address, quantity: Amount) -> Result<(), LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let available = self.balance_of(from);
        if available < quantity {
            return Err(LedgerError::InsufficientBalance {
                holder: *from,
                required: quantity,
                available,
            });
        }

        let remaining = available - quantity;
        if remaining == 0 {
            self.balances.remove(from);
        } else {
            self.balances.insert(*from, remaining);
        }
        self.total_supply -= quantity;
        Ok(())
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Number of holders with a non-zero balance.
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Iterate over `(holder, balance)` pairs in unspecified order.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }
}
