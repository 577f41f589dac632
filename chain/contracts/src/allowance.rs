//! Allowance manager — spending authorizations granted by the fund
//!
//! The staking service pulls reserve from the fund and the exchange pulls
//! tokens from it, both through allowances on the token's own ledger. Some
//! tokens refuse to change an allowance from one non-zero value to another,
//! so a grant over an existing one must pass through zero first.
//!
//! Tracked per (token, spender):
//!
//! ```text
//! Unset ──grant──▶ Granted ──reset──▶ Zeroed ──grant──▶ Granted
//! ```
//!
//! A grant straight out of `Granted` is refused locally. An allowance set
//! outside the fund's tracking is invisible here; against a strict ledger the
//! caller must pass `reset_first` or the ledger rejects the grant.

use fund_types::ids::Address;
use fund_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::errors::FundError;
use crate::registry::Endpoint;
use crate::services::AssetLedger;

/// Ceiling granted to trusted spenders
pub const MAX_ALLOWANCE: Amount = Amount::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllowanceState {
    /// Never touched by the fund
    #[default]
    Unset,
    /// Reset to zero, ready for a grant
    Zeroed,
    /// Maximal ceiling granted
    Granted,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllowanceManager {
    /// (token, spender) -> state
    states: HashMap<(Address, Address), AllowanceState>,
}

impl AllowanceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, token: &Address, spender: &Address) -> AllowanceState {
        self.states
            .get(&(*token, *spender))
            .copied()
            .unwrap_or_default()
    }

    /// Grant `spender` the maximal ceiling over the fund's `token`.
    ///
    /// With `reset_first`, the allowance is zeroed before the grant.
    pub fn authorize(
        &mut self,
        assets: &mut dyn AssetLedger,
        fund: &Address,
        token: &Address,
        spender: &Address,
        reset_first: bool,
    ) -> Result<(), FundError> {
        let key = (*token, *spender);
        let current = self.state(token, spender);

        if !reset_first && current == AllowanceState::Granted {
            return Err(FundError::AllowanceResetRequired { spender: *spender });
        }

        if reset_first {
            assets
                .approve(token, fund, spender, 0)
                .map_err(FundError::external(Endpoint::AssetLedger))?;
            self.states.insert(key, AllowanceState::Zeroed);
            debug!(%token, %spender, from = ?current, "Allowance reset to zero");
        }

        assets
            .approve(token, fund, spender, MAX_ALLOWANCE)
            .map_err(FundError::external(Endpoint::AssetLedger))?;
        self.states.insert(key, AllowanceState::Granted);
        debug!(%token, %spender, "Allowance granted");
        Ok(())
    }
}
