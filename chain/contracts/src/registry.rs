//! External endpoint registry
//!
//! Owner-mutable addresses of the collaborators the fund calls into: the
//! staking service, the exchange, the reserve asset token, the governance
//! service, and an ordered table of reward handlers keyed by currency.

use fund_types::ids::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::FundError;

/// Kind of external collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Endpoint {
    Staking,
    Exchange,
    ReserveAsset,
    Governance,
    RewardHandler,
    /// Balance book of the execution environment (token transfers, allowances)
    AssetLedger,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::Staking => "staking",
            Endpoint::Exchange => "exchange",
            Endpoint::ReserveAsset => "reserve asset",
            Endpoint::Governance => "governance",
            Endpoint::RewardHandler => "reward handler",
            Endpoint::AssetLedger => "asset ledger",
        };
        f.write_str(name)
    }
}

/// One row of the reward handler table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardHandlerEntry {
    pub handler: Address,
    /// Currency the handler pays out; `Address::NATIVE_CURRENCY` for native
    pub currency: Address,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointRegistry {
    staking: Option<Address>,
    exchange: Option<Address>,
    reserve_asset: Option<Address>,
    governance: Option<Address>,
    reward_handlers: Vec<RewardHandlerEntry>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single-address endpoint, returning the previous value.
    ///
    /// Reward handlers live in their own table (see [`Self::upsert_reward_handler`])
    /// and the asset ledger is not addressed; both are ignored here.
    pub fn set(&mut self, endpoint: Endpoint, address: Address) -> Option<Address> {
        let slot = match endpoint {
            Endpoint::Staking => &mut self.staking,
            Endpoint::Exchange => &mut self.exchange,
            Endpoint::ReserveAsset => &mut self.reserve_asset,
            Endpoint::Governance => &mut self.governance,
            Endpoint::RewardHandler | Endpoint::AssetLedger => return None,
        };
        slot.replace(address)
    }

    pub fn get(&self, endpoint: Endpoint) -> Option<Address> {
        match endpoint {
            Endpoint::Staking => self.staking,
            Endpoint::Exchange => self.exchange,
            Endpoint::ReserveAsset => self.reserve_asset,
            Endpoint::Governance => self.governance,
            Endpoint::RewardHandler | Endpoint::AssetLedger => None,
        }
    }

    /// Registered address, or `EndpointNotConfigured`.
    pub fn require(&self, endpoint: Endpoint) -> Result<Address, FundError> {
        self.get(endpoint)
            .ok_or(FundError::EndpointNotConfigured(endpoint))
    }

    /// Check that a service instance sits at the registered address.
    pub fn verify(&self, endpoint: Endpoint, presented: Address) -> Result<Address, FundError> {
        let registered = self.require(endpoint)?;
        if registered != presented {
            return Err(FundError::EndpointMismatch {
                endpoint,
                registered,
                presented,
            });
        }
        Ok(registered)
    }

    /// Register `handler` as the source of `currency` rewards.
    ///
    /// A known currency keeps its index and gets the new handler; a new
    /// currency is appended. Returns the row index.
    pub fn upsert_reward_handler(&mut self, handler: Address, currency: Address) -> usize {
        if let Some(index) = self
            .reward_handlers
            .iter()
            .position(|entry| entry.currency == currency)
        {
            self.reward_handlers[index].handler = handler;
            return index;
        }
        self.reward_handlers.push(RewardHandlerEntry { handler, currency });
        self.reward_handlers.len() - 1
    }

    pub fn reward_handler(&self, index: usize) -> Option<&RewardHandlerEntry> {
        self.reward_handlers.get(index)
    }

    pub fn reward_handlers(&self) -> &[RewardHandlerEntry] {
        &self.reward_handlers
    }

    pub fn handler_for_currency(&self, currency: &Address) -> Option<Address> {
        self.reward_handlers
            .iter()
            .find(|entry| entry.currency == *currency)
            .map(|entry| entry.handler)
    }
}
