//! Deployment configuration
//!
//! A `FundConfig` describes everything the owner sets up after creating a
//! fund. [`deploy`] applies it in the same order as the deployment script:
//! fee divisors, exchange, reserve asset, staking, governance, reward
//! handlers, then the allowances.

use fund_types::fee::{FeeDivisors, FeeRetention};
use fund_types::ids::Address;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::ConfigError;
use crate::fund::Fund;
use crate::registry::RewardHandlerEntry;
use crate::services::Environment;

/// Endpoint addresses; unset entries are left unconfigured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub exchange: Option<Address>,
    #[serde(default)]
    pub reserve_asset: Option<Address>,
    #[serde(default)]
    pub staking: Option<Address>,
    #[serde(default)]
    pub governance: Option<Address>,
}

/// Allowances granted once the endpoints are in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Let the staking service pull the reserve asset
    #[serde(default)]
    pub staking: bool,
    /// Tokens the exchange may pull from the fund
    #[serde(default)]
    pub exchange_tokens: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundConfig {
    pub mandate: String,
    #[serde(default)]
    pub fee_divisors: FeeDivisors,
    #[serde(default)]
    pub fee_retention: FeeRetention,
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub reward_handlers: Vec<RewardHandlerEntry>,
    #[serde(default)]
    pub approvals: ApprovalConfig,
}

impl FundConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Create a fund at `address` owned by `owner` and configure it.
///
/// Approvals run against `env` and therefore need the reserve asset and the
/// spender endpoints to be configured.
pub fn deploy(
    env: &mut dyn Environment,
    address: Address,
    owner: Address,
    config: &FundConfig,
) -> Result<Fund, ConfigError> {
    let mut fund = Fund::new(address, owner, config.mandate.clone());

    fund.set_fee_divisors(&owner, config.fee_divisors)?;
    fund.set_fee_retention(&owner, config.fee_retention)?;

    let endpoints = &config.endpoints;
    if let Some(exchange) = endpoints.exchange {
        fund.set_exchange_endpoint(&owner, exchange)?;
    }
    if let Some(reserve_asset) = endpoints.reserve_asset {
        fund.set_reserve_asset(&owner, reserve_asset)?;
    }
    if let Some(staking) = endpoints.staking {
        fund.set_staking_endpoint(&owner, staking)?;
    }
    if let Some(governance) = endpoints.governance {
        fund.set_governance_endpoint(&owner, governance)?;
    }

    for entry in &config.reward_handlers {
        fund.add_reward_handler(&owner, entry.handler, entry.currency)?;
    }

    if config.approvals.staking {
        fund.approve_staking_contract(env, &owner, false)?;
    }
    for token in &config.approvals.exchange_tokens {
        fund.approve_exchange_contract(env, &owner, *token, false)?;
    }

    info!(
        %address,
        %owner,
        mandate = %config.mandate,
        reward_handlers = config.reward_handlers.len(),
        "Fund deployed"
    );
    Ok(fund)
}
