//! Fund events
//!
//! Immutable records appended by every successful state change. Events of an
//! operation that rolls back are discarded with it.

use fund_types::fee::{FeeDivisors, FeeRetention};
use fund_types::ids::{Address, CampaignId, VoteOption};
use fund_types::numeric::Amount;
use serde::{Deserialize, Serialize};

use crate::registry::Endpoint;

/// Shares issued against a deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesMinted {
    pub holder: Address,
    /// Currency the caller paid in (native sentinel or the reserve asset)
    pub paid_currency: Address,
    pub paid_amount: Amount,
    pub reserve_acquired: Amount,
    pub fee: Amount,
    pub shares: Amount,
}

/// Shares redeemed for reserve or native currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesBurned {
    pub holder: Address,
    pub shares: Amount,
    pub gross_reserve: Amount,
    pub fee: Amount,
    pub payout_currency: Address,
    pub payout: Amount,
}

/// Reward claimed from a handler and reinvested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardClaimed {
    pub campaign: CampaignId,
    pub handler: Address,
    pub currency: Address,
    pub claimed: Amount,
    pub reserve_acquired: Amount,
    pub fee: Amount,
}

/// Vote relayed to the governance service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCast {
    pub campaign: CampaignId,
    pub option: VoteOption,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointUpdated {
    pub endpoint: Endpoint,
    pub previous: Option<Address>,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardHandlerRegistered {
    pub index: usize,
    pub handler: Address,
    pub currency: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceGranted {
    pub token: Address,
    pub spender: Address,
    pub reset_first: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeesWithdrawn {
    pub recipient: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipTransferred {
    pub previous: Address,
    pub owner: Address,
}

/// Enum wrapper for all fund events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundEvent {
    SharesMinted(SharesMinted),
    SharesBurned(SharesBurned),
    RewardClaimed(RewardClaimed),
    VoteCast(VoteCast),
    EndpointUpdated(EndpointUpdated),
    RewardHandlerRegistered(RewardHandlerRegistered),
    FeeDivisorsUpdated(FeeDivisors),
    FeeRetentionUpdated(FeeRetention),
    AllowanceGranted(AllowanceGranted),
    FeesWithdrawn(FeesWithdrawn),
    OwnershipTransferred(OwnershipTransferred),
    Paused,
    Unpaused,
}
