//! Capability interfaces for the fund's external collaborators
//!
//! The fund never prices swaps, computes staking yield or tallies votes; it
//! calls into these interfaces and accounts for what they report. Production
//! bindings and the in-memory stand-ins in [`crate::mock`] implement the same
//! traits.

use fund_types::ids::{Address, CampaignId, VoteOption};
use fund_types::numeric::Amount;

use crate::errors::ServiceError;

/// Multi-currency balance book of the execution environment.
///
/// Keyed by currency address, with `Address::NATIVE_CURRENCY` for the native
/// currency. Native balances have no allowances. A ledger may refuse to move
/// an allowance from one non-zero value to another.
pub trait AssetLedger {
    fn balance_of(&self, currency: &Address, holder: &Address) -> Amount;

    fn allowance(&self, currency: &Address, owner: &Address, spender: &Address) -> Amount;

    fn approve(
        &mut self,
        currency: &Address,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), ServiceError>;

    fn transfer(
        &mut self,
        currency: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), ServiceError>;

    /// Move `amount` on behalf of `from`, consuming `spender`'s allowance.
    fn transfer_from(
        &mut self,
        currency: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), ServiceError>;
}

/// Staking service holding the reserve asset and granting voting weight.
pub trait StakingService {
    fn address(&self) -> Address;

    /// Pull `amount` of reserve from `staker` (through its allowance) and stake it.
    fn deposit(
        &mut self,
        assets: &mut dyn AssetLedger,
        staker: &Address,
        amount: Amount,
    ) -> Result<(), ServiceError>;

    /// Unstake `amount` and return it to `staker`.
    fn withdraw(
        &mut self,
        assets: &mut dyn AssetLedger,
        staker: &Address,
        amount: Amount,
    ) -> Result<(), ServiceError>;

    fn staked_balance(&self, staker: &Address) -> Amount;
}

/// Exchange converting between currencies at market rate.
pub trait ExchangeService {
    fn address(&self) -> Address;

    /// Convert `amount` of `src` held by `trader` into `dest`, paid to `trader`.
    ///
    /// Native `src` is sent along with the call; token `src` is pulled
    /// through the trader's allowance to the exchange. Returns the amount of
    /// `dest` received.
    fn swap(
        &mut self,
        assets: &mut dyn AssetLedger,
        trader: &Address,
        src: &Address,
        dest: &Address,
        amount: Amount,
    ) -> Result<Amount, ServiceError>;
}

/// Governance service running campaigns.
pub trait GovernanceService {
    fn address(&self) -> Address;

    /// Cast `voter`'s staked weight for `option` in `campaign`.
    fn vote(
        &mut self,
        voter: &Address,
        campaign: CampaignId,
        option: VoteOption,
    ) -> Result<(), ServiceError>;
}

/// Source of claimable rewards in one currency.
///
/// Double claims are the handler's responsibility; the fund only relays.
pub trait RewardHandler {
    fn address(&self) -> Address;

    fn currency(&self) -> Address;

    /// Pay `amount` of accrued reward for `campaign` to `staker`.
    /// Returns the amount actually paid.
    fn claim_reward(
        &mut self,
        assets: &mut dyn AssetLedger,
        staker: &Address,
        campaign: CampaignId,
        amount: Amount,
    ) -> Result<Amount, ServiceError>;
}

/// Resolves a registered handler address to its implementation.
pub trait RewardHandlerLookup {
    fn handler_mut(&mut self, at: &Address) -> Option<&mut dyn RewardHandler>;
}

/// Disjoint mutable access to every collaborator for one operation.
pub struct Services<'a> {
    pub assets: &'a mut dyn AssetLedger,
    pub staking: &'a mut dyn StakingService,
    pub exchange: &'a mut dyn ExchangeService,
    pub governance: &'a mut dyn GovernanceService,
    pub reward_handlers: &'a mut dyn RewardHandlerLookup,
}

/// The execution environment a fund operation runs against.
///
/// Each fund operation opens a checkpoint, and either commits it or rolls
/// every collaborator back to it, so a failed operation leaves no external
/// trace.
pub trait Environment {
    fn services(&mut self) -> Services<'_>;

    fn checkpoint(&mut self);

    fn commit(&mut self);

    fn rollback(&mut self);
}
