//! Fund — pooled custody of a staked reserve asset
//!
//! Deposits of the native currency or the reserve asset are converted into
//! proportional shares; the pooled reserve is staked with the staking
//! service. Rewards claimed from handlers are swapped into the reserve asset
//! and restaked, which is the only way the value of a share grows.
//!
//! Every operation that calls out to a collaborator runs as one transaction:
//! 1. Owner / pause / input checks, before any side effect
//! 2. Reentrancy guard
//! 3. Environment checkpoint and a snapshot of local state
//! 4. Effects and external calls
//! 5. Commit, or roll back both the environment and local state

use fund_types::fee::{FeeDivisors, FeeOperation, FeeRetention};
use fund_types::ids::{Address, CampaignId, VoteOption};
use fund_types::numeric::{mul_div, ratio, Amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::allowance::{AllowanceManager, AllowanceState};
use crate::errors::FundError;
use crate::events::{
    AllowanceGranted, EndpointUpdated, FeesWithdrawn, FundEvent, OwnershipTransferred,
    RewardClaimed, RewardHandlerRegistered, SharesBurned, SharesMinted, VoteCast,
};
use crate::ledger::ShareLedger;
use crate::registry::{Endpoint, EndpointRegistry};
use crate::security::{AccessControl, PauseGuard, ReentrancyGuard};
use crate::services::{Environment, Services, StakingService};

const NATIVE: Address = Address::NATIVE_CURRENCY;

/// What a redeeming holder is paid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedeemAs {
    /// Reserve swapped into the native currency
    Currency,
    /// Reserve asset paid out directly
    ReserveAsset,
}

/// Outcome of a mint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Issuance {
    pub shares: Amount,
    pub reserve_acquired: Amount,
    pub fee: Amount,
}

/// Outcome of a burn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redemption {
    pub gross_reserve: Amount,
    pub fee: Amount,
    pub payout_currency: Address,
    pub payout: Amount,
}

/// Outcome of one reward claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardClaim {
    pub handler: Address,
    pub currency: Address,
    pub claimed: Amount,
    pub reserve_acquired: Amount,
    pub fee: Amount,
}

/// Local state restored when a transaction rolls back
struct Snapshot {
    shares: ShareLedger,
    allowances: AllowanceManager,
    accrued_fees: Amount,
    event_count: usize,
}

#[derive(Debug)]
pub struct Fund {
    /// The fund's own identity on the asset ledger
    address: Address,
    /// Human-readable label fixed at deployment
    mandate: String,
    access_control: AccessControl,
    fee_divisors: FeeDivisors,
    fee_retention: FeeRetention,
    /// Withheld reserve held unstaked, owed to the treasury
    accrued_fees: Amount,
    registry: EndpointRegistry,
    allowances: AllowanceManager,
    shares: ShareLedger,
    reentrancy_guard: ReentrancyGuard,
    pause_guard: PauseGuard,
    /// Emitted events log (append-only)
    events: Vec<FundEvent>,
}

impl Fund {
    /// Create an unconfigured fund owned by its deployer.
    pub fn new(address: Address, owner: Address, mandate: impl Into<String>) -> Self {
        let mandate = mandate.into();
        info!(%address, %owner, %mandate, "Fund created");
        Self {
            address,
            mandate,
            access_control: AccessControl::new(owner),
            fee_divisors: FeeDivisors::DISABLED,
            fee_retention: FeeRetention::default(),
            accrued_fees: 0,
            registry: EndpointRegistry::new(),
            allowances: AllowanceManager::new(),
            shares: ShareLedger::new(),
            reentrancy_guard: ReentrancyGuard::new(),
            pause_guard: PauseGuard::new(),
            events: Vec::new(),
        }
    }

    // ───────────────────────── Configuration ─────────────────────────

    /// Set the same fee divisor for mint, burn and claim. Owner-only.
    pub fn set_fee_divisor(&mut self, caller: &Address, divisor: u64) -> Result<(), FundError> {
        self.set_fee_divisors(caller, FeeDivisors::uniform(divisor))
    }

    /// Set per-operation fee divisors. Owner-only; any triple is accepted.
    pub fn set_fee_divisors(
        &mut self,
        caller: &Address,
        divisors: FeeDivisors,
    ) -> Result<(), FundError> {
        self.only_owner(caller, "set_fee_divisors")?;
        self.fee_divisors = divisors;
        self.events.push(FundEvent::FeeDivisorsUpdated(divisors));
        info!(
            mint = divisors.mint,
            burn = divisors.burn,
            claim = divisors.claim,
            "Fee divisors updated"
        );
        Ok(())
    }

    /// Choose whether withheld fees stay staked or accrue to the owner. Owner-only.
    pub fn set_fee_retention(
        &mut self,
        caller: &Address,
        retention: FeeRetention,
    ) -> Result<(), FundError> {
        self.only_owner(caller, "set_fee_retention")?;
        self.fee_retention = retention;
        self.events.push(FundEvent::FeeRetentionUpdated(retention));
        info!(?retention, "Fee retention updated");
        Ok(())
    }

    pub fn set_exchange_endpoint(&mut self, caller: &Address, exchange: Address) -> Result<(), FundError> {
        self.set_endpoint(caller, Endpoint::Exchange, exchange)
    }

    pub fn set_reserve_asset(&mut self, caller: &Address, token: Address) -> Result<(), FundError> {
        self.set_endpoint(caller, Endpoint::ReserveAsset, token)
    }

    pub fn set_staking_endpoint(&mut self, caller: &Address, staking: Address) -> Result<(), FundError> {
        self.set_endpoint(caller, Endpoint::Staking, staking)
    }

    pub fn set_governance_endpoint(&mut self, caller: &Address, governance: Address) -> Result<(), FundError> {
        self.set_endpoint(caller, Endpoint::Governance, governance)
    }

    fn set_endpoint(
        &mut self,
        caller: &Address,
        endpoint: Endpoint,
        address: Address,
    ) -> Result<(), FundError> {
        self.only_owner(caller, "set_endpoint")?;
        let previous = self.registry.set(endpoint, address);
        if let Some(previous) = previous.filter(|previous| *previous != address) {
            warn!(%endpoint, %previous, %address, "Endpoint overwritten");
        }
        self.events.push(FundEvent::EndpointUpdated(EndpointUpdated {
            endpoint,
            previous,
            address,
        }));
        info!(%endpoint, %address, "Endpoint set");
        Ok(())
    }

    /// Register `handler` as the source of `currency` rewards. Owner-only.
    ///
    /// Returns the handler's index for [`Self::claim_reward`]. Re-registering a
    /// currency replaces its handler in place.
    pub fn add_reward_handler(
        &mut self,
        caller: &Address,
        handler: Address,
        currency: Address,
    ) -> Result<usize, FundError> {
        self.only_owner(caller, "add_reward_handler")?;
        let index = self.registry.upsert_reward_handler(handler, currency);
        self.events
            .push(FundEvent::RewardHandlerRegistered(RewardHandlerRegistered {
                index,
                handler,
                currency,
            }));
        info!(index, %handler, %currency, "Reward handler registered");
        Ok(index)
    }

    /// Stop minting and burning. Owner-only.
    pub fn pause(&mut self, caller: &Address) -> Result<(), FundError> {
        self.only_owner(caller, "pause")?;
        self.pause_guard.pause();
        self.events.push(FundEvent::Paused);
        info!("Fund paused");
        Ok(())
    }

    pub fn unpause(&mut self, caller: &Address) -> Result<(), FundError> {
        self.only_owner(caller, "unpause")?;
        self.pause_guard.unpause();
        self.events.push(FundEvent::Unpaused);
        info!("Fund unpaused");
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<(), FundError> {
        self.only_owner(caller, "transfer_ownership")?;
        let previous = self.access_control.owner();
        self.access_control.transfer_ownership(new_owner);
        self.events
            .push(FundEvent::OwnershipTransferred(OwnershipTransferred {
                previous,
                owner: new_owner,
            }));
        info!(%previous, owner = %new_owner, "Ownership transferred");
        Ok(())
    }

    // ───────────────────────── Allowances ─────────────────────────

    /// Let the staking service pull the fund's reserve asset. Owner-only.
    pub fn approve_staking_contract(
        &mut self,
        env: &mut dyn Environment,
        caller: &Address,
        reset_first: bool,
    ) -> Result<(), FundError> {
        self.only_owner(caller, "approve_staking_contract")?;
        self.transact(env, "approve_staking_contract", |fund, svc| {
            let token = fund.registry.require(Endpoint::ReserveAsset)?;
            let spender = fund.registry.verify(Endpoint::Staking, svc.staking.address())?;
            fund.grant_allowance(svc, token, spender, reset_first)
        })
    }

    /// Let the exchange pull the fund's `token` for swaps. Owner-only.
    pub fn approve_exchange_contract(
        &mut self,
        env: &mut dyn Environment,
        caller: &Address,
        token: Address,
        reset_first: bool,
    ) -> Result<(), FundError> {
        self.only_owner(caller, "approve_exchange_contract")?;
        self.transact(env, "approve_exchange_contract", |fund, svc| {
            let spender = fund.registry.verify(Endpoint::Exchange, svc.exchange.address())?;
            fund.grant_allowance(svc, token, spender, reset_first)
        })
    }

    fn grant_allowance(
        &mut self,
        svc: &mut Services<'_>,
        token: Address,
        spender: Address,
        reset_first: bool,
    ) -> Result<(), FundError> {
        self.allowances
            .authorize(&mut *svc.assets, &self.address, &token, &spender, reset_first)?;
        self.events.push(FundEvent::AllowanceGranted(AllowanceGranted {
            token,
            spender,
            reset_first,
        }));
        info!(%token, %spender, reset_first, "Allowance granted");
        Ok(())
    }

    // ───────────────────────── Mint ─────────────────────────

    /// Issue shares against `paid` native currency sent by `caller`.
    ///
    /// The payment is swapped into the reserve asset, the mint fee is
    /// withheld, and the reserve is staked.
    pub fn mint_with_currency(
        &mut self,
        env: &mut dyn Environment,
        caller: &Address,
        paid: Amount,
    ) -> Result<Issuance, FundError> {
        self.check_not_paused()?;
        if paid == 0 {
            return Err(FundError::ZeroAmount);
        }
        self.transact(env, "mint_with_currency", |fund, svc| {
            let reserve = fund.registry.require(Endpoint::ReserveAsset)?;
            fund.registry.verify(Endpoint::Staking, svc.staking.address())?;
            fund.registry.verify(Endpoint::Exchange, svc.exchange.address())?;
            let staked = fund.staked_reserve(&*svc.staking);

            svc.assets
                .transfer(&NATIVE, caller, &fund.address, paid)
                .map_err(FundError::external(Endpoint::AssetLedger))?;
            let acquired = svc
                .exchange
                .swap(&mut *svc.assets, &fund.address, &NATIVE, &reserve, paid)
                .map_err(FundError::external(Endpoint::Exchange))?;

            fund.issue(svc, caller, staked, NATIVE, paid, acquired)
        })
    }

    /// Issue shares against `amount` of reserve asset pulled from `caller`.
    ///
    /// The caller must have approved the fund to spend its reserve asset.
    pub fn mint_with_reserve_asset(
        &mut self,
        env: &mut dyn Environment,
        caller: &Address,
        amount: Amount,
    ) -> Result<Issuance, FundError> {
        self.check_not_paused()?;
        if amount == 0 {
            return Err(FundError::ZeroAmount);
        }
        self.transact(env, "mint_with_reserve_asset", |fund, svc| {
            let reserve = fund.registry.require(Endpoint::ReserveAsset)?;
            fund.registry.verify(Endpoint::Staking, svc.staking.address())?;
            let staked = fund.staked_reserve(&*svc.staking);

            svc.assets
                .transfer_from(&reserve, &fund.address, caller, &fund.address, amount)
                .map_err(FundError::external(Endpoint::AssetLedger))?;

            fund.issue(svc, caller, staked, reserve, amount, amount)
        })
    }

    /// Mint shares for `acquired` reserve now held by the fund and stake it.
    ///
    /// `staked` is the staked balance read before the deposit arrived.
    fn issue(
        &mut self,
        svc: &mut Services<'_>,
        caller: &Address,
        staked: Amount,
        paid_currency: Address,
        paid_amount: Amount,
        acquired: Amount,
    ) -> Result<Issuance, FundError> {
        let split = self.fee_divisors.compute_fee(acquired, FeeOperation::Mint);
        let supply = self.shares.total_supply();

        let shares = if supply == 0 {
            self.sweep_orphaned_stake(svc, staked)?;
            split.net
        } else {
            if staked == 0 {
                return Err(FundError::EmptyReserve);
            }
            mul_div(split.net, supply, staked).ok_or(FundError::Overflow)?
        };

        self.shares.mint(*caller, shares)?;
        // A bootstrap fee has no other holders to credit.
        let to_stake = self.retain_fee(acquired, split.fee, supply > 0)?;
        svc.staking
            .deposit(&mut *svc.assets, &self.address, to_stake)
            .map_err(FundError::external(Endpoint::Staking))?;

        self.events.push(FundEvent::SharesMinted(SharesMinted {
            holder: *caller,
            paid_currency,
            paid_amount,
            reserve_acquired: acquired,
            fee: split.fee,
            shares,
        }));
        info!(
            holder = %caller,
            %paid_currency,
            paid_amount,
            reserve_acquired = acquired,
            fee = split.fee,
            shares,
            "Shares minted"
        );
        Ok(Issuance {
            shares,
            reserve_acquired: acquired,
            fee: split.fee,
        })
    }

    // ───────────────────────── Burn ─────────────────────────

    /// Redeem `quantity` of `caller`'s shares for their proportional reserve.
    ///
    /// Shares are destroyed before any reserve leaves the staking service.
    pub fn burn(
        &mut self,
        env: &mut dyn Environment,
        caller: &Address,
        quantity: Amount,
        redeem_as: RedeemAs,
    ) -> Result<Redemption, FundError> {
        self.check_not_paused()?;
        if quantity == 0 {
            return Err(FundError::ZeroAmount);
        }
        self.transact(env, "burn", |fund, svc| {
            let reserve = fund.registry.require(Endpoint::ReserveAsset)?;
            fund.registry.verify(Endpoint::Staking, svc.staking.address())?;
            if redeem_as == RedeemAs::Currency {
                fund.registry.verify(Endpoint::Exchange, svc.exchange.address())?;
            }
            let staked = fund.staked_reserve(&*svc.staking);
            let supply = fund.shares.total_supply();

            fund.shares.burn(caller, quantity)?;
            if staked == 0 {
                return Err(FundError::EmptyReserve);
            }
            let gross = mul_div(quantity, staked, supply).ok_or(FundError::Overflow)?;
            let split = fund.fee_divisors.compute_fee(gross, FeeOperation::Burn);

            // A pooled fee is simply never unstaked. Once the last share is
            // gone nobody is left to credit, so the whole stake comes out.
            let pooled = fund.fee_retention == FeeRetention::Pool && fund.shares.total_supply() > 0;
            let to_unstake = if pooled {
                split.net
            } else {
                fund.accrue_fee(split.fee)?;
                gross
            };
            if to_unstake > 0 {
                svc.staking
                    .withdraw(&mut *svc.assets, &fund.address, to_unstake)
                    .map_err(FundError::external(Endpoint::Staking))?;
            }

            let (payout_currency, payout) = match redeem_as {
                RedeemAs::ReserveAsset => (reserve, split.net),
                RedeemAs::Currency if split.net == 0 => (NATIVE, 0),
                RedeemAs::Currency => {
                    let received = svc
                        .exchange
                        .swap(&mut *svc.assets, &fund.address, &reserve, &NATIVE, split.net)
                        .map_err(FundError::external(Endpoint::Exchange))?;
                    (NATIVE, received)
                }
            };
            if payout > 0 {
                svc.assets
                    .transfer(&payout_currency, &fund.address, caller, payout)
                    .map_err(FundError::external(Endpoint::AssetLedger))?;
            }

            fund.events.push(FundEvent::SharesBurned(SharesBurned {
                holder: *caller,
                shares: quantity,
                gross_reserve: gross,
                fee: split.fee,
                payout_currency,
                payout,
            }));
            info!(
                holder = %caller,
                shares = quantity,
                gross_reserve = gross,
                fee = split.fee,
                %payout_currency,
                payout,
                "Shares burned"
            );
            Ok(Redemption {
                gross_reserve: gross,
                fee: split.fee,
                payout_currency,
                payout,
            })
        })
    }

    // ───────────────────────── Rewards ─────────────────────────

    /// Claim rewards for `campaign` and restake them. Owner-only.
    ///
    /// `handler_indices[i]` selects a row of the reward handler table and
    /// `amounts[i]` is the amount claimed from it. Non-reserve rewards are
    /// swapped into the reserve asset first; the claim fee is withheld from
    /// the reserve acquired.
    pub fn claim_reward(
        &mut self,
        env: &mut dyn Environment,
        caller: &Address,
        campaign: CampaignId,
        handler_indices: &[usize],
        amounts: &[Amount],
    ) -> Result<Vec<RewardClaim>, FundError> {
        self.only_owner(caller, "claim_reward")?;
        if handler_indices.len() != amounts.len() {
            return Err(FundError::LengthMismatch {
                handlers: handler_indices.len(),
                amounts: amounts.len(),
            });
        }
        let mut selected = Vec::with_capacity(handler_indices.len());
        for (&index, &amount) in handler_indices.iter().zip(amounts) {
            let entry = *self
                .registry
                .reward_handler(index)
                .ok_or(FundError::UnknownRewardHandler { index })?;
            if amount == 0 {
                return Err(FundError::ZeroAmount);
            }
            selected.push((entry, amount));
        }

        self.transact(env, "claim_reward", |fund, svc| {
            let reserve = fund.registry.require(Endpoint::ReserveAsset)?;
            fund.registry.verify(Endpoint::Staking, svc.staking.address())?;

            let mut claims = Vec::with_capacity(selected.len());
            for (entry, amount) in selected {
                let handler = svc
                    .reward_handlers
                    .handler_mut(&entry.handler)
                    .ok_or(FundError::EndpointNotConfigured(Endpoint::RewardHandler))?;
                let claimed = handler
                    .claim_reward(&mut *svc.assets, &fund.address, campaign, amount)
                    .map_err(FundError::external(Endpoint::RewardHandler))?;

                let acquired = if entry.currency == reserve || claimed == 0 {
                    claimed
                } else {
                    fund.registry.verify(Endpoint::Exchange, svc.exchange.address())?;
                    svc.exchange
                        .swap(&mut *svc.assets, &fund.address, &entry.currency, &reserve, claimed)
                        .map_err(FundError::external(Endpoint::Exchange))?
                };

                let split = fund.fee_divisors.compute_fee(acquired, FeeOperation::Claim);
                let holders = fund.shares.total_supply() > 0;
                let to_stake = fund.retain_fee(acquired, split.fee, holders)?;
                if to_stake > 0 {
                    svc.staking
                        .deposit(&mut *svc.assets, &fund.address, to_stake)
                        .map_err(FundError::external(Endpoint::Staking))?;
                }

                fund.events.push(FundEvent::RewardClaimed(RewardClaimed {
                    campaign,
                    handler: entry.handler,
                    currency: entry.currency,
                    claimed,
                    reserve_acquired: acquired,
                    fee: split.fee,
                }));
                info!(
                    %campaign,
                    handler = %entry.handler,
                    currency = %entry.currency,
                    claimed,
                    reserve_acquired = acquired,
                    fee = split.fee,
                    "Reward claimed and restaked"
                );
                claims.push(RewardClaim {
                    handler: entry.handler,
                    currency: entry.currency,
                    claimed,
                    reserve_acquired: acquired,
                    fee: split.fee,
                });
            }
            Ok(claims)
        })
    }

    // ───────────────────────── Governance ─────────────────────────

    /// Vote with the fund's staked weight. Owner-only.
    pub fn vote(
        &mut self,
        env: &mut dyn Environment,
        caller: &Address,
        campaign: CampaignId,
        option: VoteOption,
    ) -> Result<(), FundError> {
        self.only_owner(caller, "vote")?;
        self.transact(env, "vote", |fund, svc| {
            fund.registry
                .verify(Endpoint::Governance, svc.governance.address())?;
            svc.governance
                .vote(&fund.address, campaign, option)
                .map_err(FundError::external(Endpoint::Governance))?;
            fund.events
                .push(FundEvent::VoteCast(VoteCast { campaign, option }));
            info!(%campaign, %option, "Vote cast");
            Ok(())
        })
    }

    // ───────────────────────── Treasury ─────────────────────────

    /// Send accrued treasury fees to `recipient`. Owner-only.
    pub fn withdraw_fees(
        &mut self,
        env: &mut dyn Environment,
        caller: &Address,
        recipient: Address,
    ) -> Result<Amount, FundError> {
        self.only_owner(caller, "withdraw_fees")?;
        if self.accrued_fees == 0 {
            return Err(FundError::ZeroAmount);
        }
        self.transact(env, "withdraw_fees", |fund, svc| {
            let reserve = fund.registry.require(Endpoint::ReserveAsset)?;
            let amount = fund.accrued_fees;
            fund.accrued_fees = 0;
            svc.assets
                .transfer(&reserve, &fund.address, &recipient, amount)
                .map_err(FundError::external(Endpoint::AssetLedger))?;
            fund.events.push(FundEvent::FeesWithdrawn(FeesWithdrawn {
                recipient,
                amount,
            }));
            info!(%recipient, amount, "Fees withdrawn");
            Ok(amount)
        })
    }

    // ───────────────────────── Views ─────────────────────────

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.shares.balance_of(holder)
    }

    pub fn total_supply(&self) -> Amount {
        self.shares.total_supply()
    }

    /// Reserve staked on the fund's behalf, as reported by `staking`.
    ///
    /// `staking` must be the registered staking endpoint.
    pub fn fund_reserve_balance(&self, staking: &dyn StakingService) -> Result<Amount, FundError> {
        self.registry.verify(Endpoint::Staking, staking.address())?;
        Ok(self.staked_reserve(staking))
    }

    /// Staked reserve per share in token units; `None` while no shares exist.
    pub fn nav_per_share(&self, staking: &dyn StakingService) -> Result<Option<Decimal>, FundError> {
        self.registry.verify(Endpoint::Staking, staking.address())?;
        let supply = self.shares.total_supply();
        if supply == 0 {
            return Ok(None);
        }
        let staked = self.staked_reserve(staking);
        ratio(staked, supply).map(Some).ok_or(FundError::Overflow)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.access_control.owner()
    }

    pub fn mandate(&self) -> &str {
        &self.mandate
    }

    pub fn fee_divisors(&self) -> FeeDivisors {
        self.fee_divisors
    }

    pub fn fee_retention(&self) -> FeeRetention {
        self.fee_retention
    }

    /// Reserve withheld as fees and not yet withdrawn.
    pub fn accrued_fees(&self) -> Amount {
        self.accrued_fees
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn allowance_state(&self, token: &Address, spender: &Address) -> AllowanceState {
        self.allowances.state(token, spender)
    }

    pub fn is_paused(&self) -> bool {
        self.pause_guard.is_paused()
    }

    /// Get all emitted events.
    pub fn events(&self) -> &[FundEvent] {
        &self.events
    }

    /// Drain events (for processing).
    pub fn drain_events(&mut self) -> Vec<FundEvent> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Internal ─────────────────────────

    fn only_owner(&self, caller: &Address, action: &'static str) -> Result<(), FundError> {
        if !self.access_control.is_owner(caller) {
            warn!(%caller, action, "Privileged call rejected");
            return Err(FundError::Unauthorized);
        }
        Ok(())
    }

    fn check_not_paused(&self) -> Result<(), FundError> {
        if self.pause_guard.is_paused() {
            return Err(FundError::Paused);
        }
        Ok(())
    }

    fn staked_reserve(&self, staking: &dyn StakingService) -> Amount {
        let staked = staking.staked_balance(&self.address);
        debug!(staked, supply = self.shares.total_supply(), "Pool state read");
        staked
    }

    /// Amount of `acquired` reserve to stake.
    ///
    /// `fee` stays staked only under pool retention and while `holders` exist
    /// to benefit from it; otherwise it accrues to the treasury.
    fn retain_fee(&mut self, acquired: Amount, fee: Amount, holders: bool) -> Result<Amount, FundError> {
        if holders && self.fee_retention == FeeRetention::Pool {
            return Ok(acquired);
        }
        self.accrue_fee(fee)?;
        Ok(acquired - fee)
    }

    /// Move stake left behind with no shares outstanding into the treasury,
    /// so a bootstrap minter only receives what it deposits.
    fn sweep_orphaned_stake(&mut self, svc: &mut Services<'_>, staked: Amount) -> Result<(), FundError> {
        if staked == 0 {
            return Ok(());
        }
        svc.staking
            .withdraw(&mut *svc.assets, &self.address, staked)
            .map_err(FundError::external(Endpoint::Staking))?;
        self.accrue_fee(staked)?;
        info!(amount = staked, "Orphaned stake moved to treasury");
        Ok(())
    }

    fn accrue_fee(&mut self, fee: Amount) -> Result<(), FundError> {
        self.accrued_fees = self
            .accrued_fees
            .checked_add(fee)
            .ok_or(FundError::Overflow)?;
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            shares: self.shares.clone(),
            allowances: self.allowances.clone(),
            accrued_fees: self.accrued_fees,
            event_count: self.events.len(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.shares = snapshot.shares;
        self.allowances = snapshot.allowances;
        self.accrued_fees = snapshot.accrued_fees;
        self.events.truncate(snapshot.event_count);
    }

    /// Run `body` as one all-or-nothing transaction against `env`.
    fn transact<T, F>(
        &mut self,
        env: &mut dyn Environment,
        operation: &'static str,
        body: F,
    ) -> Result<T, FundError>
    where
        F: FnOnce(&mut Self, &mut Services<'_>) -> Result<T, FundError>,
    {
        if !self.reentrancy_guard.acquire() {
            return Err(FundError::Reentrancy);
        }
        let snapshot = self.snapshot();
        env.checkpoint();

        let result = {
            let mut services = env.services();
            body(self, &mut services)
        };

        match &result {
            Ok(_) => env.commit(),
            Err(error) => {
                env.rollback();
                self.restore(snapshot);
                warn!(operation, %error, "Operation rolled back");
            }
        }
        self.reentrancy_guard.release();
        result
    }
}
