//! In-memory stand-ins for the fund's external collaborators
//!
//! Used by the tests and by simulations that drive a [`Fund`](crate::fund::Fund)
//! without a live network. Every stand-in has switches to make its calls
//! fail, so rollback paths can be exercised.

use fund_types::fee::{FeeDivisors, FeeRetention};
use fund_types::ids::{Address, CampaignId, VoteOption};
use fund_types::numeric::{mul_div, Amount};
use std::collections::{HashMap, HashSet};

use crate::config::{ApprovalConfig, EndpointConfig, FundConfig};
use crate::errors::ServiceError;
use crate::registry::RewardHandlerEntry;
use crate::services::{
    AssetLedger, Environment, ExchangeService, GovernanceService, RewardHandler,
    RewardHandlerLookup, Services, StakingService,
};

// ───────────────────────── Asset ledger ─────────────────────────

/// Balance book for the native currency and any number of tokens.
///
/// In strict mode it refuses to change an allowance from one non-zero
/// value to another, like tokens that require a reset to zero first.
#[derive(Debug, Clone, Default)]
pub struct MockAssetLedger {
    /// (currency, holder) -> balance
    balances: HashMap<(Address, Address), Amount>,
    /// (currency, owner, spender) -> allowance
    allowances: HashMap<(Address, Address, Address), Amount>,
    strict_allowances: bool,
}

impl MockAssetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that rejects non-zero to non-zero allowance changes.
    pub fn strict() -> Self {
        Self {
            strict_allowances: true,
            ..Self::default()
        }
    }

    pub fn set_strict_allowances(&mut self, strict: bool) {
        self.strict_allowances = strict;
    }

    /// Create `amount` of `currency` out of thin air for `holder`.
    pub fn credit(&mut self, currency: &Address, holder: &Address, amount: Amount) {
        *self.balances.entry((*currency, *holder)).or_insert(0) += amount;
    }

    fn debit(&mut self, currency: &Address, holder: &Address, amount: Amount) -> Result<(), ServiceError> {
        let available = self.balance_of(currency, holder);
        if available < amount {
            return Err(ServiceError::InsufficientFunds {
                currency: *currency,
                holder: *holder,
                required: amount,
                available,
            });
        }
        self.balances.insert((*currency, *holder), available - amount);
        Ok(())
    }
}

impl AssetLedger for MockAssetLedger {
    fn balance_of(&self, currency: &Address, holder: &Address) -> Amount {
        self.balances.get(&(*currency, *holder)).copied().unwrap_or(0)
    }

    fn allowance(&self, currency: &Address, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*currency, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn approve(
        &mut self,
        currency: &Address,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), ServiceError> {
        if currency.is_native() {
            return Err(ServiceError::NativeAllowance);
        }
        let current = self.allowance(currency, owner, spender);
        if self.strict_allowances && current != 0 && amount != 0 {
            return Err(ServiceError::NonZeroAllowance);
        }
        self.allowances.insert((*currency, *owner, *spender), amount);
        Ok(())
    }

    fn transfer(
        &mut self,
        currency: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), ServiceError> {
        self.balance_of(currency, to)
            .checked_add(amount)
            .ok_or(ServiceError::Overflow)?;
        self.debit(currency, from, amount)?;
        // Read after the debit so a self-transfer nets out.
        let credited = self.balance_of(currency, to) + amount;
        self.balances.insert((*currency, *to), credited);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        currency: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), ServiceError> {
        if currency.is_native() {
            return Err(ServiceError::NativeAllowance);
        }
        let approved = self.allowance(currency, from, spender);
        if approved < amount {
            return Err(ServiceError::AllowanceExceeded {
                spender: *spender,
                required: amount,
                approved,
            });
        }
        self.transfer(currency, from, to, amount)?;
        // An unlimited allowance is never consumed.
        if approved != Amount::MAX {
            self.allowances
                .insert((*currency, *from, *spender), approved - amount);
        }
        Ok(())
    }
}

// ───────────────────────── Staking ─────────────────────────

#[derive(Debug, Clone)]
pub struct MockStaking {
    address: Address,
    token: Address,
    staked: HashMap<Address, Amount>,
    rejecting: bool,
}

impl MockStaking {
    pub fn new(address: Address, token: Address) -> Self {
        Self {
            address,
            token,
            staked: HashMap::new(),
            rejecting: false,
        }
    }

    pub fn token(&self) -> Address {
        self.token
    }

    /// Make every subsequent deposit and withdrawal fail.
    pub fn set_rejecting(&mut self, rejecting: bool) {
        self.rejecting = rejecting;
    }

    /// Credit staking yield to `staker` without a deposit.
    ///
    /// The matching reserve must be credited to the staking address separately.
    pub fn add_stake(&mut self, staker: &Address, amount: Amount) {
        *self.staked.entry(*staker).or_insert(0) += amount;
    }

    fn check_open(&self) -> Result<(), ServiceError> {
        if self.rejecting {
            return Err(ServiceError::Rejected {
                reason: "staking unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl StakingService for MockStaking {
    fn address(&self) -> Address {
        self.address
    }

    fn deposit(
        &mut self,
        assets: &mut dyn AssetLedger,
        staker: &Address,
        amount: Amount,
    ) -> Result<(), ServiceError> {
        self.check_open()?;
        assets.transfer_from(&self.token, &self.address, staker, &self.address, amount)?;
        let balance = self.staked.entry(*staker).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(ServiceError::Overflow)?;
        Ok(())
    }

    fn withdraw(
        &mut self,
        assets: &mut dyn AssetLedger,
        staker: &Address,
        amount: Amount,
    ) -> Result<(), ServiceError> {
        self.check_open()?;
        let available = self.staked_balance(staker);
        if available < amount {
            return Err(ServiceError::InsufficientFunds {
                currency: self.token,
                holder: *staker,
                required: amount,
                available,
            });
        }
        assets.transfer(&self.token, &self.address, staker, amount)?;
        self.staked.insert(*staker, available - amount);
        Ok(())
    }

    fn staked_balance(&self, staker: &Address) -> Amount {
        self.staked.get(staker).copied().unwrap_or(0)
    }
}

// ───────────────────────── Exchange ─────────────────────────

/// Fixed-rate exchange paying out of its own inventory.
#[derive(Debug, Clone)]
pub struct MockExchange {
    address: Address,
    /// (src, dest) -> (numerator, denominator)
    rates: HashMap<(Address, Address), (Amount, Amount)>,
    rejecting: bool,
}

impl MockExchange {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            rates: HashMap::new(),
            rejecting: false,
        }
    }

    /// Quote `numerator / denominator` units of `dest` per unit of `src`.
    pub fn set_rate(&mut self, src: Address, dest: Address, numerator: Amount, denominator: Amount) {
        self.rates.insert((src, dest), (numerator, denominator));
    }

    pub fn set_rejecting(&mut self, rejecting: bool) {
        self.rejecting = rejecting;
    }
}

impl ExchangeService for MockExchange {
    fn address(&self) -> Address {
        self.address
    }

    fn swap(
        &mut self,
        assets: &mut dyn AssetLedger,
        trader: &Address,
        src: &Address,
        dest: &Address,
        amount: Amount,
    ) -> Result<Amount, ServiceError> {
        if self.rejecting {
            return Err(ServiceError::Rejected {
                reason: "exchange unavailable".to_string(),
            });
        }
        let (numerator, denominator) =
            self.rates
                .get(&(*src, *dest))
                .copied()
                .ok_or(ServiceError::UnsupportedPair {
                    src: *src,
                    dest: *dest,
                })?;

        if src.is_native() {
            assets.transfer(src, trader, &self.address, amount)?;
        } else {
            assets.transfer_from(src, &self.address, trader, &self.address, amount)?;
        }

        let received = mul_div(amount, numerator, denominator).ok_or(ServiceError::Overflow)?;
        assets.transfer(dest, &self.address, trader, received)?;
        Ok(received)
    }
}

// ───────────────────────── Governance ─────────────────────────

#[derive(Debug, Clone)]
pub struct MockGovernance {
    address: Address,
    votes: Vec<(Address, CampaignId, VoteOption)>,
    closed: HashSet<CampaignId>,
}

impl MockGovernance {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            votes: Vec::new(),
            closed: HashSet::new(),
        }
    }

    /// Reject further votes in `campaign`.
    pub fn close_campaign(&mut self, campaign: CampaignId) {
        self.closed.insert(campaign);
    }

    /// Votes received, in order.
    pub fn votes(&self) -> &[(Address, CampaignId, VoteOption)] {
        &self.votes
    }
}

impl GovernanceService for MockGovernance {
    fn address(&self) -> Address {
        self.address
    }

    fn vote(
        &mut self,
        voter: &Address,
        campaign: CampaignId,
        option: VoteOption,
    ) -> Result<(), ServiceError> {
        if self.closed.contains(&campaign) {
            return Err(ServiceError::Rejected {
                reason: format!("campaign {campaign} is closed"),
            });
        }
        self.votes.push((*voter, campaign, option));
        Ok(())
    }
}

// ───────────────────────── Reward handlers ─────────────────────────

/// Pays rewards in one currency from its own balance, once per staker and campaign.
#[derive(Debug, Clone)]
pub struct MockRewardHandler {
    address: Address,
    currency: Address,
    claimed: HashSet<(Address, CampaignId)>,
}

impl MockRewardHandler {
    pub fn new(address: Address, currency: Address) -> Self {
        Self {
            address,
            currency,
            claimed: HashSet::new(),
        }
    }
}

impl RewardHandler for MockRewardHandler {
    fn address(&self) -> Address {
        self.address
    }

    fn currency(&self) -> Address {
        self.currency
    }

    fn claim_reward(
        &mut self,
        assets: &mut dyn AssetLedger,
        staker: &Address,
        campaign: CampaignId,
        amount: Amount,
    ) -> Result<Amount, ServiceError> {
        if self.claimed.contains(&(*staker, campaign)) {
            return Err(ServiceError::AlreadyClaimed { campaign });
        }
        assets.transfer(&self.currency, &self.address, staker, amount)?;
        self.claimed.insert((*staker, campaign));
        Ok(amount)
    }
}

impl RewardHandlerLookup for Vec<MockRewardHandler> {
    fn handler_mut(&mut self, at: &Address) -> Option<&mut dyn RewardHandler> {
        self.iter_mut()
            .find(|handler| handler.address == *at)
            .map(|handler| handler as &mut dyn RewardHandler)
    }
}

// ───────────────────────── Chain ─────────────────────────

#[derive(Debug, Clone)]
struct Snapshot {
    assets: MockAssetLedger,
    staking: MockStaking,
    exchange: MockExchange,
    governance: MockGovernance,
    reward_handlers: Vec<MockRewardHandler>,
}

/// A complete in-memory environment with checkpoint/rollback.
///
/// Service addresses are derived from fixed labels (`"staking"`,
/// `"exchange"`, `"governance"`, `"reserve-asset"`).
#[derive(Debug, Clone)]
pub struct MockChain {
    pub assets: MockAssetLedger,
    pub staking: MockStaking,
    pub exchange: MockExchange,
    pub governance: MockGovernance,
    pub reward_handlers: Vec<MockRewardHandler>,
    checkpoints: Vec<Snapshot>,
}

impl MockChain {
    pub fn new() -> Self {
        let reserve = Address::derive("reserve-asset");
        Self {
            assets: MockAssetLedger::new(),
            staking: MockStaking::new(Address::derive("staking"), reserve),
            exchange: MockExchange::new(Address::derive("exchange")),
            governance: MockGovernance::new(Address::derive("governance")),
            reward_handlers: Vec::new(),
            checkpoints: Vec::new(),
        }
    }

    pub fn reserve_asset(&self) -> Address {
        self.staking.token()
    }

    /// Deploy a reward handler paying in `currency`; returns its address.
    pub fn add_reward_handler(&mut self, currency: Address) -> Address {
        let address = Address::derive(&format!("reward-handler-{}", self.reward_handlers.len()));
        self.reward_handlers
            .push(MockRewardHandler::new(address, currency));
        address
    }

    /// Quote `currency` at `numerator / denominator` reserve per unit, both
    /// ways, and stock the exchange with `inventory` of each side.
    pub fn set_market(
        &mut self,
        currency: Address,
        numerator: Amount,
        denominator: Amount,
        inventory: Amount,
    ) {
        let reserve = self.reserve_asset();
        let exchange = self.exchange.address();
        self.exchange.set_rate(currency, reserve, numerator, denominator);
        self.exchange.set_rate(reserve, currency, denominator, numerator);
        self.assets.credit(&currency, &exchange, inventory);
        self.assets.credit(&reserve, &exchange, inventory);
    }

    /// Deployment configuration pointing at this chain's services.
    pub fn fund_config(&self, mandate: &str) -> FundConfig {
        FundConfig {
            mandate: mandate.to_string(),
            fee_divisors: FeeDivisors::DISABLED,
            fee_retention: FeeRetention::default(),
            endpoints: EndpointConfig {
                exchange: Some(self.exchange.address()),
                reserve_asset: Some(self.reserve_asset()),
                staking: Some(self.staking.address()),
                governance: Some(self.governance.address()),
            },
            reward_handlers: self
                .reward_handlers
                .iter()
                .map(|handler| RewardHandlerEntry {
                    handler: handler.address(),
                    currency: handler.currency(),
                })
                .collect(),
            approvals: ApprovalConfig {
                staking: true,
                exchange_tokens: vec![self.reserve_asset()],
            },
        }
    }

    /// Number of open checkpoints.
    pub fn checkpoint_depth(&self) -> usize {
        self.checkpoints.len()
    }
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for MockChain {
    fn services(&mut self) -> Services<'_> {
        Services {
            assets: &mut self.assets,
            staking: &mut self.staking,
            exchange: &mut self.exchange,
            governance: &mut self.governance,
            reward_handlers: &mut self.reward_handlers,
        }
    }

    fn checkpoint(&mut self) {
        self.checkpoints.push(Snapshot {
            assets: self.assets.clone(),
            staking: self.staking.clone(),
            exchange: self.exchange.clone(),
            governance: self.governance.clone(),
            reward_handlers: self.reward_handlers.clone(),
        });
    }

    fn commit(&mut self) {
        self.checkpoints.pop();
    }

    fn rollback(&mut self) {
        if let Some(snapshot) = self.checkpoints.pop() {
            self.assets = snapshot.assets;
            self.staking = snapshot.staking;
            self.exchange = snapshot.exchange;
            self.governance = snapshot.governance;
            self.reward_handlers = snapshot.reward_handlers;
        }
    }
}
