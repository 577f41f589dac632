//! Fund lifecycle tests
//!
//! Walks a fund through deployment, minting in both currencies, redeeming
//! both ways, voting and reward reinvestment, then checks the share
//! arithmetic properties with proptest.

use fund_contracts::config::{deploy, FundConfig};
use fund_contracts::errors::FundError;
use fund_contracts::events::FundEvent;
use fund_contracts::fund::{Fund, RedeemAs};
use fund_contracts::mock::MockChain;
use fund_contracts::services::{AssetLedger, ExchangeService, StakingService};
use fund_types::prelude::*;

const NATIVE: Address = Address::NATIVE_CURRENCY;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn owner() -> Address {
    Address::derive("deployer")
}

fn user() -> Address {
    Address::derive("user")
}

/// Deployed fund on a chain quoting 1 native = 500 reserve, with a native
/// reward handler holding 1 native.
fn setup(divisors: FeeDivisors) -> (MockChain, Fund) {
    init_tracing();
    let mut chain = MockChain::new();
    chain.set_market(NATIVE, 500, 1, 1_000_000 * ONE);
    let handler = chain.add_reward_handler(NATIVE);
    chain.assets.credit(&NATIVE, &handler, ONE);

    let mut config = chain.fund_config("Stakers");
    config.fee_divisors = divisors;
    let fund = deploy(&mut chain, Address::derive("fund"), owner(), &config).unwrap();
    (chain, fund)
}

fn give_reserve(chain: &mut MockChain, fund: &Fund, holder: &Address, amount: Amount) {
    let reserve = chain.reserve_asset();
    chain.assets.credit(&reserve, holder, amount);
    chain
        .assets
        .approve(&reserve, holder, &fund.address(), amount)
        .unwrap();
}

// ═══════════════════════════════════════════════════════════════════
// Deployment
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_deploy_from_json() {
    let mut chain = MockChain::new();
    let json = serde_json::to_string(&chain.fund_config("Stakers")).unwrap();

    let config = FundConfig::from_json_str(&json).unwrap();
    let fund = deploy(&mut chain, Address::derive("fund"), owner(), &config).unwrap();

    assert_eq!(fund.owner(), owner());
    assert_eq!(fund.total_supply(), 0);
    assert!(fund
        .events()
        .iter()
        .any(|event| matches!(event, FundEvent::AllowanceGranted(_))));
}

#[test]
fn test_staking_allowance_granted() {
    let (chain, fund) = setup(FeeDivisors::uniform(250));
    let reserve = chain.reserve_asset();
    assert!(chain.assets.allowance(&reserve, &fund.address(), &chain.staking.address()) > 0);
    assert!(chain.assets.allowance(&reserve, &fund.address(), &chain.exchange.address()) > 0);
}

#[test]
fn test_native_reward_handler_registered() {
    let (mut chain, mut fund) = setup(FeeDivisors::uniform(250));
    assert_eq!(fund.registry().reward_handler(0).unwrap().currency, NATIVE);

    // Re-registering the native currency keeps index 0.
    let replacement = chain.add_reward_handler(NATIVE);
    assert_eq!(fund.add_reward_handler(&owner(), replacement, NATIVE), Ok(0));
    assert_eq!(fund.registry().reward_handlers().len(), 1);
}

// ═══════════════════════════════════════════════════════════════════
// Mint & Burn
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_mint_with_currency() {
    let (mut chain, mut fund) = setup(FeeDivisors::uniform(250));
    let paid = ONE / 100;
    chain.assets.credit(&NATIVE, &user(), paid);

    let issued = fund.mint_with_currency(&mut chain, &user(), paid).unwrap();

    assert_eq!(issued.reserve_acquired, 5 * ONE);
    assert_eq!(issued.fee, 5 * ONE / 250);
    assert_eq!(fund.balance_of(&user()), issued.shares);
    assert!(issued.shares > 0);
    // The first holder's mint fee has nobody else to credit.
    assert_eq!(fund.fund_reserve_balance(&chain.staking).unwrap(), 5 * ONE - issued.fee);
    assert_eq!(fund.accrued_fees(), issued.fee);
}

#[test]
fn test_mint_with_reserve_after_approval() {
    let (mut chain, mut fund) = setup(FeeDivisors::uniform(250));
    give_reserve(&mut chain, &fund, &user(), 10 * ONE);

    let issued = fund.mint_with_reserve_asset(&mut chain, &user(), 10 * ONE).unwrap();

    assert!(issued.shares > 0);
    assert_eq!(fund.balance_of(&user()), issued.shares);
}

#[test]
fn test_mint_with_reserve_without_approval_fails() {
    let (mut chain, mut fund) = setup(FeeDivisors::uniform(250));
    let reserve = chain.reserve_asset();
    chain.assets.credit(&reserve, &user(), 10 * ONE);

    let result = fund.mint_with_reserve_asset(&mut chain, &user(), 10 * ONE);

    assert!(matches!(result, Err(FundError::ExternalCallFailed { .. })));
    assert_eq!(fund.total_supply(), 0);
}

#[test]
fn test_burn_for_currency_then_reserve() {
    let (mut chain, mut fund) = setup(FeeDivisors::uniform(250));
    let reserve = chain.reserve_asset();
    chain.assets.credit(&NATIVE, &user(), ONE / 100);
    fund.mint_with_currency(&mut chain, &user(), ONE / 100).unwrap();
    give_reserve(&mut chain, &fund, &user(), 10 * ONE);
    fund.mint_with_reserve_asset(&mut chain, &user(), 10 * ONE).unwrap();

    let shares = fund.balance_of(&user());
    let to_burn = shares / 2;
    let native_before = chain.assets.balance_of(&NATIVE, &user());
    let in_currency = fund
        .burn(&mut chain, &user(), to_burn, RedeemAs::Currency)
        .unwrap();
    assert_eq!(in_currency.payout_currency, NATIVE);
    assert!(chain.assets.balance_of(&NATIVE, &user()) > native_before);

    let reserve_before = chain.assets.balance_of(&reserve, &user());
    let remaining = fund.balance_of(&user());
    let in_reserve = fund
        .burn(&mut chain, &user(), remaining, RedeemAs::ReserveAsset)
        .unwrap();
    assert_eq!(in_reserve.payout_currency, reserve);
    assert_eq!(
        chain.assets.balance_of(&reserve, &user()),
        reserve_before + in_reserve.payout
    );
    assert_eq!(fund.total_supply(), 0);
    // The last burn empties the stake; its fee goes to the treasury.
    assert_eq!(fund.fund_reserve_balance(&chain.staking).unwrap(), 0);
    assert!(fund.accrued_fees() >= in_reserve.fee);
}

// ═══════════════════════════════════════════════════════════════════
// Governance & Rewards
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_vote_by_owner() {
    let (mut chain, mut fund) = setup(FeeDivisors::uniform(250));
    fund.vote(&mut chain, &owner(), CampaignId::new(1), VoteOption::new(1))
        .unwrap();
    assert_eq!(chain.governance.votes().len(), 1);
}

#[test]
fn test_vote_by_non_owner_reverts() {
    let (mut chain, mut fund) = setup(FeeDivisors::uniform(250));
    let result = fund.vote(&mut chain, &user(), CampaignId::new(1), VoteOption::new(1));
    assert_eq!(result, Err(FundError::Unauthorized));
}

#[test]
fn test_claim_reward_increases_staked_balance() {
    let (mut chain, mut fund) = setup(FeeDivisors::uniform(250));
    let before = fund.fund_reserve_balance(&chain.staking).unwrap();

    fund.claim_reward(&mut chain, &owner(), CampaignId::new(1), &[0], &[100])
        .unwrap();

    assert!(fund.fund_reserve_balance(&chain.staking).unwrap() > before);
}

#[test]
fn test_claim_reward_by_non_owner_reverts() {
    let (mut chain, mut fund) = setup(FeeDivisors::uniform(250));
    let result = fund.claim_reward(&mut chain, &user(), CampaignId::new(1), &[0], &[100]);
    assert_eq!(result, Err(FundError::Unauthorized));
}

#[test]
fn test_claim_raises_nav_for_holders() {
    let (mut chain, mut fund) = setup(FeeDivisors::DISABLED);
    give_reserve(&mut chain, &fund, &user(), 1_000 * ONE);
    fund.mint_with_reserve_asset(&mut chain, &user(), 1_000 * ONE)
        .unwrap();
    let nav_before = fund.nav_per_share(&chain.staking).unwrap().unwrap();

    fund.claim_reward(&mut chain, &owner(), CampaignId::new(1), &[0], &[ONE])
        .unwrap();

    let nav_after = fund.nav_per_share(&chain.staking).unwrap().unwrap();
    assert!(nav_after > nav_before);

    let redemption = fund
        .burn(&mut chain, &user(), 1_000 * ONE, RedeemAs::ReserveAsset)
        .unwrap();
    assert_eq!(redemption.payout, 1_500 * ONE);
}

// ═══════════════════════════════════════════════════════════════════
// Share Arithmetic (Proptest)
// ═══════════════════════════════════════════════════════════════════

mod properties {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    /// Pool seeded with `supply` shares backed by `supply + yield_` staked reserve.
    fn seeded_pool(supply: Amount, yield_: Amount) -> (MockChain, Fund) {
        let (mut chain, mut fund) = setup(FeeDivisors::DISABLED);
        let seed = Address::derive("seed");
        give_reserve(&mut chain, &fund, &seed, supply);
        fund.mint_with_reserve_asset(&mut chain, &seed, supply).unwrap();
        if yield_ > 0 {
            let reserve = chain.reserve_asset();
            let staking = chain.staking.address();
            chain.assets.credit(&reserve, &staking, yield_);
            chain.staking.add_stake(&fund.address(), yield_);
        }
        (chain, fund)
    }

    proptest! {
        /// Bootstrap mint issues shares one to one.
        #[test]
        fn bootstrap_mint_one_to_one(amount in 1u128..=1_000_000 * ONE) {
            let (mut chain, mut fund) = setup(FeeDivisors::DISABLED);
            give_reserve(&mut chain, &fund, &user(), amount);

            let issued = fund.mint_with_reserve_asset(&mut chain, &user(), amount).unwrap();

            prop_assert_eq!(issued.shares, amount);
            prop_assert_eq!(fund.fund_reserve_balance(&chain.staking).unwrap(), amount);
        }

        /// Burning q of S shares pays q * B / S and leaves S - q.
        #[test]
        fn proportional_burn(
            supply in 1_000u128..=1_000_000 * ONE,
            yield_bps in 0u128..=10_000,
            burn_bps in 1u128..=10_000,
        ) {
            let yield_ = supply * yield_bps / 10_000;
            let (mut chain, mut fund) = seeded_pool(supply, yield_);
            let staked = supply + yield_;
            let seed = Address::derive("seed");
            let quantity = (supply * burn_bps / 10_000).max(1);

            let redemption = fund
                .burn(&mut chain, &seed, quantity, RedeemAs::ReserveAsset)
                .unwrap();

            prop_assert_eq!(redemption.gross_reserve, mul_div(quantity, staked, supply).unwrap());
            prop_assert_eq!(redemption.payout, redemption.gross_reserve);
            prop_assert_eq!(fund.total_supply(), supply - quantity);
            prop_assert_eq!(
                fund.fund_reserve_balance(&chain.staking).unwrap(),
                staked - redemption.gross_reserve
            );
        }

        /// Mint then immediately burn returns the deposit, minus rounding.
        #[test]
        fn round_trip_loses_at_most_rounding(
            supply in 1_000u128..=1_000_000 * ONE,
            yield_bps in 0u128..=10_000,
            amount in 1_000u128..=1_000_000 * ONE,
        ) {
            let yield_ = supply * yield_bps / 10_000;
            let (mut chain, mut fund) = seeded_pool(supply, yield_);
            give_reserve(&mut chain, &fund, &user(), amount);

            let issued = fund.mint_with_reserve_asset(&mut chain, &user(), amount).unwrap();
            let redemption = fund
                .burn(&mut chain, &user(), issued.shares, RedeemAs::ReserveAsset)
                .unwrap();

            // A share is worth at most two reserve units here, so each of
            // the two roundings costs the caller at most one share's worth.
            prop_assert!(redemption.payout <= amount);
            prop_assert!(amount - redemption.payout <= 2);
        }

        /// Mints and burns never dilute a share, and move its value by
        /// rounding only.
        #[test]
        fn nav_held_through_mint_and_burn(
            supply in ONE..=1_000_000 * ONE,
            yield_bps in 1u128..=10_000,
            amount in ONE..=1_000_000 * ONE,
            in_currency in any::<bool>(),
        ) {
            let yield_ = supply * yield_bps / 10_000;
            let (mut chain, mut fund) = seeded_pool(supply, yield_);
            let rounding = Decimal::new(3, 18);
            let nav_before = fund.nav_per_share(&chain.staking).unwrap().unwrap();

            give_reserve(&mut chain, &fund, &user(), amount);
            let issued = fund.mint_with_reserve_asset(&mut chain, &user(), amount).unwrap();
            let nav_minted = fund.nav_per_share(&chain.staking).unwrap().unwrap();
            prop_assert!(nav_minted >= nav_before);
            prop_assert!(nav_minted - nav_before <= rounding);

            let redeem_as = if in_currency { RedeemAs::Currency } else { RedeemAs::ReserveAsset };
            fund.burn(&mut chain, &user(), issued.shares, redeem_as).unwrap();
            let nav_burned = fund.nav_per_share(&chain.staking).unwrap().unwrap();
            prop_assert!(nav_burned >= nav_minted);
            prop_assert!(nav_burned - nav_before <= rounding);
        }
    }
}
