//! Fee policy
//!
//! Fees are expressed as divisors: `fee = amount / divisor`, with `0`
//! disabling the fee for that operation. The quantization is part of the
//! external contract: divisor 3 ≈ 33.3%, divisor 4 = 25%, and there is no
//! divisor for exactly 30%.

use serde::{Deserialize, Serialize};

use crate::numeric::Amount;

/// Operation a fee is charged on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeOperation {
    /// Issuing shares
    Mint,
    /// Redeeming shares
    Burn,
    /// Reinvesting claimed rewards
    Claim,
}

/// Per-operation fee divisors.
///
/// Any triple is accepted, including all zeros. No upper bound is enforced:
/// the owner is trusted to configure sensible values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeDivisors {
    pub mint: u64,
    pub burn: u64,
    pub claim: u64,
}

/// Result of applying a fee to an amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Amount left for the caller after the fee
    pub net: Amount,
    /// Amount withheld
    pub fee: Amount,
}

impl FeeDivisors {
    /// All fees disabled
    pub const DISABLED: FeeDivisors = FeeDivisors {
        mint: 0,
        burn: 0,
        claim: 0,
    };

    pub fn new(mint: u64, burn: u64, claim: u64) -> Self {
        Self { mint, burn, claim }
    }

    /// Same divisor for every operation
    pub fn uniform(divisor: u64) -> Self {
        Self::new(divisor, divisor, divisor)
    }

    /// Divisor configured for an operation
    pub fn divisor(&self, operation: FeeOperation) -> u64 {
        match operation {
            FeeOperation::Mint => self.mint,
            FeeOperation::Burn => self.burn,
            FeeOperation::Claim => self.claim,
        }
    }

    /// Split `amount` into net and fee for an operation.
    ///
    /// Integer division rounds the fee toward zero.
    pub fn compute_fee(&self, amount: Amount, operation: FeeOperation) -> FeeSplit {
        let fee = match self.divisor(operation) {
            0 => 0,
            divisor => amount / Amount::from(divisor),
        };
        FeeSplit {
            net: amount - fee,
            fee,
        }
    }
}

/// Where withheld fees end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeRetention {
    /// Fees stay staked and raise the value of every remaining share
    #[default]
    Pool,
    /// Fees are held unstaked by the fund until the owner withdraws them
    Treasury,
}
