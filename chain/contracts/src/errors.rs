//! Contract-specific error types
//!
//! Error taxonomy for the share ledger, the external collaborators, and the
//! fund entry points. Every fund failure aborts the whole operation.

use fund_types::ids::{Address, CampaignId};
use fund_types::numeric::Amount;
use thiserror::Error;

use crate::registry::Endpoint;

/// Share ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Share amount must be positive")]
    InvalidAmount,

    #[error("Insufficient shares for {holder}: required {required}, available {available}")]
    InsufficientBalance {
        holder: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Arithmetic overflow in share supply")]
    Overflow,
}

/// Errors reported by external collaborators (asset ledger, staking,
/// exchange, governance, reward handlers)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Call rejected: {reason}")]
    Rejected { reason: String },

    #[error("Insufficient {currency} for {holder}: required {required}, available {available}")]
    InsufficientFunds {
        currency: Address,
        holder: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Allowance exceeded for spender {spender}: required {required}, approved {approved}")]
    AllowanceExceeded {
        spender: Address,
        required: Amount,
        approved: Amount,
    },

    #[error("Allowance must be zero before it can be changed")]
    NonZeroAllowance,

    #[error("Native currency has no allowances")]
    NativeAllowance,

    #[error("Reward already claimed for campaign {campaign}")]
    AlreadyClaimed { campaign: CampaignId },

    #[error("Unsupported swap pair: {src} -> {dest}")]
    UnsupportedPair { src: Address, dest: Address },

    #[error("Arithmetic overflow in external balance")]
    Overflow,
}

/// Fund entry point errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FundError {
    #[error("Unauthorized: caller is not owner")]
    Unauthorized,

    #[error("Fund is paused")]
    Paused,

    #[error("Reentrancy detected")]
    Reentrancy,

    #[error("Amount must be positive")]
    ZeroAmount,

    #[error("Share ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("{endpoint} call failed: {source}")]
    ExternalCallFailed {
        endpoint: Endpoint,
        #[source]
        source: ServiceError,
    },

    #[error("{0} endpoint not configured")]
    EndpointNotConfigured(Endpoint),

    #[error("{endpoint} endpoint mismatch: registered {registered}, presented {presented}")]
    EndpointMismatch {
        endpoint: Endpoint,
        registered: Address,
        presented: Address,
    },

    #[error("Unknown reward handler index: {index}")]
    UnknownRewardHandler { index: usize },

    #[error("Length mismatch: {handlers} handler indices, {amounts} amounts")]
    LengthMismatch { handlers: usize, amounts: usize },

    #[error("Allowance for {spender} must be reset before it is granted again")]
    AllowanceResetRequired { spender: Address },

    #[error("Staked reserve is empty while shares are outstanding")]
    EmptyReserve,

    #[error("Arithmetic overflow in fund accounting")]
    Overflow,
}

impl FundError {
    /// Adapter for `map_err` on calls into an external endpoint.
    pub(crate) fn external(endpoint: Endpoint) -> impl FnOnce(ServiceError) -> FundError {
        move |source| FundError::ExternalCallFailed { endpoint, source }
    }
}

/// Deployment configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid fund configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Deployment step failed: {0}")]
    Fund(#[from] FundError),
}
