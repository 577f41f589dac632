//! Custody engine for a pooled staking fund
//!
//! Holders deposit the native currency or the reserve asset and receive
//! proportional shares. The fund stakes the pooled reserve, votes with its
//! weight, and restakes claimed rewards. Staking, swaps, governance and
//! reward payout are external collaborators reached through the traits in
//! `services`.
//!
//! # Modules
//! - `errors`: Ledger, collaborator, fund and configuration errors
//! - `events`: Events appended by every successful state change
//! - `security`: Reentrancy guard, single-owner access control, pause switch
//! - `ledger`: Share balances and total supply
//! - `registry`: Endpoint addresses and the reward handler table
//! - `allowance`: Reset-then-grant allowance state machine
//! - `services`: Collaborator traits and the transactional environment
//! - `fund`: Mint, burn, reward reinvestment, voting
//! - `config`: Deployment configuration
//! - `mock`: In-memory collaborators for tests and simulation

pub mod errors;
pub mod events;
pub mod security;
pub mod ledger;
pub mod registry;
pub mod allowance;
pub mod services;
pub mod fund;
pub mod config;
pub mod mock;

/// Contract ABI version — frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
