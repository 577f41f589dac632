//! Shared security primitives for the fund
//!
//! Reentrancy guard, single-owner access control, and pause switch used by
//! every privileged or value-moving entry point.

use fund_types::ids::Address;

/// Reentrancy guard preventing nested calls into protected functions.
///
/// A fund operation acquires the guard before touching any external service
/// and releases it once the operation has committed or rolled back. Any
/// nested entry attempt fails.
#[derive(Debug, Clone)]
pub struct ReentrancyGuard {
    locked: bool,
}

impl ReentrancyGuard {
    /// Create a new unlocked guard.
    pub fn new() -> Self {
        Self { locked: false }
    }

    /// Acquire the guard. Returns `true` if successfully acquired.
    /// Returns `false` if already locked (reentrancy attempt).
    pub fn acquire(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.locked = true;
        true
    }

    /// Release the guard.
    pub fn release(&mut self) {
        self.locked = false;
    }

    /// Check if currently locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Default for ReentrancyGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-owner access control.
///
/// The deployer becomes owner. Every `set*`, `approve*`, `vote` and
/// `claim_reward` entry point checks the caller here before any side effect.
#[derive(Debug, Clone)]
pub struct AccessControl {
    owner: Address,
}

impl AccessControl {
    /// Create access control with an initial owner.
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    /// Check if a caller is the owner.
    pub fn is_owner(&self, caller: &Address) -> bool {
        *caller == self.owner
    }

    /// Hand ownership to `new_owner`. Callers check `is_owner` first.
    pub fn transfer_ownership(&mut self, new_owner: Address) {
        self.owner = new_owner;
    }

    /// Get the current owner.
    pub fn owner(&self) -> Address {
        self.owner
    }
}

/// Composable pause modifier.
///
/// When paused, minting and burning must be rejected.
#[derive(Debug, Clone)]
pub struct PauseGuard {
    paused: bool,
}

impl PauseGuard {
    /// Create a new unpaused guard.
    pub fn new() -> Self {
        Self { paused: false }
    }

    /// Pause operations.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Unpause operations.
    pub fn unpause(&mut self) {
        self.paused = false;
    }

    /// Check if currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl Default for PauseGuard {
    fn default() -> Self {
        Self::new()
    }
}
