//! Error types for value parsing
//!
//! Engine-level failures live with the contracts; this crate only
//! reports malformed input.

use thiserror::Error;

/// Address parsing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Invalid hex in address: {0}")]
    InvalidHex(String),

    #[error("Invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}
