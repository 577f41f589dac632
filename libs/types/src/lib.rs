//! Types library for the pooled staking fund
//!
//! Value types shared by the custody engine and anything that drives it:
//! identities, fixed-point amounts, and the fee policy.
//!
//! # Modules
//! - `ids`: Addresses (with the native-currency sentinel), campaign and vote identifiers
//! - `numeric`: 18-decimal fixed-point amounts and overflow-safe share arithmetic
//! - `fee`: Fee divisors and fee computation
//! - `errors`: Parse errors

pub mod ids;
pub mod numeric;
pub mod fee;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::fee::*;
    pub use crate::errors::*;
}
