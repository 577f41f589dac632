//! Fixed-point amounts
//!
//! Shares, reserve balances and currency amounts are unsigned integers with
//! 18 implied decimals. All division rounds toward zero, which favors the
//! fund over the individual caller.

use rust_decimal::Decimal;

/// Token amount in base units (18 implied decimals)
pub type Amount = u128;

/// Implied decimal places of every [`Amount`]
pub const DECIMALS: u32 = 18;

/// One whole token in base units
pub const ONE: Amount = 1_000_000_000_000_000_000;

const LOW_MASK: u128 = u64::MAX as u128;

/// Computes `floor(a * b / divisor)` with a 256-bit intermediate product.
///
/// Returns `None` when `divisor` is zero or the quotient does not fit in an
/// [`Amount`]. Share conversions multiply two 18-decimal quantities, so the
/// plain `u128` product overflows for realistic pool sizes.
pub fn mul_div(a: Amount, b: Amount, divisor: Amount) -> Option<Amount> {
    if divisor == 0 {
        return None;
    }
    if let Some(product) = a.checked_mul(b) {
        return Some(product / divisor);
    }

    let (hi, lo) = widening_mul(a, b);
    if hi >= divisor {
        return None;
    }

    // Restoring long division of the 256-bit (hi, lo) by a 128-bit divisor.
    // `rem` stays below `divisor`; the shifted-out top bit is tracked in `carry`.
    let mut rem = hi;
    let mut quotient: u128 = 0;
    for bit in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> bit) & 1);
        quotient <<= 1;
        if carry == 1 || rem >= divisor {
            rem = rem.wrapping_sub(divisor);
            quotient |= 1;
        }
    }
    Some(quotient)
}

/// Full 256-bit product of two `u128` values as `(high, low)` halves.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    let (a_hi, a_lo) = (a >> 64, a & LOW_MASK);
    let (b_hi, b_lo) = (b >> 64, b & LOW_MASK);

    let lo_lo = a_lo * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_lo = a_hi * b_lo;
    let hi_hi = a_hi * b_hi;

    let middle = (lo_lo >> 64) + (lo_hi & LOW_MASK) + (hi_lo & LOW_MASK);
    let low = (lo_lo & LOW_MASK) | (middle << 64);
    let high = hi_hi + (lo_hi >> 64) + (hi_lo >> 64) + (middle >> 64);
    (high, low)
}

/// Converts base units to a token-denominated decimal (e.g. `ONE` → `1`).
///
/// Returns `None` above the `Decimal` mantissa range (~7.9e28 base units).
pub fn to_decimal(amount: Amount) -> Option<Decimal> {
    let raw = i128::try_from(amount).ok()?;
    Decimal::try_from_i128_with_scale(raw, DECIMALS)
        .ok()
        .map(|d| d.normalize())
}

/// Ratio `numerator / denominator` as a decimal with 18 digits of precision.
///
/// Returns `None` for a zero denominator.
pub fn ratio(numerator: Amount, denominator: Amount) -> Option<Decimal> {
    mul_div(numerator, ONE, denominator).and_then(to_decimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mul_div_small_values() {
        assert_eq!(mul_div(10, 3, 4), Some(7));
        assert_eq!(mul_div(0, 5, 3), Some(0));
    }

    #[test]
    fn test_mul_div_zero_divisor() {
        assert_eq!(mul_div(1, 1, 0), None);
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // 1e24 * 1e24 overflows u128 but the quotient does not
        let big = 1_000_000 * ONE;
        assert_eq!(mul_div(big, big, big), Some(big));
        assert_eq!(mul_div(big, 3 * big, 2 * big), Some(big + big / 2));
    }

    #[test]
    fn test_mul_div_quotient_overflow() {
        assert_eq!(mul_div(u128::MAX, u128::MAX, 1), None);
    }

    #[test]
    fn test_mul_div_max_operands() {
        assert_eq!(mul_div(u128::MAX, u128::MAX, u128::MAX), Some(u128::MAX));
        assert_eq!(mul_div(u128::MAX, 2, 4), Some(u128::MAX / 2));
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(to_decimal(ONE), Some(Decimal::ONE));
        assert_eq!(to_decimal(ONE / 4), Some(Decimal::new(25, 2)));
        assert_eq!(to_decimal(u128::MAX), None);
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(3 * ONE, 2 * ONE), Some(Decimal::new(15, 1)));
        assert_eq!(ratio(ONE, 0), None);
    }

    proptest! {
        #[test]
        fn fuzz_mul_div_matches_narrow_product(
            a in 0u128..(1u128 << 63),
            b in 0u128..(1u128 << 63),
            c in 1u128..(1u128 << 63),
        ) {
            prop_assert_eq!(mul_div(a, b, c), Some(a * b / c));
        }

        #[test]
        fn fuzz_mul_div_identity(a in any::<u128>(), b in 1u128..) {
            prop_assert_eq!(mul_div(a, b, b), Some(a));
        }
    }
}
