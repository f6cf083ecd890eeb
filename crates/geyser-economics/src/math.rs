// crates/geyser-economics/src/math.rs
//
// Floor-rounded `a * b / c` through a 256-bit intermediate.
//
// Share minting, share burning, stake valuation and reward computation all
// multiply two 128-bit quantities before dividing. The product can exceed
// u128 long before the quotient does, so the multiplication is widened.

#![allow(clippy::assign_op_pattern)]
#![allow(clippy::manual_range_contains)]

use geyser_core::GeyserError;
use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer.
    pub struct U256(4);
}

/// Compute `floor(a * b / denominator)`.
///
/// # Errors
/// - `InvariantViolation` if `denominator` is zero.
/// - `ArithmeticOverflow` if the quotient does not fit in u128.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, GeyserError> {
    if denominator == 0 {
        return Err(GeyserError::InvariantViolation(format!(
            "division by zero computing {} * {} / 0",
            a, b
        )));
    }
    let quotient = U256::from(a) * U256::from(b) / U256::from(denominator);
    if quotient > U256::from(u128::MAX) {
        return Err(GeyserError::ArithmeticOverflow(format!(
            "{} * {} / {} exceeds u128",
            a, b, denominator
        )));
    }
    Ok(quotient.low_u128())
}

/// Checked multiplication that names the quantity on overflow.
pub fn checked_mul(a: u128, b: u128, what: &str) -> Result<u128, GeyserError> {
    a.checked_mul(b)
        .ok_or_else(|| GeyserError::ArithmeticOverflow(format!("{} overflowed: {} * {}", what, a, b)))
}

/// Checked addition that names the quantity on overflow.
pub fn checked_add(a: u128, b: u128, what: &str) -> Result<u128, GeyserError> {
    a.checked_add(b)
        .ok_or_else(|| GeyserError::ArithmeticOverflow(format!("{} overflowed: {} + {}", what, a, b)))
}

/// Checked subtraction. Going below zero means the books disagree.
pub fn checked_sub(a: u128, b: u128, what: &str) -> Result<u128, GeyserError> {
    a.checked_sub(b).ok_or_else(|| {
        GeyserError::InvariantViolation(format!("{} underflowed: {} - {}", what, a, b))
    })
}
