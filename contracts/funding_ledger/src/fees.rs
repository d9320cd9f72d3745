//! # Fees
//!
//! Whole-percent fee arithmetic. Every division truncates toward zero, so on
//! a contribution the remainder stays with the project and on an early
//! withdrawal the owner is charged the rounded-down amount.

use crate::Error;

/// Largest accepted percentage value.
pub const MAX_FEE_PCT: u32 = 100;

pub fn validate_pct(pct: u32) -> Result<(), Error> {
    if pct > MAX_FEE_PCT {
        return Err(Error::InvalidFeePercentage);
    }
    Ok(())
}

/// `amount * pct / 100`, truncating.
pub fn percentage_of(amount: i128, pct: u32) -> Result<i128, Error> {
    amount
        .checked_mul(pct as i128)
        .map(|scaled| scaled / 100)
        .ok_or(Error::Overflow)
}

/// Split a contribution into `(fee, net)` with `fee + net == amount`.
pub fn split_contribution(amount: i128, contribution_fee_pct: u32) -> Result<(i128, i128), Error> {
    let fee = percentage_of(amount, contribution_fee_pct)?;
    let net = amount.checked_sub(fee).ok_or(Error::Overflow)?;
    Ok((fee, net))
}
