//! Exchange-rate math between lamports and pool tokens.
//!
//! The stake pool's supply/value ratio is a spot price: callers read it
//! fresh per transaction build and never cache it across requests. All
//! intermediate products go through `u128` so supply-scale values cannot
//! overflow, and every division truncates toward zero to match the on-chain
//! programs.

use anchor_lang::prelude::*;

use crate::error::{BuilderError, Result};

/// Fee fraction in the stake pool's wire order (denominator first).
#[derive(
  AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq,
  Eq,
)]
pub struct Fee {
  pub denominator: u64,
  pub numerator: u64,
}

impl Fee {
  /// Whether applying the inverse fee is meaningful (`denominator >
  /// numerator`). A zeroed fee disables inflation entirely.
  #[must_use]
  pub fn inverse_applies(&self) -> bool {
    self.denominator > self.numerator
  }
}

/// Normalized stake pool totals at a point in time.
#[derive(Clone, Copy, Debug)]
pub struct PoolSummary {
  pub total_issued_supply: u64,
  pub total_deposited_value: u64,
  pub withdrawal_fee: Fee,
}

impl PoolSummary {
  /// Pool tokens corresponding to `lamports` at the current spot rate,
  /// truncating. A pool with zero supply or zero deposits trades 1:1.
  #[must_use]
  pub fn pool_tokens_for_lamports(&self, lamports: u64) -> u128 {
    if self.total_issued_supply == 0 || self.total_deposited_value == 0 {
      return u128::from(lamports);
    }
    u128::from(lamports) * u128::from(self.total_issued_supply)
      / u128::from(self.total_deposited_value)
  }

  /// Derivative tokens minted for a deposit of `lamports`, floor.
  ///
  /// # Errors
  /// [`BuilderError::InvalidAmount`] if the result exceeds `u64`.
  pub fn mint_amount(&self, lamports: u64) -> Result<u64> {
    let tokens = self.pool_tokens_for_lamports(lamports);
    u64::try_from(tokens).map_err(|_| {
      BuilderError::InvalidAmount(format!(
        "mint amount {tokens} exceeds u64 for deposit of {lamports} lamports"
      ))
    })
  }
}

/// Inflates a pool-token amount by the inverse of the withdrawal fee, so
/// that the post-fee redemption still covers the requested amount. No-op
/// when the fee is zeroed or fully confiscatory.
#[must_use]
pub fn inflate_for_withdrawal_fee(pool_tokens: u128, fee: Fee) -> u128 {
  if !fee.inverse_applies() {
    return pool_tokens;
  }
  pool_tokens * u128::from(fee.denominator)
    / u128::from(fee.denominator - fee.numerator)
}
