//! Well-known mints and pool addresses.

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::pubkey;

/// The pool's derivative token mint (vSOL).
pub const VSOL_MINT: Pubkey =
  pubkey!("vSoLxydx6akxyMD9XEcPvGYNGq6Nn66oqVb3UkGkei7");

/// Wrapped SOL, the aggregator's output mint when unstaking.
pub const WSOL_MINT: Pubkey =
  pubkey!("So11111111111111111111111111111111111111112");

/// The Vault's stake pool state account.
pub const STAKE_POOL_ADDRESS: Pubkey =
  pubkey!("Fu9BYC6tWBo1KMKaP3CFoKfRhqv9akmy3DuYwnCyWiyC");

/// The liquid unstaker pool state account.
pub const UNSTAKE_POOL_ADDRESS: Pubkey =
  pubkey!("9nyw5jxhzuSs88HxKJyDCsWBZMhxj2uNXsFcyHF5KBAb");
