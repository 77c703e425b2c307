//! Program-derived account addresses.
//!
//! All derivations are deterministic functions of their seeds; the same
//! inputs always yield the same address.

use anchor_lang::prelude::Pubkey;
use anchor_spl::associated_token::get_associated_token_address;

use crate::{directed_stake, dst, liquid_unstaker, stake_pool};

macro_rules! pda {
  ($program_id:expr, $($seed:expr),+ $(,)?) => {
    Pubkey::find_program_address(&[$($seed.as_ref()),+], &$program_id).0
  };
}

/// Validator stake account owned by the pool.
#[must_use]
pub fn stake_account(vote: Pubkey, pool: Pubkey) -> Pubkey {
  pda!(stake_pool::ID, vote, pool)
}

/// Transient stake account used while the pool rebalances a validator.
#[must_use]
pub fn transient_stake_account(
  vote: Pubkey,
  pool: Pubkey,
  seed: u64,
) -> Pubkey {
  pda!(stake_pool::ID, "transient", vote, pool, seed.to_le_bytes())
}

/// The stake pool's withdraw authority.
#[must_use]
pub fn withdraw_authority(pool: Pubkey) -> Pubkey {
  pda!(stake_pool::ID, pool, "withdraw")
}

/// The liquid unstaker's SOL vault.
#[must_use]
pub fn sol_vault(pool: Pubkey) -> Pubkey {
  pda!(liquid_unstaker::ID, "sol_vault", pool)
}

/// The liquid unstaker's LP token mint.
#[must_use]
pub fn lp_mint(pool: Pubkey) -> Pubkey {
  pda!(liquid_unstaker::ID, "lp_mint", pool)
}

/// Tracking record the unstaker creates for each new stake account.
#[must_use]
pub fn stake_account_info(stake_account: Pubkey) -> Pubkey {
  pda!(liquid_unstaker::ID, "stake_account_info", stake_account)
}

/// Directed-stake director for an owner (or for a DST info account).
#[must_use]
pub fn director(authority: Pubkey) -> Pubkey {
  pda!(directed_stake::ID, "director", authority)
}

/// DST registry record for a token mint.
#[must_use]
pub fn dst_info(token_mint: Pubkey) -> Pubkey {
  pda!(dst::ID, "dst_info", token_mint)
}

/// Mint authority for a DST's derivative token.
#[must_use]
pub fn dst_mint_authority(dst_info: Pubkey) -> Pubkey {
  pda!(dst::ID, "mint_auth", dst_info)
}

/// Metaplex metadata account for a mint.
#[must_use]
pub fn metadata(mint: Pubkey) -> Pubkey {
  mpl_token_metadata::accounts::Metadata::find_pda(&mint).0
}

/// Associated token account.
#[must_use]
pub fn ata(owner: Pubkey, mint: Pubkey) -> Pubkey {
  get_associated_token_address(&owner, &mint)
}
