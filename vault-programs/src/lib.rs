//! Program definitions for the Vault staking protocol.
//!
//! The builder talks to four on-chain programs, all consumed as black-box
//! account layouts and instruction encodings: the SPL stake pool, the
//! liquid unstaker pool, the DST minter, and the directed-stake director.

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::pubkey;

pub mod instructions;
pub mod pda;
pub mod state;
pub mod tokens;

/// SPL stake pool program.
pub mod stake_pool {
  use super::{pubkey, Pubkey};

  pub const ID: Pubkey = pubkey!("SPoo1Ku8WFXoNDMHPsrGSTSG1Y47rzgn41SLUNakuHy");

  /// Smallest active stake the pool program will leave in a split account.
  pub const MINIMUM_ACTIVE_STAKE: u64 = 1_000_000;
}

/// Liquid unstaker pool program.
pub mod liquid_unstaker {
  use super::{pubkey, Pubkey};

  pub const ID: Pubkey = pubkey!("SWdKM1sFVq8jMS9gCgMPV8rztS19XZZicW92YpKcaDT");
}

/// DST (derivative staking token) minter program.
pub mod dst {
  use super::{pubkey, Pubkey};

  pub const ID: Pubkey = pubkey!("9yzktj1UK6cEv3ZgYRJSwu6dHUDZu9Xhzh9P6wsmH164");
}

/// Directed-stake director program.
pub mod directed_stake {
  use super::{pubkey, Pubkey};

  pub const ID: Pubkey = pubkey!("J6yaF6c86n8RFKyfRXmK7kzdx3LYEuftrMTYStGNwy7Z");
}
