//! Withdrawal source selection for liquid unstaking.
//!
//! Given the stake pool's validator list and reserve, selects which stake
//! accounts the redemption instruction should split from so that the drawn
//! pool-token amounts cover the request exactly. Selection is greedy
//! largest-first within a fixed group priority, mirroring the pool program's
//! own withdrawal preference: preferred validator, then other active
//! validators, then transient accounts, then the reserve.

use anchor_lang::prelude::Pubkey;
use itertools::Itertools;

use crate::conversion::{inflate_for_withdrawal_fee, PoolSummary};
use crate::error::{BuilderError, Result};

/// The redemption instruction addresses at most this many stake accounts.
pub const MAX_WITHDRAW_SOURCES: usize = 5;

/// Validator entry state as recorded in the pool's validator list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StakeStatus {
  Active,
  DeactivatingTransient,
  ReadyForRemoval,
}

/// One validator's balances, read fresh from the pool's validator list with
/// its stake account addresses already resolved.
#[derive(Clone, Debug)]
pub struct ValidatorStakeEntry {
  pub vote_address: Pubkey,
  pub stake_address: Pubkey,
  pub transient_stake_address: Pubkey,
  pub active_lamports: u64,
  pub transient_lamports: u64,
  pub status: StakeStatus,
  pub is_preferred: bool,
}

/// Withdrawal priority group, walked in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
  Preferred,
  Active,
  Transient,
  Reserve,
}

const GROUP_ORDER: [SourceKind; 4] = [
  SourceKind::Preferred,
  SourceKind::Active,
  SourceKind::Transient,
  SourceKind::Reserve,
];

/// A stake account selected to cover part of the redemption, in pool-token
/// units. Consumed once by the instruction builder.
#[derive(Clone, Debug)]
pub struct WithdrawSource {
  pub kind: SourceKind,
  pub stake_address: Pubkey,
  pub vote_address: Option<Pubkey>,
  pub pool_tokens: u64,
}

/// The pool's reserve stake account with rent exemption already deducted.
#[derive(Clone, Copy, Debug)]
pub struct ReserveSource {
  pub stake_address: Pubkey,
  pub lamports: u64,
}

#[derive(Clone)]
struct Candidate {
  kind: SourceKind,
  stake_address: Pubkey,
  vote_address: Option<Pubkey>,
  lamports: u64,
}

/// Selects and orders withdrawal sources covering `amount_requested` pool
/// tokens exactly.
///
/// `min_balance` is the rent-exemption minimum plus the pool's minimum
/// active stake; transient balances at or below it are not splittable.
/// Unless `skip_fee`, each source's capacity is inflated by the inverse
/// withdrawal fee so the post-fee redemption still covers the request.
///
/// # Errors
/// [`BuilderError::InsufficientLiquidity`] when the candidates cannot cover
/// the amount, including when coverage would need more than
/// [`MAX_WITHDRAW_SOURCES`] accounts. No partial plan is returned.
pub fn plan_withdrawal(
  amount_requested: u64,
  entries: &[ValidatorStakeEntry],
  reserve: Option<ReserveSource>,
  summary: &PoolSummary,
  min_balance: u64,
  skip_fee: bool,
) -> Result<Vec<WithdrawSource>> {
  let mut candidates: Vec<Candidate> = Vec::new();
  for entry in entries {
    if entry.status != StakeStatus::Active {
      continue;
    }
    if entry.active_lamports > 0 {
      candidates.push(Candidate {
        kind: if entry.is_preferred {
          SourceKind::Preferred
        } else {
          SourceKind::Active
        },
        stake_address: entry.stake_address,
        vote_address: Some(entry.vote_address),
        lamports: entry.active_lamports,
      });
    }
    let transient = entry.transient_lamports.saturating_sub(min_balance);
    if transient > 0 {
      candidates.push(Candidate {
        kind: SourceKind::Transient,
        stake_address: entry.transient_stake_address,
        vote_address: Some(entry.vote_address),
        lamports: transient,
      });
    }
  }

  // Largest balances first; the sort is stable so equal balances keep the
  // validator list order.
  let mut candidates = candidates
    .into_iter()
    .sorted_by(|a, b| b.lamports.cmp(&a.lamports))
    .collect_vec();

  if let Some(reserve) = reserve {
    if reserve.lamports > 0 {
      candidates.push(Candidate {
        kind: SourceKind::Reserve,
        stake_address: reserve.stake_address,
        vote_address: None,
        lamports: reserve.lamports,
      });
    }
  }

  let mut sources: Vec<WithdrawSource> = Vec::new();
  let mut remaining = amount_requested;

  'groups: for kind in GROUP_ORDER {
    for candidate in candidates.iter().filter(|c| c.kind == kind) {
      if kind == SourceKind::Transient && candidate.lamports <= min_balance {
        continue;
      }

      let mut available = summary.pool_tokens_for_lamports(candidate.lamports);
      if !skip_fee {
        available =
          inflate_for_withdrawal_fee(available, summary.withdrawal_fee);
      }

      let drawn = available.min(u128::from(remaining)) as u64;
      if drawn == 0 {
        continue;
      }
      if sources.len() == MAX_WITHDRAW_SOURCES {
        break 'groups;
      }

      sources.push(WithdrawSource {
        kind,
        stake_address: candidate.stake_address,
        vote_address: candidate.vote_address,
        pool_tokens: drawn,
      });
      remaining -= drawn;

      if remaining == 0 {
        break 'groups;
      }
    }
  }

  if remaining > 0 {
    return Err(BuilderError::InsufficientLiquidity {
      requested: amount_requested,
      covered: amount_requested - remaining,
    });
  }

  Ok(sources)
}
