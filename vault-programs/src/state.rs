//! On-chain account layouts and schema-validated decoders.
//!
//! Each layout is an explicit field-ordered schema decoded with borsh.
//! Decoders validate the account-type tag (stake pool program) or the
//! 8-byte discriminator (anchor programs) before touching the payload and
//! fail closed on short or unknown buffers.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::hash::hash;
use vault_core::{BuilderError, Fee, PoolSummary, Result};

/// First byte of every stake pool program account.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountType {
  Uninitialized,
  StakePool,
  ValidatorList,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub struct Lockup {
  pub unix_timestamp: i64,
  pub epoch: u64,
  pub custodian: Pubkey,
}

/// Fee change scheduled for a future epoch.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub enum FutureEpochFee {
  None,
  One(Fee),
  Two(Fee),
}

/// SPL stake pool state.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct StakePool {
  pub account_type: AccountType,
  pub manager: Pubkey,
  pub staker: Pubkey,
  pub stake_deposit_authority: Pubkey,
  pub stake_withdraw_bump_seed: u8,
  pub validator_list: Pubkey,
  pub reserve_stake: Pubkey,
  pub pool_mint: Pubkey,
  pub manager_fee_account: Pubkey,
  pub token_program_id: Pubkey,
  pub total_lamports: u64,
  pub pool_token_supply: u64,
  pub last_update_epoch: u64,
  pub lockup: Lockup,
  pub epoch_fee: Fee,
  pub next_epoch_fee: FutureEpochFee,
  pub preferred_deposit_validator_vote_address: Option<Pubkey>,
  pub preferred_withdraw_validator_vote_address: Option<Pubkey>,
  pub stake_deposit_fee: Fee,
  pub stake_withdrawal_fee: Fee,
  pub next_stake_withdrawal_fee: FutureEpochFee,
  pub stake_referral_fee: u8,
  pub sol_deposit_authority: Option<Pubkey>,
  pub sol_deposit_fee: Fee,
  pub sol_referral_fee: u8,
  pub sol_withdraw_authority: Option<Pubkey>,
  pub sol_withdrawal_fee: Fee,
  pub next_sol_withdrawal_fee: FutureEpochFee,
  pub last_epoch_pool_token_supply: u64,
  pub last_epoch_total_lamports: u64,
}

impl StakePool {
  /// Decodes a stake pool account, tolerating trailing padding.
  ///
  /// # Errors
  /// [`BuilderError::Decode`] on short buffers or a wrong account type.
  pub fn decode(data: &[u8]) -> Result<Self> {
    let pool = Self::deserialize(&mut &data[..]).map_err(|e| {
      BuilderError::Decode {
        account: "stake pool",
        reason: e.to_string(),
      }
    })?;
    if pool.account_type != AccountType::StakePool {
      return Err(BuilderError::Decode {
        account: "stake pool",
        reason: format!("unexpected account type {:?}", pool.account_type),
      });
    }
    Ok(pool)
  }

  /// Normalized totals and withdrawal fee for rate math.
  #[must_use]
  pub fn summary(&self) -> PoolSummary {
    PoolSummary {
      total_issued_supply: self.pool_token_supply,
      total_deposited_value: self.total_lamports,
      withdrawal_fee: self.stake_withdrawal_fee,
    }
  }
}

/// Validator entry state, one byte on the wire.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StakeStatus {
  Active,
  DeactivatingTransient,
  ReadyForRemoval,
}

impl From<StakeStatus> for vault_core::StakeStatus {
  fn from(status: StakeStatus) -> Self {
    match status {
      StakeStatus::Active => Self::Active,
      StakeStatus::DeactivatingTransient => Self::DeactivatingTransient,
      StakeStatus::ReadyForRemoval => Self::ReadyForRemoval,
    }
  }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub struct ValidatorStakeInfo {
  pub active_stake_lamports: u64,
  pub transient_stake_lamports: u64,
  pub last_update_epoch: u64,
  pub transient_seed_suffix: u64,
  pub unused: u32,
  pub validator_seed_suffix: u32,
  pub status: StakeStatus,
  pub vote_account_address: Pubkey,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub struct ValidatorListHeader {
  pub account_type: AccountType,
  pub max_validators: u32,
}

/// The stake pool's validator list account.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct ValidatorList {
  pub header: ValidatorListHeader,
  pub validators: Vec<ValidatorStakeInfo>,
}

impl ValidatorList {
  /// # Errors
  /// [`BuilderError::Decode`] on short buffers or a wrong account type.
  pub fn decode(data: &[u8]) -> Result<Self> {
    let list = Self::deserialize(&mut &data[..]).map_err(|e| {
      BuilderError::Decode {
        account: "validator list",
        reason: e.to_string(),
      }
    })?;
    if list.header.account_type != AccountType::ValidatorList {
      return Err(BuilderError::Decode {
        account: "validator list",
        reason: format!(
          "unexpected account type {:?}",
          list.header.account_type
        ),
      });
    }
    Ok(list)
  }
}

/// Liquid unstaker pool state.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct UnstakePool {
  pub authority: Pubkey,
  pub sol_vault: Pubkey,
  pub lp_mint: Pubkey,
  pub manager_fee_account: Pubkey,
  pub total_lp_tokens: u64,
  pub total_accrued_fees: u64,
  pub total_deactivating_stake: u64,
  pub fee_max: u64,
  pub fee_min: u64,
  pub min_sol_for_min_fee: u64,
  pub manager_fee_pct: u8,
  pub bump: u8,
  pub sol_vault_bump: u8,
  pub sol_vault_lamports: u64,
  pub sol_vault_lamports_cap: u64,
}

impl UnstakePool {
  /// # Errors
  /// [`BuilderError::Decode`] on short buffers or a wrong discriminator.
  pub fn decode(data: &[u8]) -> Result<Self> {
    decode_anchor_account(data, "Pool", "unstake pool")
  }
}

/// DST registry record.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct DstInfo {
  pub authority: Pubkey,
  pub token_mint: Pubkey,
  pub bump: u8,
}

impl DstInfo {
  /// # Errors
  /// [`BuilderError::Decode`] on short buffers or a wrong discriminator.
  pub fn decode(data: &[u8]) -> Result<Self> {
    decode_anchor_account(data, "DstInfo", "dst info")
  }
}

/// Directed-stake director record.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct Director {
  pub authority: Pubkey,
  pub target: Pubkey,
  pub bump: u8,
}

impl Director {
  /// # Errors
  /// [`BuilderError::Decode`] on short buffers or a wrong discriminator.
  pub fn decode(data: &[u8]) -> Result<Self> {
    decode_anchor_account(data, "Director", "director")
  }
}

/// Anchor account discriminator: first 8 bytes of `sha256("account:<name>")`.
#[must_use]
pub fn account_discriminator(name: &str) -> [u8; 8] {
  let digest = hash(format!("account:{name}").as_bytes());
  let mut discriminator = [0u8; 8];
  discriminator.copy_from_slice(&digest.to_bytes()[..8]);
  discriminator
}

fn decode_anchor_account<T: AnchorDeserialize>(
  data: &[u8],
  name: &str,
  account: &'static str,
) -> Result<T> {
  if data.len() < 8 {
    return Err(BuilderError::Decode {
      account,
      reason: format!("buffer too short: {} bytes", data.len()),
    });
  }
  if data[..8] != account_discriminator(name) {
    return Err(BuilderError::Decode {
      account,
      reason: "discriminator mismatch".to_string(),
    });
  }
  T::deserialize(&mut &data[8..]).map_err(|e| BuilderError::Decode {
    account,
    reason: e.to_string(),
  })
}
