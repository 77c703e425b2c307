//! Instruction builders for the Vault staking programs.
//!
//! Pure functions over already-resolved addresses and amounts. The stake
//! pool program encodes instructions as a borsh enum, addressed here by
//! explicit variant index; the anchor programs (unstaker, DST, director)
//! are addressed by method sighash since they are consumed without IDL
//! codegen.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::pubkey;
use anchor_lang::solana_program::sysvar;
use anchor_lang::system_program;
use anchor_spl::token;

use crate::{directed_stake, dst, liquid_unstaker, pda, stake_pool};

/// The native stake program.
pub const STAKE_PROGRAM_ID: Pubkey =
  pubkey!("Stake11111111111111111111111111111111111111");

/// Serialized size of a stake account (`StakeStateV2`).
pub const STAKE_ACCOUNT_SPACE: u64 = 200;

/// `DepositSol`'s index in the stake pool program's instruction enum.
const DEPOSIT_SOL_INDEX: u8 = 14;

/// Anchor method discriminator: first 8 bytes of `sha256("global:<name>")`.
#[must_use]
pub fn instruction_sighash(name: &str) -> [u8; 8] {
  let digest =
    anchor_lang::solana_program::hash::hash(format!("global:{name}").as_bytes());
  let mut sighash = [0u8; 8];
  sighash.copy_from_slice(&digest.to_bytes()[..8]);
  sighash
}

fn anchor_ix_data<T: AnchorSerialize>(sighash: [u8; 8], args: &T) -> Vec<u8> {
  let mut data = sighash.to_vec();
  args
    .serialize(&mut data)
    .expect("borsh serialization into a Vec cannot fail");
  data
}

#[derive(AnchorSerialize)]
struct NoArgs;

/// Accounts for the stake pool's `DepositSol` instruction, in wire order.
pub struct DepositSolAccounts {
  pub stake_pool: Pubkey,
  pub withdraw_authority: Pubkey,
  pub reserve_stake: Pubkey,
  /// Ephemeral funding account holding the lamports being deposited.
  pub funding_account: Pubkey,
  pub destination_pool_account: Pubkey,
  pub manager_fee_account: Pubkey,
  pub referral_pool_account: Pubkey,
  pub pool_mint: Pubkey,
}

/// Deposits SOL from the funding account into the stake pool.
#[must_use]
pub fn deposit_sol(accounts: &DepositSolAccounts, lamports: u64) -> Instruction {
  let mut data = Vec::with_capacity(9);
  data.push(DEPOSIT_SOL_INDEX);
  data.extend_from_slice(&lamports.to_le_bytes());
  Instruction {
    program_id: stake_pool::ID,
    accounts: vec![
      AccountMeta::new(accounts.stake_pool, false),
      AccountMeta::new_readonly(accounts.withdraw_authority, false),
      AccountMeta::new(accounts.reserve_stake, false),
      AccountMeta::new(accounts.funding_account, true),
      AccountMeta::new(accounts.destination_pool_account, false),
      AccountMeta::new(accounts.manager_fee_account, false),
      AccountMeta::new(accounts.referral_pool_account, false),
      AccountMeta::new(accounts.pool_mint, false),
      AccountMeta::new_readonly(system_program::ID, false),
      AccountMeta::new_readonly(token::ID, false),
    ],
    data,
  }
}

#[derive(AnchorSerialize)]
struct MintDstArgs {
  amount: u64,
}

pub struct MintDstAccounts {
  pub dst_info: Pubkey,
  pub dst_mint: Pubkey,
  pub dst_token_account: Pubkey,
  pub source_vsol_account: Pubkey,
  pub owner: Pubkey,
}

/// Mints `amount` derivative tokens against the deposited vSOL.
#[must_use]
pub fn mint_dst(accounts: &MintDstAccounts, amount: u64) -> Instruction {
  let args = MintDstArgs { amount };
  Instruction {
    program_id: dst::ID,
    accounts: vec![
      AccountMeta::new(accounts.dst_info, false),
      AccountMeta::new(accounts.dst_mint, false),
      AccountMeta::new_readonly(pda::dst_mint_authority(accounts.dst_info), false),
      AccountMeta::new(accounts.dst_token_account, false),
      AccountMeta::new(accounts.source_vsol_account, false),
      AccountMeta::new_readonly(accounts.owner, true),
      AccountMeta::new_readonly(token::ID, false),
    ],
    data: anchor_ix_data(instruction_sighash("mint_dst"), &args),
  }
}

/// Creates the owner's director account and points it at `target`.
#[must_use]
pub fn direct(owner: Pubkey, target: Pubkey) -> Instruction {
  Instruction {
    program_id: directed_stake::ID,
    accounts: vec![
      AccountMeta::new(pda::director(owner), false),
      AccountMeta::new(owner, true),
      AccountMeta::new_readonly(target, false),
      AccountMeta::new_readonly(system_program::ID, false),
    ],
    data: anchor_ix_data(instruction_sighash("direct"), &NoArgs),
  }
}

/// Updates an existing director account to point at `target`.
#[must_use]
pub fn redirect(owner: Pubkey, target: Pubkey) -> Instruction {
  Instruction {
    program_id: directed_stake::ID,
    accounts: vec![
      AccountMeta::new(pda::director(owner), false),
      AccountMeta::new(owner, true),
      AccountMeta::new_readonly(target, false),
    ],
    data: anchor_ix_data(instruction_sighash("redirect"), &NoArgs),
  }
}

#[derive(AnchorSerialize)]
struct LiquidUnstakeLstArgs {
  lst_amounts: [u64; 5],
  minimum_lamports_out: Option<u64>,
}

pub struct LiquidUnstakeLstAccounts {
  pub pool: Pubkey,
  pub payer: Pubkey,
  pub user_lst_account: Pubkey,
  pub sol_vault: Pubkey,
  pub manager_fee_account: Pubkey,
  pub stake_pool: Pubkey,
  pub validator_list: Pubkey,
  pub withdraw_authority: Pubkey,
  pub stake_pool_manager_fee_account: Pubkey,
  pub stake_pool_mint: Pubkey,
}

/// Redeems derivative tokens through the liquid unstaker in one aggregate
/// instruction. `remaining_accounts` carries the source stake accounts, the
/// new stake accounts (as signers), and their tracking records, in that
/// order; `lst_amounts` is zero-padded to the instruction's fixed width.
#[must_use]
pub fn liquid_unstake_lst(
  accounts: &LiquidUnstakeLstAccounts,
  lst_amounts: [u64; 5],
  minimum_lamports_out: Option<u64>,
  remaining_accounts: Vec<AccountMeta>,
) -> Instruction {
  let args = LiquidUnstakeLstArgs {
    lst_amounts,
    minimum_lamports_out,
  };
  let mut metas = vec![
    AccountMeta::new(accounts.pool, false),
    AccountMeta::new(accounts.payer, true),
    AccountMeta::new_readonly(accounts.payer, true),
    AccountMeta::new(accounts.user_lst_account, false),
    AccountMeta::new(accounts.sol_vault, false),
    AccountMeta::new(accounts.payer, false),
    AccountMeta::new(accounts.manager_fee_account, false),
    AccountMeta::new(accounts.stake_pool, false),
    AccountMeta::new(accounts.validator_list, false),
    AccountMeta::new_readonly(accounts.withdraw_authority, false),
    AccountMeta::new(accounts.stake_pool_manager_fee_account, false),
    AccountMeta::new(accounts.stake_pool_mint, false),
    AccountMeta::new_readonly(token::ID, false),
    AccountMeta::new_readonly(STAKE_PROGRAM_ID, false),
    AccountMeta::new_readonly(stake_pool::ID, false),
    AccountMeta::new_readonly(system_program::ID, false),
    AccountMeta::new_readonly(sysvar::clock::ID, false),
    AccountMeta::new_readonly(sysvar::stake_history::ID, false),
  ];
  metas.extend(remaining_accounts);
  Instruction {
    program_id: liquid_unstaker::ID,
    accounts: metas,
    data: anchor_ix_data(instruction_sighash("liquid_unstake_lst"), &args),
  }
}
