//! Stake flow: deposit SOL into the pool and mint the derivative token.

use anchor_client::solana_sdk::instruction::Instruction;
use anchor_client::solana_sdk::pubkey::Pubkey;
use anchor_client::solana_sdk::system_instruction;
use anchor_spl::associated_token::spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use futures::try_join;
use vault_core::{BuilderError, Result};
use vault_programs::instructions::{
  deposit_sol, direct, mint_dst, redirect, DepositSolAccounts, MintDstAccounts,
};
use vault_programs::pda;
use vault_programs::tokens::{STAKE_POOL_ADDRESS, VSOL_MINT};

use crate::pool_state::PoolStateReader;
use crate::rpc::LedgerProvider;

/// Instructions for one stake request plus the amounts they encode.
pub struct StakePlan {
  pub instructions: Vec<Instruction>,
  pub deposit_lamports: u64,
  pub mint_amount: u64,
}

/// Builds the deposit-and-mint instruction sequence.
///
/// `ephemeral_funding` is the throwaway transfer account the pool program
/// consumes as its funding source; the caller holds its keypair and must
/// co-sign. Associated token accounts are only created when absent, via the
/// idempotent create instruction.
///
/// # Errors
/// * [`BuilderError::InsufficientBalance`] when the payer cannot fund the
///   deposit
/// * Pool read and decode errors
pub(crate) async fn build_stake_plan<L: LedgerProvider>(
  ledger: &L,
  reader: &PoolStateReader<L>,
  payer: Pubkey,
  lst_mint: Pubkey,
  deposit_lamports: u64,
  ephemeral_funding: Pubkey,
) -> Result<StakePlan> {
  let lst_ata = pda::ata(payer, lst_mint);
  let vsol_ata = pda::ata(payer, VSOL_MINT);

  let (lst_ata_account, vsol_ata_account, payer_balance, stake_pool) = try_join!(
    ledger.get_account(&lst_ata),
    ledger.get_account(&vsol_ata),
    ledger.get_balance(&payer),
    reader.read_stake_pool(),
  )?;

  if payer_balance < deposit_lamports {
    return Err(BuilderError::InsufficientBalance {
      required: deposit_lamports,
      available: payer_balance,
    });
  }

  let mut instructions = Vec::new();
  if lst_ata_account.is_none() {
    instructions.push(create_ata_instruction(payer, lst_mint));
  }
  if vsol_ata_account.is_none() && vsol_ata != lst_ata {
    instructions.push(create_ata_instruction(payer, VSOL_MINT));
  }

  instructions.push(system_instruction::transfer(
    &payer,
    &ephemeral_funding,
    deposit_lamports,
  ));
  instructions.push(deposit_sol(
    &DepositSolAccounts {
      stake_pool: STAKE_POOL_ADDRESS,
      withdraw_authority: pda::withdraw_authority(STAKE_POOL_ADDRESS),
      reserve_stake: stake_pool.reserve_stake,
      funding_account: ephemeral_funding,
      destination_pool_account: vsol_ata,
      manager_fee_account: stake_pool.manager_fee_account,
      referral_pool_account: vsol_ata,
      pool_mint: stake_pool.pool_mint,
    },
    deposit_lamports,
  ));

  let mint_amount = stake_pool.summary().mint_amount(deposit_lamports)?;
  instructions.push(mint_dst(
    &MintDstAccounts {
      dst_info: pda::dst_info(lst_mint),
      dst_mint: lst_mint,
      dst_token_account: lst_ata,
      source_vsol_account: vsol_ata,
      owner: payer,
    },
    mint_amount,
  ));

  Ok(StakePlan {
    instructions,
    deposit_lamports,
    mint_amount,
  })
}

/// Builds the stake-direction prefix: create-and-set for a first-time
/// owner, update when a director account already exists.
pub(crate) async fn build_direct_instructions<L: LedgerProvider>(
  reader: &PoolStateReader<L>,
  owner: Pubkey,
  target: Pubkey,
) -> Result<Vec<Instruction>> {
  let director = pda::director(owner);
  let updating_existing = reader.director_exists(&director).await?;
  let instruction = if updating_existing {
    redirect(owner, target)
  } else {
    direct(owner, target)
  };
  Ok(vec![instruction])
}

fn create_ata_instruction(owner: Pubkey, mint: Pubkey) -> Instruction {
  create_associated_token_account_idempotent(
    &owner, // payer
    &owner,
    &mint,
    &anchor_spl::token::ID,
  )
}
