//! Liquid unstake flow: plan withdrawal sources, materialize the new stake
//! account keypairs, and build the aggregate redemption instruction.

use anchor_client::solana_sdk::instruction::{AccountMeta, Instruction};
use anchor_client::solana_sdk::pubkey::Pubkey;
use anchor_client::solana_sdk::signature::Keypair;
use anchor_client::solana_sdk::signer::Signer;
use anchor_client::solana_sdk::system_instruction;
use futures::try_join;
use itertools::Itertools;
use vault_core::{
  plan_withdrawal, Result, WithdrawSource, MAX_WITHDRAW_SOURCES,
};
use vault_programs::instructions::{
  liquid_unstake_lst, LiquidUnstakeLstAccounts, STAKE_ACCOUNT_SPACE,
  STAKE_PROGRAM_ID,
};
use vault_programs::pda;
use vault_programs::stake_pool::MINIMUM_ACTIVE_STAKE;
use vault_programs::tokens::{
  STAKE_POOL_ADDRESS, UNSTAKE_POOL_ADDRESS, VSOL_MINT,
};

use crate::pool_state::PoolStateReader;
use crate::rpc::LedgerProvider;

/// Instruction sequence for one liquid unstake, with the new stake account
/// keypairs that must co-sign. Owned by a single in-flight request.
pub struct UnstakePlan {
  pub instructions: Vec<Instruction>,
  pub signers: Vec<Keypair>,
  pub sources: Vec<WithdrawSource>,
}

/// Builds the liquid-unstake plan for `pool_tokens` derivative tokens.
///
/// Source selection is pure ([`plan_withdrawal`]); key material is only
/// generated afterwards, one keypair per selected source.
///
/// # Errors
/// * [`vault_core::BuilderError::InsufficientLiquidity`] when the pool
///   cannot cover the amount
/// * Pool read and decode errors
pub(crate) async fn build_liquid_unstake_plan<L: LedgerProvider>(
  ledger: &L,
  reader: &PoolStateReader<L>,
  payer: Pubkey,
  pool_tokens: u64,
  minimum_lamports_out: Option<u64>,
) -> Result<UnstakePlan> {
  let (stake_pool, unstake_pool, rent_exemption) = try_join!(
    reader.read_stake_pool(),
    reader.read_unstake_pool(),
    ledger.minimum_balance_for_rent_exemption(STAKE_ACCOUNT_SPACE as usize),
  )?;
  let min_balance = rent_exemption + MINIMUM_ACTIVE_STAKE;

  let (entries, reserve) = try_join!(
    reader.read_validator_entries(&stake_pool),
    reader.read_reserve(&stake_pool, rent_exemption),
  )?;

  let sources = plan_withdrawal(
    pool_tokens,
    &entries,
    reserve,
    &stake_pool.summary(),
    min_balance,
    false,
  )?;

  let signers = materialize_signers(sources.len());

  // Each selected source gets a freshly funded stake account to split into.
  let mut instructions = signers
    .iter()
    .map(|keypair| {
      system_instruction::create_account(
        &payer,
        &keypair.pubkey(),
        rent_exemption,
        STAKE_ACCOUNT_SPACE,
        &STAKE_PROGRAM_ID,
      )
    })
    .collect_vec();

  let remaining_accounts = sources
    .iter()
    .map(|source| AccountMeta::new(source.stake_address, false))
    .chain(
      signers
        .iter()
        .map(|keypair| AccountMeta::new(keypair.pubkey(), true)),
    )
    .chain(signers.iter().map(|keypair| {
      AccountMeta::new(pda::stake_account_info(keypair.pubkey()), false)
    }))
    .collect_vec();

  let mut lst_amounts = [0u64; MAX_WITHDRAW_SOURCES];
  for (slot, source) in lst_amounts.iter_mut().zip(sources.iter()) {
    *slot = source.pool_tokens;
  }

  instructions.push(liquid_unstake_lst(
    &LiquidUnstakeLstAccounts {
      pool: UNSTAKE_POOL_ADDRESS,
      payer,
      user_lst_account: pda::ata(payer, VSOL_MINT),
      sol_vault: pda::sol_vault(UNSTAKE_POOL_ADDRESS),
      manager_fee_account: unstake_pool.manager_fee_account,
      stake_pool: STAKE_POOL_ADDRESS,
      validator_list: stake_pool.validator_list,
      withdraw_authority: pda::withdraw_authority(STAKE_POOL_ADDRESS),
      stake_pool_manager_fee_account: stake_pool.manager_fee_account,
      stake_pool_mint: stake_pool.pool_mint,
    },
    lst_amounts,
    minimum_lamports_out,
    remaining_accounts,
  ));

  Ok(UnstakePlan {
    instructions,
    signers,
    sources,
  })
}

/// Generates one stake-account keypair per withdraw source. Key material
/// lives only for the duration of the build and co-signs exactly once.
pub(crate) fn materialize_signers(count: usize) -> Vec<Keypair> {
  (0..count).map(|_| Keypair::new()).collect()
}

/// The caller's derivative token balance, reading a missing token account
/// as zero.
pub(crate) async fn read_token_balance_or_zero<L: LedgerProvider>(
  ledger: &L,
  token_account: &Pubkey,
) -> Result<u64> {
  Ok(ledger.get_token_balance(token_account).await?.unwrap_or(0))
}
