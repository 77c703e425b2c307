//! In-memory ledger double shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anchor_client::solana_sdk::account::Account;
use anchor_client::solana_sdk::hash::Hash;
use anchor_client::solana_sdk::pubkey::Pubkey;
use anchor_client::solana_sdk::transaction::VersionedTransaction;
use async_trait::async_trait;
use vault_clients::rpc::{LedgerProvider, SimulationOutcome};
use vault_core::Fee;
use vault_core::Result;
use vault_programs::state::{
  account_discriminator, AccountType, FutureEpochFee, Lockup, StakePool,
  StakeStatus, UnstakePool, ValidatorList, ValidatorListHeader,
  ValidatorStakeInfo,
};

pub const RENT_EXEMPTION: u64 = 2_282_880;

#[derive(Default)]
pub struct MockLedger {
  pub accounts: HashMap<Pubkey, Account>,
  pub balances: HashMap<Pubkey, u64>,
  pub token_balances: HashMap<Pubkey, u64>,
  pub blockhash: Hash,
  pub simulation: SimulationOutcome,
  pub program_accounts: HashMap<Pubkey, Vec<(Pubkey, Account)>>,
  pub simulate_calls: AtomicUsize,
  pub program_account_calls: AtomicUsize,
}

impl MockLedger {
  pub fn insert_account(&mut self, address: Pubkey, data: Vec<u8>) {
    self.accounts.insert(
      address,
      Account {
        lamports: 1_000_000,
        data,
        owner: Pubkey::new_unique(),
        executable: false,
        rent_epoch: 0,
      },
    );
  }
}

#[async_trait]
impl LedgerProvider for MockLedger {
  async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
    Ok(self.accounts.get(address).cloned())
  }

  async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
    Ok(self.balances.get(address).copied().unwrap_or(0))
  }

  async fn get_token_balance(
    &self,
    token_account: &Pubkey,
  ) -> Result<Option<u64>> {
    Ok(self.token_balances.get(token_account).copied())
  }

  async fn minimum_balance_for_rent_exemption(
    &self,
    _data_len: usize,
  ) -> Result<u64> {
    Ok(RENT_EXEMPTION)
  }

  async fn latest_blockhash(&self) -> Result<Hash> {
    Ok(self.blockhash)
  }

  async fn simulate_transaction(
    &self,
    _transaction: &VersionedTransaction,
  ) -> Result<SimulationOutcome> {
    self.simulate_calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.simulation.clone())
  }

  async fn get_program_accounts(
    &self,
    program_id: &Pubkey,
  ) -> Result<Vec<(Pubkey, Account)>> {
    self.program_account_calls.fetch_add(1, Ordering::SeqCst);
    Ok(
      self
        .program_accounts
        .get(program_id)
        .cloned()
        .unwrap_or_default(),
    )
  }

  async fn get_multiple_accounts(
    &self,
    addresses: &[Pubkey],
  ) -> Result<Vec<Option<Account>>> {
    Ok(
      addresses
        .iter()
        .map(|address| self.accounts.get(address).cloned())
        .collect(),
    )
  }
}

/// A stake pool trading 1:1 with no fees, suitable for exact assertions.
pub fn sample_stake_pool() -> StakePool {
  StakePool {
    account_type: AccountType::StakePool,
    manager: Pubkey::new_unique(),
    staker: Pubkey::new_unique(),
    stake_deposit_authority: Pubkey::new_unique(),
    stake_withdraw_bump_seed: 255,
    validator_list: Pubkey::new_unique(),
    reserve_stake: Pubkey::new_unique(),
    pool_mint: vault_programs::tokens::VSOL_MINT,
    manager_fee_account: Pubkey::new_unique(),
    token_program_id: anchor_spl::token::ID,
    total_lamports: 1_000_000_000_000,
    pool_token_supply: 1_000_000_000_000,
    last_update_epoch: 700,
    lockup: Lockup {
      unix_timestamp: 0,
      epoch: 0,
      custodian: Pubkey::default(),
    },
    epoch_fee: Fee {
      denominator: 100,
      numerator: 2,
    },
    next_epoch_fee: FutureEpochFee::None,
    preferred_deposit_validator_vote_address: None,
    preferred_withdraw_validator_vote_address: None,
    stake_deposit_fee: Fee::default(),
    stake_withdrawal_fee: Fee::default(),
    next_stake_withdrawal_fee: FutureEpochFee::None,
    stake_referral_fee: 0,
    sol_deposit_authority: None,
    sol_deposit_fee: Fee::default(),
    sol_referral_fee: 0,
    sol_withdraw_authority: None,
    sol_withdrawal_fee: Fee::default(),
    next_sol_withdrawal_fee: FutureEpochFee::None,
    last_epoch_pool_token_supply: 0,
    last_epoch_total_lamports: 0,
  }
}

pub fn sample_validator_list(votes: &[(Pubkey, u64)]) -> ValidatorList {
  ValidatorList {
    header: ValidatorListHeader {
      account_type: AccountType::ValidatorList,
      max_validators: 100,
    },
    validators: votes
      .iter()
      .map(|(vote, active)| ValidatorStakeInfo {
        active_stake_lamports: *active,
        transient_stake_lamports: 0,
        last_update_epoch: 700,
        transient_seed_suffix: 0,
        unused: 0,
        validator_seed_suffix: 0,
        status: StakeStatus::Active,
        vote_account_address: *vote,
      })
      .collect(),
  }
}

pub fn sample_unstake_pool() -> UnstakePool {
  UnstakePool {
    authority: Pubkey::new_unique(),
    sol_vault: Pubkey::new_unique(),
    lp_mint: Pubkey::new_unique(),
    manager_fee_account: Pubkey::new_unique(),
    total_lp_tokens: 500_000_000_000,
    total_accrued_fees: 0,
    total_deactivating_stake: 0,
    fee_max: 30,
    fee_min: 3,
    min_sol_for_min_fee: 1_000_000_000,
    manager_fee_pct: 10,
    bump: 254,
    sol_vault_bump: 253,
    sol_vault_lamports: 800_000_000_000,
    sol_vault_lamports_cap: 1_000_000_000_000,
  }
}

pub fn anchor_account_bytes<T: anchor_lang::AnchorSerialize>(
  name: &str,
  value: &T,
) -> Vec<u8> {
  let mut bytes = account_discriminator(name).to_vec();
  value
    .serialize(&mut bytes)
    .expect("serialization into a Vec cannot fail");
  bytes
}
