//! Readers over the stake pool and liquid unstaker pool accounts.
//!
//! Every read decodes through the explicit schemas in
//! `vault_programs::state`; the resulting summaries are spot prices and are
//! never cached across requests.

use std::sync::Arc;

use anchor_client::solana_sdk::pubkey::Pubkey;
use vault_core::{BuilderError, ReserveSource, Result, ValidatorStakeEntry};
use vault_programs::pda;
use vault_programs::state::{StakePool, UnstakePool, ValidatorList};
use vault_programs::tokens::{STAKE_POOL_ADDRESS, UNSTAKE_POOL_ADDRESS};

use crate::rpc::LedgerProvider;

pub struct PoolStateReader<L> {
  ledger: Arc<L>,
}

impl<L: LedgerProvider> PoolStateReader<L> {
  #[must_use]
  pub fn new(ledger: Arc<L>) -> Self {
    Self { ledger }
  }

  /// Fetches and decodes the stake pool state.
  ///
  /// # Errors
  /// [`BuilderError::AccountNotFound`] or [`BuilderError::Decode`].
  pub async fn read_stake_pool(&self) -> Result<StakePool> {
    let account = self
      .ledger
      .get_account(&STAKE_POOL_ADDRESS)
      .await?
      .ok_or(BuilderError::AccountNotFound(STAKE_POOL_ADDRESS))?;
    StakePool::decode(&account.data)
  }

  /// Fetches and decodes the liquid unstaker pool state.
  ///
  /// # Errors
  /// [`BuilderError::AccountNotFound`] or [`BuilderError::Decode`].
  pub async fn read_unstake_pool(&self) -> Result<UnstakePool> {
    let account = self
      .ledger
      .get_account(&UNSTAKE_POOL_ADDRESS)
      .await?
      .ok_or(BuilderError::AccountNotFound(UNSTAKE_POOL_ADDRESS))?;
    UnstakePool::decode(&account.data)
  }

  /// Reads the pool's validator list and resolves each entry's stake and
  /// transient stake addresses. Entries are returned regardless of status;
  /// the planner applies its own filtering.
  ///
  /// # Errors
  /// [`BuilderError::AccountNotFound`] or [`BuilderError::Decode`].
  pub async fn read_validator_entries(
    &self,
    pool: &StakePool,
  ) -> Result<Vec<ValidatorStakeEntry>> {
    let account = self
      .ledger
      .get_account(&pool.validator_list)
      .await?
      .ok_or(BuilderError::AccountNotFound(pool.validator_list))?;
    let list = ValidatorList::decode(&account.data)?;
    let entries = list
      .validators
      .iter()
      .map(|info| {
        let vote = info.vote_account_address;
        ValidatorStakeEntry {
          vote_address: vote,
          stake_address: pda::stake_account(vote, STAKE_POOL_ADDRESS),
          transient_stake_address: pda::transient_stake_account(
            vote,
            STAKE_POOL_ADDRESS,
            info.transient_seed_suffix,
          ),
          active_lamports: info.active_stake_lamports,
          transient_lamports: info.transient_stake_lamports,
          status: info.status.into(),
          is_preferred: pool.preferred_withdraw_validator_vote_address
            == Some(vote),
        }
      })
      .collect();
    Ok(entries)
  }

  /// Reads the pool's reserve stake balance with rent exemption deducted.
  /// A missing or rent-only reserve yields `None`.
  ///
  /// # Errors
  /// [`BuilderError::Rpc`] on ledger failure.
  pub async fn read_reserve(
    &self,
    pool: &StakePool,
    rent_exemption: u64,
  ) -> Result<Option<ReserveSource>> {
    let account = self.ledger.get_account(&pool.reserve_stake).await?;
    let lamports = account
      .map(|acc| acc.lamports.saturating_sub(rent_exemption))
      .unwrap_or(0);
    if lamports == 0 {
      return Ok(None);
    }
    Ok(Some(ReserveSource {
      stake_address: pool.reserve_stake,
      lamports,
    }))
  }

  /// Fetches a director account if one exists for `address`.
  ///
  /// # Errors
  /// [`BuilderError::Rpc`] on ledger failure.
  pub async fn director_exists(&self, director: &Pubkey) -> Result<bool> {
    let account = self.ledger.get_account(director).await?;
    Ok(
      account
        .map(|acc| acc.owner == vault_programs::directed_stake::ID)
        .unwrap_or(false),
    )
  }
}
