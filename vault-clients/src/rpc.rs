//! Ledger access abstraction (enables testing).

use std::sync::Arc;

use anchor_client::solana_client::client_error::ClientError;
use anchor_client::solana_client::rpc_config::RpcSimulateTransactionConfig;
use anchor_client::solana_sdk::account::Account;
use anchor_client::solana_sdk::commitment_config::CommitmentConfig;
use anchor_client::solana_sdk::hash::Hash;
use anchor_client::solana_sdk::pubkey::Pubkey;
use anchor_client::solana_sdk::transaction::VersionedTransaction;
use async_trait::async_trait;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use vault_core::{BuilderError, Result};

/// Narrow view of a transaction simulation, decoupled from the RPC client's
/// response types so test doubles stay trivial to construct.
#[derive(Clone, Debug, Default)]
pub struct SimulationOutcome {
  pub err: Option<String>,
  pub units_consumed: Option<u64>,
  pub logs: Option<Vec<String>>,
}

/// Abstraction over the ledger reads and simulation the builder needs.
#[async_trait]
pub trait LedgerProvider: Send + Sync {
  /// Fetches an account, `None` when it does not exist.
  async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>>;

  async fn get_balance(&self, address: &Pubkey) -> Result<u64>;

  /// Token amount held by `token_account`, `None` when the account does not
  /// exist. Absence is not an error in this read path.
  async fn get_token_balance(
    &self,
    token_account: &Pubkey,
  ) -> Result<Option<u64>>;

  async fn minimum_balance_for_rent_exemption(
    &self,
    data_len: usize,
  ) -> Result<u64>;

  async fn latest_blockhash(&self) -> Result<Hash>;

  /// Simulates without committing on-chain.
  async fn simulate_transaction(
    &self,
    transaction: &VersionedTransaction,
  ) -> Result<SimulationOutcome>;

  async fn get_program_accounts(
    &self,
    program_id: &Pubkey,
  ) -> Result<Vec<(Pubkey, Account)>>;

  async fn get_multiple_accounts(
    &self,
    addresses: &[Pubkey],
  ) -> Result<Vec<Option<Account>>>;
}

/// Default configuration for probe simulations.
#[must_use]
pub fn simulation_config() -> RpcSimulateTransactionConfig {
  RpcSimulateTransactionConfig {
    sig_verify: false,
    replace_recent_blockhash: true,
    commitment: Some(CommitmentConfig::confirmed()),
    ..Default::default()
  }
}

fn rpc_err(err: ClientError) -> BuilderError {
  BuilderError::Rpc(err.to_string())
}

/// Real ledger provider wrapping Solana's nonblocking `RpcClient`.
pub struct SolanaLedger {
  client: Arc<RpcClient>,
  commitment: CommitmentConfig,
}

impl SolanaLedger {
  #[must_use]
  pub fn new(client: Arc<RpcClient>, commitment: CommitmentConfig) -> Self {
    Self { client, commitment }
  }

  #[must_use]
  pub fn from_url(url: &str, commitment: CommitmentConfig) -> Self {
    let client = Arc::new(RpcClient::new_with_commitment(
      url.to_string(),
      commitment,
    ));
    Self::new(client, commitment)
  }
}

#[async_trait]
impl LedgerProvider for SolanaLedger {
  async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
    let response = self
      .client
      .get_account_with_commitment(address, self.commitment)
      .await
      .map_err(rpc_err)?;
    Ok(response.value)
  }

  async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
    self.client.get_balance(address).await.map_err(rpc_err)
  }

  async fn get_token_balance(
    &self,
    token_account: &Pubkey,
  ) -> Result<Option<u64>> {
    match self.client.get_token_account_balance(token_account).await {
      Ok(balance) => {
        let amount = balance.amount.parse::<u64>().map_err(|e| {
          BuilderError::Decode {
            account: "token balance",
            reason: e.to_string(),
          }
        })?;
        Ok(Some(amount))
      }
      // The RPC reports a missing token account as an invalid-param error.
      Err(err) if err.to_string().contains("could not find account") => {
        tracing::debug!(%token_account, "token account absent, reading as zero");
        Ok(None)
      }
      Err(err) => Err(rpc_err(err)),
    }
  }

  async fn minimum_balance_for_rent_exemption(
    &self,
    data_len: usize,
  ) -> Result<u64> {
    self
      .client
      .get_minimum_balance_for_rent_exemption(data_len)
      .await
      .map_err(rpc_err)
  }

  async fn latest_blockhash(&self) -> Result<Hash> {
    self.client.get_latest_blockhash().await.map_err(rpc_err)
  }

  async fn simulate_transaction(
    &self,
    transaction: &VersionedTransaction,
  ) -> Result<SimulationOutcome> {
    let response = self
      .client
      .simulate_transaction_with_config(transaction, simulation_config())
      .await
      .map_err(rpc_err)?;
    let value = response.value;
    Ok(SimulationOutcome {
      err: value.err.map(|e| e.to_string()),
      units_consumed: value.units_consumed,
      logs: value.logs,
    })
  }

  async fn get_program_accounts(
    &self,
    program_id: &Pubkey,
  ) -> Result<Vec<(Pubkey, Account)>> {
    self
      .client
      .get_program_accounts(program_id)
      .await
      .map_err(rpc_err)
  }

  async fn get_multiple_accounts(
    &self,
    addresses: &[Pubkey],
  ) -> Result<Vec<Option<Account>>> {
    self
      .client
      .get_multiple_accounts(addresses)
      .await
      .map_err(rpc_err)
  }
}
