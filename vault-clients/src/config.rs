//! Assembler configuration.

use anchor_client::solana_sdk::commitment_config::CommitmentConfig;
use vault_core::{BuilderError, Result};

use crate::priority_fee::PriorityLevel;

#[derive(Clone, Debug)]
pub struct AssemblerConfig {
  pub rpc_url: String,
  pub fee_oracle_url: String,
  pub aggregator_url: String,
  pub aggregator_api_key: Option<String>,
  pub priority_level: PriorityLevel,
  pub commitment: CommitmentConfig,
}

impl AssemblerConfig {
  #[must_use]
  pub fn new(
    rpc_url: impl Into<String>,
    fee_oracle_url: impl Into<String>,
    aggregator_url: impl Into<String>,
  ) -> Self {
    Self {
      rpc_url: rpc_url.into(),
      fee_oracle_url: fee_oracle_url.into(),
      aggregator_url: aggregator_url.into(),
      aggregator_api_key: None,
      priority_level: PriorityLevel::default(),
      commitment: CommitmentConfig::confirmed(),
    }
  }

  /// Reads `RPC_URL`, `FEE_ORACLE_URL`, `AGGREGATOR_URL`, and the optional
  /// `AGGREGATOR_API_KEY` from the environment.
  ///
  /// # Errors
  /// [`BuilderError::Configuration`] when a required variable is unset.
  pub fn from_env() -> Result<Self> {
    let mut config = Self::new(
      required_env("RPC_URL")?,
      required_env("FEE_ORACLE_URL")?,
      required_env("AGGREGATOR_URL")?,
    );
    config.aggregator_api_key = std::env::var("AGGREGATOR_API_KEY").ok();
    Ok(config)
  }
}

fn required_env(name: &str) -> Result<String> {
  std::env::var(name)
    .map_err(|_| BuilderError::Configuration(format!("{name} is required")))
}
