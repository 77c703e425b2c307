//! Error taxonomy for the transaction builder.
//!
//! Variants map onto the boundary's HTTP-equivalent classes via
//! [`BuilderError::status`]: request validation and business-rule violations
//! are 400s, missing accounts and metadata are 404s, upstream and internal
//! failures are 500s. Validation errors are produced before any network
//! call; [`BuilderError::SimulationFailed`] is the one variant callers treat
//! as a signal (it selects the unstake fallback path) rather than a hard
//! failure.

use anchor_lang::prelude::Pubkey;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuilderError>;

#[derive(Error, Debug)]
pub enum BuilderError {
  /// Malformed or missing request fields.
  #[error("invalid request: {0}")]
  Validation(String),

  /// Directed staking requested for a mint the director does not serve.
  #[error("unsupported mint {actual}: directed staking requires {expected}")]
  UnsupportedMint { expected: Pubkey, actual: Pubkey },

  /// A required on-chain account does not exist.
  #[error("account not found: {0}")]
  AccountNotFound(Pubkey),

  /// Token metadata is absent for the given mint.
  #[error("token metadata not found for mint {0}")]
  MetadataNotFound(Pubkey),

  #[error(
    "insufficient balance: required {required} lamports, available {available}"
  )]
  InsufficientBalance { required: u64, available: u64 },

  #[error(
    "insufficient pool liquidity: requested {requested} pool tokens, only \
     {covered} coverable"
  )]
  InsufficientLiquidity { requested: u64, covered: u64 },

  /// Arithmetic produced a negative, overflowing, or undefined result.
  #[error("invalid amount: {0}")]
  InvalidAmount(String),

  /// The probe transaction reported an execution error under simulation.
  #[error("simulation failed: {0}")]
  SimulationFailed(String),

  #[error("priority fee oracle unavailable: {0}")]
  FeeOracleUnavailable(String),

  #[error("swap aggregator unavailable: {0}")]
  AggregatorUnavailable(String),

  /// An account's byte layout did not match the expected schema.
  #[error("failed to decode {account} account: {reason}")]
  Decode {
    account: &'static str,
    reason: String,
  },

  /// Deployment or configuration mistake. Should alert operators.
  #[error("configuration error: {0}")]
  Configuration(String),

  #[error("rpc error: {0}")]
  Rpc(String),

  #[error("failed to compile transaction message: {0}")]
  Compile(String),

  #[error("failed to encode transaction: {0}")]
  Encode(String),
}

impl BuilderError {
  /// HTTP-equivalent status class for the boundary layer.
  #[must_use]
  pub fn status(&self) -> u16 {
    match self {
      Self::Validation(_)
      | Self::UnsupportedMint { .. }
      | Self::InsufficientBalance { .. }
      | Self::InsufficientLiquidity { .. }
      | Self::InvalidAmount(_) => 400,
      Self::AccountNotFound(_) | Self::MetadataNotFound(_) => 404,
      Self::SimulationFailed(_)
      | Self::FeeOracleUnavailable(_)
      | Self::AggregatorUnavailable(_)
      | Self::Decode { .. }
      | Self::Configuration(_)
      | Self::Rpc(_)
      | Self::Compile(_)
      | Self::Encode(_) => 500,
    }
  }

  /// Whether the unstake orchestrator should attempt the aggregator path
  /// instead of surfacing this error.
  #[must_use]
  pub fn triggers_fallback(&self) -> bool {
    matches!(self, Self::SimulationFailed(_))
  }
}
