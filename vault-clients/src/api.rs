//! REST payload shapes.
//!
//! The HTTP layer itself lives outside this crate; these types pin down the
//! request and response bodies it exchanges with the assembler. Request
//! fields arrive as strings and are validated into typed parameters before
//! any network call.

use anchor_client::solana_sdk::pubkey::Pubkey;
use serde::{Deserialize, Serialize};
use vault_core::{BuilderError, Result};

/// Aggregator slippage applied when the request does not specify one (1%).
pub const DEFAULT_SLIPPAGE_BPS: u16 = 100;

/// How the stake response should be packaged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StakeMode {
  /// A serialized transaction pre-signed by the ephemeral transfer account.
  #[default]
  Transaction,
  /// The compiled message plus the ephemeral keypair, for callers that
  /// assemble signatures themselves.
  UnsignedMessage,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeRequest {
  pub address: String,
  pub mint: String,
  pub amount: String,
  pub balance: String,
  #[serde(default)]
  pub target: Option<String>,
  #[serde(default)]
  pub mode: StakeMode,
}

pub(crate) struct StakeParams {
  pub address: Pubkey,
  pub mint: Pubkey,
  pub amount: u64,
  pub balance: u64,
  pub target: Option<Pubkey>,
  pub mode: StakeMode,
}

impl StakeRequest {
  pub(crate) fn parse(&self) -> Result<StakeParams> {
    Ok(StakeParams {
      address: parse_pubkey("address", &self.address)?,
      mint: parse_pubkey("mint", &self.mint)?,
      amount: parse_lamports("amount", &self.amount)?,
      balance: parse_lamports("balance", &self.balance)?,
      target: self
        .target
        .as_deref()
        .map(|t| parse_pubkey("target", t))
        .transpose()?,
      mode: self.mode,
    })
  }
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum StakeResponse {
  Transaction {
    transaction: String,
  },
  #[serde(rename_all = "camelCase")]
  UnsignedMessage {
    user_sol_transfer: String,
    message: String,
  },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnstakeRequest {
  pub address: String,
  pub amount: String,
  #[serde(default)]
  pub slippage_bps: Option<u16>,
  #[serde(default)]
  pub force_aggregator: bool,
}

pub(crate) struct UnstakeParams {
  pub address: Pubkey,
  pub amount: u64,
  pub slippage_bps: u16,
  pub force_aggregator: bool,
}

impl UnstakeRequest {
  pub(crate) fn parse(&self) -> Result<UnstakeParams> {
    Ok(UnstakeParams {
      address: parse_pubkey("address", &self.address)?,
      amount: parse_lamports("amount", &self.amount)?,
      slippage_bps: self.slippage_bps.unwrap_or(DEFAULT_SLIPPAGE_BPS),
      force_aggregator: self.force_aggregator,
    })
  }
}

/// Which path produced the unstake transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnstakeSource {
  #[serde(rename = "liquid_pool")]
  LiquidPool,
  #[serde(rename = "aggregator")]
  Aggregator,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnstakeResponse {
  pub transaction: String,
  pub source: UnstakeSource,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancesRequest {
  pub address: String,
  pub mint: String,
}

impl BalancesRequest {
  /// Validates both fields into addresses.
  ///
  /// # Errors
  /// [`BuilderError::Validation`] on a malformed field.
  pub fn parse(&self) -> Result<(Pubkey, Pubkey)> {
    Ok((
      parse_pubkey("address", &self.address)?,
      parse_pubkey("mint", &self.mint)?,
    ))
  }
}

/// Lamport and token balances, stringified for JSON safety.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
  pub sol: String,
  pub lst: String,
}

pub(crate) fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey> {
  value.parse::<Pubkey>().map_err(|_| {
    BuilderError::Validation(format!("{field} is not a valid address"))
  })
}

pub(crate) fn parse_lamports(field: &str, value: &str) -> Result<u64> {
  value.parse::<u64>().map_err(|_| {
    BuilderError::Validation(format!(
      "{field} must be a non-negative integer amount"
    ))
  })
}
