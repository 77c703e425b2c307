//! Swap aggregator client (quote-then-swap).
//!
//! Fallback path for unstaking when the liquid pool cannot serve the
//! request. The aggregator's swap response carries a fully assembled
//! transaction blob, compute-budget instructions included; it is passed
//! through verbatim and never re-estimated locally.

use anchor_client::solana_sdk::pubkey::Pubkey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vault_core::{BuilderError, Result};

/// Cap on the priority fee the aggregator may attach, in lamports.
const MAX_PRIORITY_FEE_LAMPORTS: u64 = 1_000_000;

#[derive(Clone, Copy, Debug)]
pub struct SwapQuoteParams {
  pub input_mint: Pubkey,
  pub output_mint: Pubkey,
  pub amount: u64,
  pub slippage_bps: u16,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequest {
  user_public_key: String,
  quote_response: Value,
  wrap_and_unwrap_sol: bool,
  use_shared_accounts: bool,
  dynamic_compute_unit_limit: bool,
  dynamic_slippage: bool,
  prioritization_fee_lamports: PrioritizationFee,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrioritizationFee {
  priority_level_with_max_lamports: PriorityLevelWithMaxLamports,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PriorityLevelWithMaxLamports {
  priority_level: &'static str,
  max_lamports: u64,
  global: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
  swap_transaction: Option<String>,
}

pub struct SwapAggregator {
  http: reqwest::Client,
  base_url: String,
  api_key: Option<String>,
}

impl SwapAggregator {
  #[must_use]
  pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
    Self {
      http: reqwest::Client::new(),
      base_url: base_url.into(),
      api_key,
    }
  }

  fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.api_key {
      Some(key) => builder.header("x-api-key", key),
      None => builder,
    }
  }

  /// Requests an exact-in quote for the given pair.
  ///
  /// The quote body is kept opaque: the swap call echoes it back to the
  /// aggregator unchanged.
  ///
  /// # Errors
  /// [`BuilderError::AggregatorUnavailable`] on transport failure or a
  /// non-success status.
  pub async fn quote(&self, params: &SwapQuoteParams) -> Result<Value> {
    let url = format!("{}/swap/v1/quote", self.base_url);
    let response = self
      .request(self.http.get(&url))
      .query(&[
        ("inputMint", params.input_mint.to_string()),
        ("outputMint", params.output_mint.to_string()),
        ("amount", params.amount.to_string()),
        ("slippageBps", params.slippage_bps.to_string()),
        ("swapMode", "ExactIn".to_string()),
      ])
      .send()
      .await
      .map_err(|e| BuilderError::AggregatorUnavailable(e.to_string()))?;
    if !response.status().is_success() {
      return Err(BuilderError::AggregatorUnavailable(format!(
        "quote failed with status {}",
        response.status()
      )));
    }
    response
      .json()
      .await
      .map_err(|e| BuilderError::AggregatorUnavailable(e.to_string()))
  }

  /// Exchanges a quote for a ready-to-sign transaction blob.
  ///
  /// # Errors
  /// [`BuilderError::AggregatorUnavailable`] on transport failure, a
  /// non-success status, or a response lacking the transaction payload.
  pub async fn swap_transaction(
    &self,
    user: &Pubkey,
    quote_response: Value,
  ) -> Result<String> {
    let url = format!("{}/swap/v1/swap", self.base_url);
    let request = SwapRequest {
      user_public_key: user.to_string(),
      quote_response,
      wrap_and_unwrap_sol: true,
      use_shared_accounts: true,
      dynamic_compute_unit_limit: true,
      dynamic_slippage: true,
      prioritization_fee_lamports: PrioritizationFee {
        priority_level_with_max_lamports: PriorityLevelWithMaxLamports {
          priority_level: "medium",
          max_lamports: MAX_PRIORITY_FEE_LAMPORTS,
          global: false,
        },
      },
    };
    let response = self
      .request(self.http.post(&url))
      .json(&request)
      .send()
      .await
      .map_err(|e| BuilderError::AggregatorUnavailable(e.to_string()))?;
    if !response.status().is_success() {
      return Err(BuilderError::AggregatorUnavailable(format!(
        "swap failed with status {}",
        response.status()
      )));
    }
    let body: SwapResponse = response
      .json()
      .await
      .map_err(|e| BuilderError::AggregatorUnavailable(e.to_string()))?;
    body
      .swap_transaction
      .filter(|tx| !tx.is_empty())
      .ok_or_else(|| {
        BuilderError::AggregatorUnavailable(
          "response lacks a transaction payload".to_string(),
        )
      })
  }
}
