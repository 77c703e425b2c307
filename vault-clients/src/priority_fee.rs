//! Priority-fee oracle client.
//!
//! The oracle speaks JSON-RPC: it takes the serialized probe transaction
//! and a named priority tier and answers with a microLamports-per-unit
//! estimate. Unreachable endpoints and malformed responses both surface as
//! [`BuilderError::FeeOracleUnavailable`]; there is no retry.

use anchor_client::solana_sdk::bs58;
use anchor_client::solana_sdk::transaction::VersionedTransaction;
use serde::{Deserialize, Serialize};
use vault_core::{BuilderError, Result};

/// Named priority tier understood by the fee oracle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum PriorityLevel {
  Min,
  Low,
  #[default]
  Medium,
  High,
  VeryHigh,
}

#[derive(Serialize)]
struct OracleRequest<'a> {
  jsonrpc: &'static str,
  id: &'static str,
  method: &'static str,
  params: [OracleParams<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OracleParams<'a> {
  transaction: &'a str,
  options: OracleOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OracleOptions {
  priority_level: PriorityLevel,
}

#[derive(Deserialize)]
struct OracleResponse {
  result: Option<OracleResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OracleResult {
  priority_fee_estimate: Option<f64>,
}

pub struct PriorityFeeOracle {
  http: reqwest::Client,
  url: String,
}

impl PriorityFeeOracle {
  #[must_use]
  pub fn new(url: impl Into<String>) -> Self {
    Self {
      http: reqwest::Client::new(),
      url: url.into(),
    }
  }

  /// Queries the oracle for a priority fee in microLamports per compute
  /// unit, quoted against the serialized probe transaction.
  ///
  /// # Errors
  /// [`BuilderError::FeeOracleUnavailable`] when the oracle is unreachable,
  /// answers a non-success status, or returns a malformed body.
  pub async fn estimate(
    &self,
    transaction: &VersionedTransaction,
    priority_level: PriorityLevel,
  ) -> Result<u64> {
    let serialized = bincode::serialize(transaction)
      .map_err(|e| BuilderError::Encode(e.to_string()))?;
    let encoded = bs58::encode(serialized).into_string();
    let request = OracleRequest {
      jsonrpc: "2.0",
      id: "1",
      method: "getPriorityFeeEstimate",
      params: [OracleParams {
        transaction: &encoded,
        options: OracleOptions { priority_level },
      }],
    };

    let response = self
      .http
      .post(&self.url)
      .json(&request)
      .send()
      .await
      .map_err(|e| BuilderError::FeeOracleUnavailable(e.to_string()))?;
    if !response.status().is_success() {
      return Err(BuilderError::FeeOracleUnavailable(format!(
        "status {}",
        response.status()
      )));
    }

    let body: OracleResponse = response
      .json()
      .await
      .map_err(|e| BuilderError::FeeOracleUnavailable(e.to_string()))?;
    let estimate = body
      .result
      .and_then(|r| r.priority_fee_estimate)
      .ok_or_else(|| {
        BuilderError::FeeOracleUnavailable(
          "response missing priorityFeeEstimate".to_string(),
        )
      })?;
    Ok(estimate.max(0.0).round() as u64)
  }
}
