//! Compute-budget and priority-fee estimation.
//!
//! The estimator compiles a throwaway probe from the candidate
//! instructions, simulates it to discover the true compute-unit cost, and
//! prices those units through the external fee oracle. The caller folds the
//! resulting budget back into the final transaction; the
//! probe → simulate → price chain is strictly sequential because each
//! stage's output feeds the next.

use std::sync::Arc;

use anchor_client::solana_sdk::compute_budget::ComputeBudgetInstruction;
use anchor_client::solana_sdk::hash::Hash;
use anchor_client::solana_sdk::instruction::Instruction;
use anchor_client::solana_sdk::message::{v0, VersionedMessage};
use anchor_client::solana_sdk::pubkey::Pubkey;
use anchor_client::solana_sdk::signature::Signature;
use anchor_client::solana_sdk::transaction::VersionedTransaction;
use vault_core::{BuilderError, Result};

use crate::priority_fee::{PriorityFeeOracle, PriorityLevel};
use crate::rpc::LedgerProvider;

/// Safety margin added on top of simulated units for stake and mint paths.
pub const STAKE_COMPUTE_MARGIN: u64 = 3_000;

/// Margin for liquidity-pool redemption, which touches a variable number of
/// stake accounts.
pub const UNSTAKE_COMPUTE_MARGIN: u64 = 50_000;

/// Hard ceiling on the requested compute-unit limit.
pub const MAX_COMPUTE_UNIT_LIMIT: u64 = 800_000;

/// Which safety margin to apply to the simulated unit count.
#[derive(Clone, Copy, Debug)]
pub enum ComputeMargin {
  Stake,
  LiquidUnstake,
}

impl ComputeMargin {
  #[must_use]
  fn apply(self, consumed_units: u64) -> u64 {
    match self {
      Self::Stake => consumed_units + STAKE_COMPUTE_MARGIN,
      Self::LiquidUnstake => {
        (consumed_units + UNSTAKE_COMPUTE_MARGIN).min(MAX_COMPUTE_UNIT_LIMIT)
      }
    }
  }
}

/// Final compute budget for one transaction, derived from a fresh
/// simulation and never reused.
#[derive(Clone, Copy, Debug)]
pub struct FeeEstimate {
  pub compute_unit_limit: u32,
  pub compute_unit_price_micro_lamports: u64,
}

impl FeeEstimate {
  /// The two-instruction compute-budget prefix for the final transaction.
  #[must_use]
  pub fn budget_instructions(&self) -> [Instruction; 2] {
    [
      ComputeBudgetInstruction::set_compute_unit_limit(self.compute_unit_limit),
      ComputeBudgetInstruction::set_compute_unit_price(
        self.compute_unit_price_micro_lamports,
      ),
    ]
  }
}

/// Compiles a probe transaction with dummy signatures for simulation.
///
/// # Errors
/// [`BuilderError::Compile`] when message compilation fails.
pub fn probe_transaction(
  payer: &Pubkey,
  instructions: &[Instruction],
  recent_blockhash: Hash,
) -> Result<VersionedTransaction> {
  let message =
    v0::Message::try_compile(payer, instructions, &[], recent_blockhash)
      .map_err(|e| BuilderError::Compile(e.to_string()))?;
  let num_sigs = usize::from(message.header.num_required_signatures);
  Ok(VersionedTransaction {
    message: VersionedMessage::V0(message),
    signatures: vec![Signature::default(); num_sigs],
  })
}

pub struct FeeEstimator<L> {
  ledger: Arc<L>,
  oracle: PriorityFeeOracle,
}

impl<L: LedgerProvider> FeeEstimator<L> {
  #[must_use]
  pub fn new(ledger: Arc<L>, oracle: PriorityFeeOracle) -> Self {
    Self { ledger, oracle }
  }

  /// Simulates the candidate instructions and prices their compute units.
  ///
  /// # Errors
  /// * [`BuilderError::SimulationFailed`] when the probe reports an
  ///   execution error; callers may treat this as a fallback signal
  /// * [`BuilderError::FeeOracleUnavailable`] when pricing fails
  pub async fn estimate(
    &self,
    instructions: &[Instruction],
    payer: &Pubkey,
    recent_blockhash: Hash,
    priority_level: PriorityLevel,
    margin: ComputeMargin,
  ) -> Result<FeeEstimate> {
    let probe = probe_transaction(payer, instructions, recent_blockhash)?;

    let outcome = self.ledger.simulate_transaction(&probe).await?;
    if let Some(err) = outcome.err {
      let detail = match outcome.logs {
        Some(logs) if !logs.is_empty() => {
          format!("{err}; logs: {}", logs.join(" | "))
        }
        _ => err,
      };
      return Err(BuilderError::SimulationFailed(detail));
    }
    let consumed = outcome.units_consumed.unwrap_or(0);

    let price = self.oracle.estimate(&probe, priority_level).await?;

    let limit = margin.apply(consumed);
    let compute_unit_limit = u32::try_from(limit).map_err(|_| {
      BuilderError::InvalidAmount(format!(
        "compute unit limit {limit} exceeds u32"
      ))
    })?;
    Ok(FeeEstimate {
      compute_unit_limit,
      compute_unit_price_micro_lamports: price,
    })
  }
}
