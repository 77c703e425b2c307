//! Transaction assembler: the orchestrator over request modes.
//!
//! Sequences the account deriver, pool state readers, instruction builders,
//! and fee estimator per request, then returns a signer-ready unsigned
//! transaction envelope with provenance metadata. Each request is handled
//! statelessly with a fresh blockhash and fresh ephemeral keys; the
//! liquid-pool-then-aggregator sequence is a single deterministic
//! two-attempt fallback, not a retry policy.

use std::sync::Arc;

use anchor_client::solana_sdk::bs58;
use anchor_client::solana_sdk::hash::Hash;
use anchor_client::solana_sdk::instruction::Instruction;
use anchor_client::solana_sdk::message::{v0, VersionedMessage};
use anchor_client::solana_sdk::pubkey::Pubkey;
use anchor_client::solana_sdk::signature::{Keypair, Signature};
use anchor_client::solana_sdk::signer::Signer;
use anchor_client::solana_sdk::transaction::VersionedTransaction;
use base64::prelude::{Engine, BASE64_STANDARD};
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use vault_core::{BuilderError, Result};
use vault_programs::pda;
use vault_programs::tokens::{VSOL_MINT, WSOL_MINT};

use crate::aggregator::{SwapAggregator, SwapQuoteParams};
use crate::api::{
  StakeMode, StakeRequest, StakeResponse, UnstakeParams, UnstakeRequest,
  UnstakeResponse, UnstakeSource,
};
use crate::config::AssemblerConfig;
use crate::fee_estimator::{ComputeMargin, FeeEstimator};
use crate::pool_state::PoolStateReader;
use crate::priority_fee::{PriorityFeeOracle, PriorityLevel};
use crate::rpc::{LedgerProvider, SolanaLedger};
use crate::stake::{build_direct_instructions, build_stake_plan};
use crate::unstake::{build_liquid_unstake_plan, read_token_balance_or_zero};

pub struct TransactionAssembler<L> {
  ledger: Arc<L>,
  reader: PoolStateReader<L>,
  estimator: FeeEstimator<L>,
  aggregator: SwapAggregator,
  priority_level: PriorityLevel,
}

impl TransactionAssembler<SolanaLedger> {
  /// Wires the assembler against live endpoints.
  #[must_use]
  pub fn from_config(config: &AssemblerConfig) -> Self {
    let client = Arc::new(RpcClient::new_with_commitment(
      config.rpc_url.clone(),
      config.commitment,
    ));
    let ledger = Arc::new(SolanaLedger::new(client, config.commitment));
    Self::new(
      ledger,
      PriorityFeeOracle::new(config.fee_oracle_url.clone()),
      SwapAggregator::new(
        config.aggregator_url.clone(),
        config.aggregator_api_key.clone(),
      ),
      config.priority_level,
    )
  }
}

impl<L: LedgerProvider> TransactionAssembler<L> {
  #[must_use]
  pub fn new(
    ledger: Arc<L>,
    oracle: PriorityFeeOracle,
    aggregator: SwapAggregator,
    priority_level: PriorityLevel,
  ) -> Self {
    Self {
      reader: PoolStateReader::new(ledger.clone()),
      estimator: FeeEstimator::new(ledger.clone(), oracle),
      ledger,
      aggregator,
      priority_level,
    }
  }

  /// Assembles a stake transaction: optional stake-direction prefix,
  /// deposit, derivative mint, and the simulated compute budget.
  ///
  /// # Errors
  /// * [`BuilderError::Validation`] / [`BuilderError::UnsupportedMint`]
  ///   before any network call
  /// * [`BuilderError::InsufficientBalance`] when the payer cannot fund the
  ///   deposit
  /// * Estimation, compile, and encode failures
  pub async fn assemble_stake(
    &self,
    request: &StakeRequest,
  ) -> Result<StakeResponse> {
    let params = request.parse()?;

    let mut instructions = Vec::new();
    if let Some(target) = params.target {
      if params.mint != VSOL_MINT {
        return Err(BuilderError::UnsupportedMint {
          expected: VSOL_MINT,
          actual: params.mint,
        });
      }
      instructions.extend(
        build_direct_instructions(&self.reader, params.address, target)
          .await?,
      );
    }

    let deposit_lamports = params.amount.min(params.balance);
    let ephemeral = Keypair::new();
    let plan = build_stake_plan(
      self.ledger.as_ref(),
      &self.reader,
      params.address,
      params.mint,
      deposit_lamports,
      ephemeral.pubkey(),
    )
    .await?;
    instructions.extend(plan.instructions);

    let recent_blockhash = self.ledger.latest_blockhash().await?;
    let estimate = self
      .estimator
      .estimate(
        &instructions,
        &params.address,
        recent_blockhash,
        self.priority_level,
        ComputeMargin::Stake,
      )
      .await?;

    let message = compile_with_budget(
      &params.address,
      &estimate.budget_instructions(),
      &instructions,
      recent_blockhash,
    )?;
    tracing::info!(
      deposit_lamports,
      mint_amount = plan.mint_amount,
      compute_unit_limit = estimate.compute_unit_limit,
      "assembled stake transaction"
    );

    match params.mode {
      StakeMode::Transaction => {
        let tx = partially_signed_transaction(message, &[&ephemeral]);
        Ok(StakeResponse::Transaction {
          transaction: encode_transaction(&tx)?,
        })
      }
      StakeMode::UnsignedMessage => Ok(StakeResponse::UnsignedMessage {
        user_sol_transfer: ephemeral.to_base58_string(),
        message: BASE64_STANDARD.encode(message.serialize()),
      }),
    }
  }

  /// Assembles an unstake transaction, preferring the liquid pool and
  /// falling back to the swap aggregator when the liquid path fails
  /// simulation (or when the request forces the aggregator).
  ///
  /// # Errors
  /// * [`BuilderError::InsufficientBalance`] when the caller holds fewer
  ///   derivative tokens than requested
  /// * [`BuilderError::AggregatorUnavailable`] when the fallback also fails
  pub async fn assemble_unstake(
    &self,
    request: &UnstakeRequest,
  ) -> Result<UnstakeResponse> {
    let params = request.parse()?;

    let vsol_ata = pda::ata(params.address, VSOL_MINT);
    let available =
      read_token_balance_or_zero(self.ledger.as_ref(), &vsol_ata).await?;
    if available < params.amount {
      return Err(BuilderError::InsufficientBalance {
        required: params.amount,
        available,
      });
    }

    if params.force_aggregator {
      tracing::info!("aggregator path forced by request");
    } else {
      match self.try_liquid_unstake(&params).await {
        Ok(response) => return Ok(response),
        Err(err) if err.triggers_fallback() => {
          tracing::warn!(
            error = %err,
            "liquid unstake failed simulation, falling back to aggregator"
          );
        }
        Err(err) => return Err(err),
      }
    }

    self.aggregator_unstake(&params).await
  }

  async fn try_liquid_unstake(
    &self,
    params: &UnstakeParams,
  ) -> Result<UnstakeResponse> {
    let plan = build_liquid_unstake_plan(
      self.ledger.as_ref(),
      &self.reader,
      params.address,
      params.amount,
      None,
    )
    .await?;

    let recent_blockhash = self.ledger.latest_blockhash().await?;
    let estimate = self
      .estimator
      .estimate(
        &plan.instructions,
        &params.address,
        recent_blockhash,
        self.priority_level,
        ComputeMargin::LiquidUnstake,
      )
      .await?;

    let message = compile_with_budget(
      &params.address,
      &estimate.budget_instructions(),
      &plan.instructions,
      recent_blockhash,
    )?;
    let signers: Vec<&Keypair> = plan.signers.iter().collect();
    let tx = partially_signed_transaction(message, &signers);
    tracing::info!(
      pool_tokens = params.amount,
      sources = plan.sources.len(),
      "assembled liquid unstake transaction"
    );
    Ok(UnstakeResponse {
      transaction: encode_transaction(&tx)?,
      source: UnstakeSource::LiquidPool,
    })
  }

  async fn aggregator_unstake(
    &self,
    params: &UnstakeParams,
  ) -> Result<UnstakeResponse> {
    let quote = self
      .aggregator
      .quote(&SwapQuoteParams {
        input_mint: VSOL_MINT,
        output_mint: WSOL_MINT,
        amount: params.amount,
        slippage_bps: params.slippage_bps,
      })
      .await?;
    let transaction = self
      .aggregator
      .swap_transaction(&params.address, quote)
      .await?;
    tracing::info!(
      pool_tokens = params.amount,
      "assembled unstake via aggregator"
    );
    // The aggregator payload is opaque: it already carries its own compute
    // budget and is not re-estimated locally.
    Ok(UnstakeResponse {
      transaction,
      source: UnstakeSource::Aggregator,
    })
  }
}

fn compile_with_budget(
  payer: &Pubkey,
  budget_prefix: &[Instruction],
  instructions: &[Instruction],
  recent_blockhash: Hash,
) -> Result<VersionedMessage> {
  let final_instructions =
    [budget_prefix, instructions].concat();
  let message =
    v0::Message::try_compile(payer, &final_instructions, &[], recent_blockhash)
      .map_err(|e| BuilderError::Compile(e.to_string()))?;
  Ok(VersionedMessage::V0(message))
}

/// Signs with the ephemeral keypairs, leaving the caller's signature slot
/// as a placeholder for the wallet to fill.
fn partially_signed_transaction(
  message: VersionedMessage,
  signers: &[&Keypair],
) -> VersionedTransaction {
  let serialized = message.serialize();
  let num_sigs = usize::from(message.header().num_required_signatures);
  let signatures = message.static_account_keys()[..num_sigs]
    .iter()
    .map(|key| {
      match signers.iter().find(|keypair| keypair.pubkey() == *key) {
        Some(keypair) => keypair.sign_message(&serialized),
        None => Signature::default(),
      }
    })
    .collect();
  VersionedTransaction {
    message,
    signatures,
  }
}

fn encode_transaction(transaction: &VersionedTransaction) -> Result<String> {
  let serialized = bincode::serialize(transaction)
    .map_err(|e| BuilderError::Encode(e.to_string()))?;
  Ok(bs58::encode(serialized).into_string())
}
