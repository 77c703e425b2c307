//! End-to-end assembler tests over the in-memory ledger and mocked HTTP
//! collaborators.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anchor_client::solana_sdk::pubkey::Pubkey;
use anchor_client::solana_sdk::signature::Signature;
use anchor_client::solana_sdk::transaction::VersionedTransaction;
use anchor_lang::AnchorSerialize;
use anyhow::Result;
use common::{
  anchor_account_bytes, sample_stake_pool, sample_unstake_pool,
  sample_validator_list, MockLedger,
};
use mockito::Matcher;
use vault_clients::{
  PriorityFeeOracle, PriorityLevel, StakeMode, StakeRequest, StakeResponse,
  SwapAggregator, TransactionAssembler, UnstakeRequest, UnstakeSource,
};
use vault_core::BuilderError;
use vault_programs::tokens::{
  STAKE_POOL_ADDRESS, UNSTAKE_POOL_ADDRESS, VSOL_MINT,
};
use vault_programs::{directed_stake, dst, liquid_unstaker, pda, stake_pool};

const ORACLE_BODY: &str =
  r#"{"jsonrpc":"2.0","result":{"priorityFeeEstimate":1000.0},"id":"1"}"#;

fn token_account_bytes() -> Vec<u8> {
  vec![0u8; 165]
}

/// Ledger primed for a stake request: funded payer, existing ATAs, and a
/// decodable 1:1 stake pool.
fn stake_ledger(payer: Pubkey) -> MockLedger {
  let mut ledger = MockLedger::default();
  let pool = sample_stake_pool();
  ledger.insert_account(STAKE_POOL_ADDRESS, pool.try_to_vec().unwrap());
  ledger.insert_account(pda::ata(payer, VSOL_MINT), token_account_bytes());
  ledger.balances.insert(payer, 10_000_000_000);
  ledger.simulation.units_consumed = Some(21_500);
  ledger
}

fn stake_request(payer: Pubkey) -> StakeRequest {
  StakeRequest {
    address: payer.to_string(),
    mint: VSOL_MINT.to_string(),
    amount: "5000000000".to_string(),
    balance: "10000000000".to_string(),
    target: None,
    mode: StakeMode::Transaction,
  }
}

fn decode_transaction(encoded: &str) -> VersionedTransaction {
  let bytes = anchor_client::solana_sdk::bs58::decode(encoded)
    .into_vec()
    .unwrap();
  bincode::deserialize(&bytes).unwrap()
}

fn assembler_with(
  ledger: MockLedger,
  oracle_url: String,
  aggregator_url: String,
) -> (Arc<MockLedger>, TransactionAssembler<MockLedger>) {
  let ledger = Arc::new(ledger);
  let assembler = TransactionAssembler::new(
    ledger.clone(),
    PriorityFeeOracle::new(oracle_url),
    SwapAggregator::new(aggregator_url, None),
    PriorityLevel::Medium,
  );
  (ledger, assembler)
}

#[tokio::test]
async fn stake_builds_budget_prefixed_transaction() {
  let mut oracle = mockito::Server::new_async().await;
  let oracle_mock = oracle
    .mock("POST", "/")
    .with_header("content-type", "application/json")
    .with_body(ORACLE_BODY)
    .create_async()
    .await;

  let payer = Pubkey::new_unique();
  let (_, assembler) = assembler_with(
    stake_ledger(payer),
    oracle.url(),
    "http://unused.invalid".to_string(),
  );

  let response = assembler
    .assemble_stake(&stake_request(payer))
    .await
    .unwrap();
  let StakeResponse::Transaction { transaction } = response else {
    panic!("expected a transaction response");
  };
  let tx = decode_transaction(&transaction);

  // Both ATAs already exist, so the body is transfer + deposit + mint
  // behind the two-instruction compute budget prefix.
  let instructions = tx.message.instructions();
  assert_eq!(instructions.len(), 5);
  let keys = tx.message.static_account_keys();
  let program_id = |index: usize| keys[instructions[index].program_id_index as usize];
  assert_eq!(program_id(0), program_id(1));
  assert_eq!(
    program_id(2),
    anchor_lang::system_program::ID,
    "ephemeral funding transfer"
  );
  assert_eq!(program_id(3), stake_pool::ID);
  assert_eq!(program_id(4), dst::ID);

  // Compute budget: 21_500 simulated + 3_000 margin.
  assert_eq!(instructions[0].data[1..5], 24_500u32.to_le_bytes());

  // The ephemeral transfer account co-signed; the payer slot stays open
  // for the wallet.
  assert_eq!(tx.signatures.len(), 2);
  assert_eq!(tx.signatures[0], Signature::default());
  assert_ne!(tx.signatures[1], Signature::default());

  oracle_mock.assert_async().await;
}

#[tokio::test]
async fn stake_round_trips_instruction_sequence() -> Result<()> {
  let mut oracle = mockito::Server::new_async().await;
  oracle
    .mock("POST", "/")
    .with_body(ORACLE_BODY)
    .create_async()
    .await;

  let payer = Pubkey::new_unique();
  let (_, assembler) = assembler_with(
    stake_ledger(payer),
    oracle.url(),
    "http://unused.invalid".to_string(),
  );

  let first = assembler.assemble_stake(&stake_request(payer)).await?;
  let StakeResponse::Transaction { transaction } = first else {
    panic!("expected a transaction response");
  };
  let tx = decode_transaction(&transaction);

  // Ignoring the compute budget prefix, the decompiled sequence matches
  // the plan: same programs, same data, in order.
  let instructions = &tx.message.instructions()[2..];
  assert_eq!(instructions[1].data[0], 14); // stake pool DepositSol index
  assert_eq!(instructions[1].data[1..9], 5_000_000_000u64.to_le_bytes());
  assert_eq!(instructions[2].data[8..16], 5_000_000_000u64.to_le_bytes());
  Ok(())
}

#[tokio::test]
async fn stake_unsigned_message_mode_returns_ephemeral_key() {
  let mut oracle = mockito::Server::new_async().await;
  oracle
    .mock("POST", "/")
    .with_body(ORACLE_BODY)
    .create_async()
    .await;

  let payer = Pubkey::new_unique();
  let (_, assembler) = assembler_with(
    stake_ledger(payer),
    oracle.url(),
    "http://unused.invalid".to_string(),
  );

  let mut request = stake_request(payer);
  request.mode = StakeMode::UnsignedMessage;
  let response = assembler.assemble_stake(&request).await.unwrap();
  let StakeResponse::UnsignedMessage {
    user_sol_transfer,
    message,
  } = response
  else {
    panic!("expected an unsigned message response");
  };
  assert!(!user_sol_transfer.is_empty());
  assert!(!message.is_empty());
}

#[tokio::test]
async fn stake_with_target_requires_the_derivative_mint() {
  let payer = Pubkey::new_unique();
  let (ledger, assembler) = assembler_with(
    stake_ledger(payer),
    "http://unused.invalid".to_string(),
    "http://unused.invalid".to_string(),
  );

  let mut request = stake_request(payer);
  request.mint = Pubkey::new_unique().to_string();
  request.target = Some(Pubkey::new_unique().to_string());
  let err = assembler.assemble_stake(&request).await.unwrap_err();
  assert!(matches!(err, BuilderError::UnsupportedMint { .. }));
  // Rejected before any network call.
  assert_eq!(ledger.simulate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stake_with_target_prepends_direction() {
  let mut oracle = mockito::Server::new_async().await;
  oracle
    .mock("POST", "/")
    .with_body(ORACLE_BODY)
    .create_async()
    .await;

  let payer = Pubkey::new_unique();
  let (_, assembler) = assembler_with(
    stake_ledger(payer),
    oracle.url(),
    "http://unused.invalid".to_string(),
  );

  let mut request = stake_request(payer);
  request.target = Some(Pubkey::new_unique().to_string());
  let response = assembler.assemble_stake(&request).await.unwrap();
  let StakeResponse::Transaction { transaction } = response else {
    panic!("expected a transaction response");
  };
  let tx = decode_transaction(&transaction);
  let instructions = tx.message.instructions();
  assert_eq!(instructions.len(), 6);
  let keys = tx.message.static_account_keys();
  assert_eq!(
    keys[instructions[2].program_id_index as usize],
    directed_stake::ID
  );
}

#[tokio::test]
async fn stake_rejects_deposit_beyond_payer_balance() {
  let payer = Pubkey::new_unique();
  let mut ledger = stake_ledger(payer);
  ledger.balances.insert(payer, 1_000_000);

  let (_, assembler) = assembler_with(
    ledger,
    "http://unused.invalid".to_string(),
    "http://unused.invalid".to_string(),
  );
  let err = assembler
    .assemble_stake(&stake_request(payer))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    BuilderError::InsufficientBalance {
      required: 5_000_000_000,
      available: 1_000_000
    }
  ));
}

/// Ledger primed for a liquid unstake: validator list with one active
/// validator, decodable unstaker pool, funded vSOL balance.
fn unstake_ledger(payer: Pubkey) -> MockLedger {
  let mut ledger = MockLedger::default();
  let pool = sample_stake_pool();
  let vote = Pubkey::new_unique();
  let list = sample_validator_list(&[(vote, 50_000_000_000)]);
  ledger.insert_account(STAKE_POOL_ADDRESS, pool.try_to_vec().unwrap());
  ledger.insert_account(pool.validator_list, list.try_to_vec().unwrap());
  ledger.insert_account(
    UNSTAKE_POOL_ADDRESS,
    anchor_account_bytes("Pool", &sample_unstake_pool()),
  );
  ledger
    .token_balances
    .insert(pda::ata(payer, VSOL_MINT), 2_000_000);
  ledger.simulation.units_consumed = Some(120_000);
  ledger
}

fn unstake_request(payer: Pubkey) -> UnstakeRequest {
  UnstakeRequest {
    address: payer.to_string(),
    amount: "1000000".to_string(),
    slippage_bps: None,
    force_aggregator: false,
  }
}

#[tokio::test]
async fn unstake_prefers_the_liquid_pool() {
  let mut oracle = mockito::Server::new_async().await;
  oracle
    .mock("POST", "/")
    .with_body(ORACLE_BODY)
    .create_async()
    .await;

  let payer = Pubkey::new_unique();
  let (_, assembler) = assembler_with(
    unstake_ledger(payer),
    oracle.url(),
    "http://unused.invalid".to_string(),
  );

  let response = assembler
    .assemble_unstake(&unstake_request(payer))
    .await
    .unwrap();
  assert_eq!(response.source, UnstakeSource::LiquidPool);

  let tx = decode_transaction(&response.transaction);
  let instructions = tx.message.instructions();
  // budget prefix + one stake account creation + the redemption
  assert_eq!(instructions.len(), 4);
  let keys = tx.message.static_account_keys();
  assert_eq!(
    keys[instructions[3].program_id_index as usize],
    liquid_unstaker::ID
  );
  // One new stake account co-signs next to the payer slot.
  assert_eq!(tx.signatures.len(), 2);
  assert_ne!(tx.signatures[1], Signature::default());
  // 120_000 simulated + 50_000 margin, under the cap.
  assert_eq!(instructions[0].data[1..5], 170_000u32.to_le_bytes());
}

#[tokio::test]
async fn unstake_falls_back_to_aggregator_when_simulation_fails() {
  let mut aggregator = mockito::Server::new_async().await;
  let quote_mock = aggregator
    .mock("GET", "/swap/v1/quote")
    .match_query(Matcher::Any)
    .with_header("content-type", "application/json")
    .with_body(r#"{"outAmount":"980000","routePlan":[]}"#)
    .create_async()
    .await;
  let swap_mock = aggregator
    .mock("POST", "/swap/v1/swap")
    .with_header("content-type", "application/json")
    .with_body(r#"{"swapTransaction":"b64-opaque-payload"}"#)
    .create_async()
    .await;

  let payer = Pubkey::new_unique();
  let mut ledger = unstake_ledger(payer);
  ledger.simulation.err = Some("custom program error: 0x1".to_string());

  let (_, assembler) = assembler_with(
    ledger,
    "http://unused.invalid".to_string(),
    aggregator.url(),
  );

  let response = assembler
    .assemble_unstake(&unstake_request(payer))
    .await
    .unwrap();
  // The aggregator's payload is returned opaque, not locally re-composed.
  assert_eq!(response.source, UnstakeSource::Aggregator);
  assert_eq!(response.transaction, "b64-opaque-payload");

  quote_mock.assert_async().await;
  swap_mock.assert_async().await;
}

#[tokio::test]
async fn forced_aggregator_skips_the_liquid_path() {
  let mut aggregator = mockito::Server::new_async().await;
  aggregator
    .mock("GET", "/swap/v1/quote")
    .match_query(Matcher::Any)
    .with_body(r#"{"outAmount":"980000"}"#)
    .create_async()
    .await;
  aggregator
    .mock("POST", "/swap/v1/swap")
    .with_body(r#"{"swapTransaction":"forced"}"#)
    .create_async()
    .await;

  let payer = Pubkey::new_unique();
  let (ledger, assembler) = assembler_with(
    unstake_ledger(payer),
    "http://unused.invalid".to_string(),
    aggregator.url(),
  );

  let mut request = unstake_request(payer);
  request.force_aggregator = true;
  let response = assembler.assemble_unstake(&request).await.unwrap();
  assert_eq!(response.source, UnstakeSource::Aggregator);
  assert_eq!(ledger.simulate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unstake_rejects_insufficient_token_balance() {
  let payer = Pubkey::new_unique();
  let mut ledger = unstake_ledger(payer);
  ledger
    .token_balances
    .insert(pda::ata(payer, VSOL_MINT), 500);

  let (_, assembler) = assembler_with(
    ledger,
    "http://unused.invalid".to_string(),
    "http://unused.invalid".to_string(),
  );
  let err = assembler
    .assemble_unstake(&unstake_request(payer))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    BuilderError::InsufficientBalance {
      required: 1_000_000,
      available: 500
    }
  ));
}

#[tokio::test]
async fn missing_token_account_reads_as_zero_balance() {
  let payer = Pubkey::new_unique();
  let mut ledger = unstake_ledger(payer);
  ledger.token_balances.clear();

  let (_, assembler) = assembler_with(
    ledger,
    "http://unused.invalid".to_string(),
    "http://unused.invalid".to_string(),
  );
  let err = assembler
    .assemble_unstake(&unstake_request(payer))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    BuilderError::InsufficientBalance { available: 0, .. }
  ));
}

#[tokio::test]
async fn aggregator_without_transaction_payload_errors() {
  let mut aggregator = mockito::Server::new_async().await;
  aggregator
    .mock("GET", "/swap/v1/quote")
    .match_query(Matcher::Any)
    .with_body(r#"{"outAmount":"980000"}"#)
    .create_async()
    .await;
  aggregator
    .mock("POST", "/swap/v1/swap")
    .with_body(r#"{"error":"no route"}"#)
    .create_async()
    .await;

  let payer = Pubkey::new_unique();
  let (_, assembler) = assembler_with(
    unstake_ledger(payer),
    "http://unused.invalid".to_string(),
    aggregator.url(),
  );

  let mut request = unstake_request(payer);
  request.force_aggregator = true;
  let err = assembler.assemble_unstake(&request).await.unwrap_err();
  assert!(matches!(err, BuilderError::AggregatorUnavailable(_)));
}

#[tokio::test]
async fn fee_oracle_outage_is_not_a_fallback_trigger() {
  let payer = Pubkey::new_unique();
  // No oracle server at all: estimation fails after a successful
  // simulation, which must surface rather than silently falling back.
  let (_, assembler) = assembler_with(
    unstake_ledger(payer),
    "http://127.0.0.1:1".to_string(),
    "http://unused.invalid".to_string(),
  );
  let err = assembler
    .assemble_unstake(&unstake_request(payer))
    .await
    .unwrap_err();
  assert!(matches!(err, BuilderError::FeeOracleUnavailable(_)));
}
