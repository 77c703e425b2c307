//! Async clients and the transaction assembler for the Vault staking
//! protocol.
//!
//! The assembler turns a stake or unstake request into a signer-ready
//! unsigned transaction: it derives accounts, reads live pool state, builds
//! the candidate instruction list, probe-simulates it to learn the real
//! compute cost and a market-rate priority fee, and rebuilds the
//! transaction with that budget folded in. Unstaking prefers the on-chain
//! liquid unstaker and falls back to the swap aggregator when the liquid
//! path fails simulation.
//!
//! All network access goes through injected capabilities: the
//! [`rpc::LedgerProvider`] trait for ledger reads, and plain HTTP clients
//! with configurable endpoints for the fee oracle and aggregator. Every
//! flow is testable without mainnet.

pub mod aggregator;
pub mod api;
pub mod assembler;
pub mod config;
pub mod fee_estimator;
pub mod metadata;
pub mod pool_state;
pub mod priority_fee;
pub mod rpc;
pub mod stake;
pub mod unstake;

pub use aggregator::{SwapAggregator, SwapQuoteParams};
pub use api::{
  Balances, BalancesRequest, StakeMode, StakeRequest, StakeResponse,
  UnstakeRequest, UnstakeResponse, UnstakeSource,
};
pub use assembler::TransactionAssembler;
pub use config::AssemblerConfig;
pub use fee_estimator::{ComputeMargin, FeeEstimate, FeeEstimator};
pub use metadata::{DstInfoResponse, DstInfoService};
pub use pool_state::PoolStateReader;
pub use priority_fee::{PriorityFeeOracle, PriorityLevel};
pub use rpc::{LedgerProvider, SimulationOutcome, SolanaLedger};
