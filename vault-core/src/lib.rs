//! Core data types, exchange-rate math, and withdrawal planning for the
//! Vault staking transaction builder.
//!
//! Everything in this crate is pure: no network access, no key material, no
//! async. The planner and conversion functions are deterministic over their
//! inputs so the selection logic stays testable without touching RPC or
//! secure randomness.

pub mod conversion;
pub mod error;
pub mod planner;
pub mod ttl_cache;

pub use conversion::{Fee, PoolSummary};
pub use error::{BuilderError, Result};
pub use planner::{
  plan_withdrawal, ReserveSource, SourceKind, StakeStatus,
  ValidatorStakeEntry, WithdrawSource, MAX_WITHDRAW_SOURCES,
};
pub use ttl_cache::TtlCache;
