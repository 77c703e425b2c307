//! DST registry and token metadata lookups.
//!
//! Backs the widget's token listing: scans the DST program for registry
//! records, batch-reads the matching director accounts, and joins in the
//! Metaplex metadata plus its off-chain image URL. Responses are served
//! through a 30-minute read-through cache keyed by mint.

use std::sync::Arc;

use anchor_client::solana_sdk::pubkey::Pubkey;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use vault_core::ttl_cache::METADATA_TTL;
use vault_core::{BuilderError, Result, TtlCache};
use vault_programs::state::{account_discriminator, Director, DstInfo};
use vault_programs::{dst, pda};

use crate::api::{parse_pubkey, Balances};
use crate::rpc::LedgerProvider;

/// One DST registry record with its director resolved.
#[derive(Clone, Debug)]
pub struct DstRecord {
  pub address: Pubkey,
  pub data: DstInfo,
  pub director_address: Pubkey,
  pub director: Option<Director>,
}

/// On-chain Metaplex metadata joined with the off-chain image URL.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
  pub name: String,
  pub symbol: String,
  pub uri: String,
  pub image_url: Option<String>,
}

#[derive(Deserialize)]
struct UriMetadata {
  image: Option<String>,
}

/// Cached response for a DST info lookup.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DstInfoResponse {
  pub address: String,
  pub token_mint: String,
  pub authority: String,
  pub director_target: Option<String>,
  pub metadata: TokenMetadata,
}

/// Scans the DST program for registry records and batch-reads their
/// directors. Accounts that are not registry records (wrong discriminator)
/// are skipped; corrupt registry records fail closed.
pub async fn fetch_all_dsts<L: LedgerProvider>(
  ledger: &L,
) -> Result<Vec<DstRecord>> {
  let discriminator = account_discriminator("DstInfo");
  let accounts = ledger.get_program_accounts(&dst::ID).await?;
  let mut records = accounts
    .iter()
    .filter(|(_, account)| {
      account.data.len() >= 8 && account.data[..8] == discriminator
    })
    .map(|(address, account)| {
      let data = DstInfo::decode(&account.data)?;
      let director_address = pda::director(*address);
      Ok(DstRecord {
        address: *address,
        data,
        director_address,
        director: None,
      })
    })
    .collect::<Result<Vec<_>>>()?;

  let director_addresses =
    records.iter().map(|r| r.director_address).collect_vec();
  let directors = ledger.get_multiple_accounts(&director_addresses).await?;
  for (record, account) in records.iter_mut().zip(directors) {
    record.director =
      account.and_then(|acc| Director::decode(&acc.data).ok());
  }
  Ok(records)
}

/// Reads a mint's Metaplex metadata, `None` when the metadata account does
/// not exist. The off-chain image fetch is best effort.
pub async fn read_token_metadata<L: LedgerProvider>(
  ledger: &L,
  http: &reqwest::Client,
  mint: Pubkey,
) -> Result<Option<TokenMetadata>> {
  let Some(account) = ledger.get_account(&pda::metadata(mint)).await? else {
    return Ok(None);
  };
  let metadata =
    mpl_token_metadata::accounts::Metadata::from_bytes(&account.data)
      .map_err(|e| BuilderError::Decode {
        account: "token metadata",
        reason: e.to_string(),
      })?;

  let uri = metadata.uri.trim_matches('\0').to_string();
  let image_url = fetch_image_url(http, &uri).await;

  Ok(Some(TokenMetadata {
    name: metadata.name.trim_matches('\0').to_string(),
    symbol: metadata.symbol.trim_matches('\0').to_string(),
    uri,
    image_url,
  }))
}

async fn fetch_image_url(http: &reqwest::Client, uri: &str) -> Option<String> {
  if uri.is_empty() {
    return None;
  }
  match http.get(uri).send().await {
    Ok(response) => match response.json::<UriMetadata>().await {
      Ok(body) => body.image,
      Err(err) => {
        tracing::debug!(%err, uri, "metadata uri body unreadable");
        None
      }
    },
    Err(err) => {
      tracing::debug!(%err, uri, "metadata uri unreachable");
      None
    }
  }
}

/// SOL and derivative-token balances for an address, with the
/// missing-token-account read path yielding zero.
pub async fn read_balances<L: LedgerProvider>(
  ledger: &L,
  address: Pubkey,
  mint: Pubkey,
) -> Result<Balances> {
  let ata = pda::ata(address, mint);
  let (sol, lst) = futures::try_join!(
    ledger.get_balance(&address),
    ledger.get_token_balance(&ata),
  )?;
  Ok(Balances {
    sol: sol.to_string(),
    lst: lst.unwrap_or(0).to_string(),
  })
}

/// Read-through DST lookup keyed by mint over an injected TTL cache.
pub struct DstInfoService<L> {
  ledger: Arc<L>,
  http: reqwest::Client,
  cache: Arc<TtlCache<String, DstInfoResponse>>,
}

impl<L: LedgerProvider> DstInfoService<L> {
  #[must_use]
  pub fn new(ledger: Arc<L>) -> Self {
    Self::with_cache(ledger, Arc::new(TtlCache::new(METADATA_TTL)))
  }

  /// Uses a shared cache instance, e.g. one spanning several services.
  #[must_use]
  pub fn with_cache(
    ledger: Arc<L>,
    cache: Arc<TtlCache<String, DstInfoResponse>>,
  ) -> Self {
    Self {
      ledger,
      http: reqwest::Client::new(),
      cache,
    }
  }

  /// Looks up the DST record and metadata for a mint.
  ///
  /// # Errors
  /// * [`BuilderError::AccountNotFound`] when no registry record matches
  /// * [`BuilderError::MetadataNotFound`] when the mint has no metadata
  pub async fn dst_info(&self, mint: &str) -> Result<DstInfoResponse> {
    if let Some(hit) = self.cache.get(&mint.to_string()) {
      tracing::debug!(mint, "dst info served from cache");
      return Ok(hit);
    }

    let mint_key = parse_pubkey("mint", mint)?;
    let records = fetch_all_dsts(self.ledger.as_ref()).await?;
    let record = records
      .into_iter()
      .find(|record| record.data.token_mint == mint_key)
      .ok_or_else(|| BuilderError::AccountNotFound(pda::dst_info(mint_key)))?;

    let metadata =
      read_token_metadata(self.ledger.as_ref(), &self.http, mint_key)
        .await?
        .ok_or(BuilderError::MetadataNotFound(mint_key))?;

    let response = DstInfoResponse {
      address: record.address.to_string(),
      token_mint: record.data.token_mint.to_string(),
      authority: record.data.authority.to_string(),
      director_target: record
        .director
        .map(|director| director.target.to_string()),
      metadata,
    };
    self.cache.insert(mint.to_string(), response.clone());
    Ok(response)
  }
}
