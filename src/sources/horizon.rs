// ✨ Horizon Source - cursor-paginated payment history of an issuer account
//
// Payments INTO the issuer are burns. Payments OUT of the issuer are mints,
// provided their transaction carries a "hash" memo (every minting transaction
// does; anything else is noise). The memo payload is base64 on the wire and
// rendered as lowercase hex.

use crate::amount::parse_native_amount;
use crate::error::{ReconcileError, Result};
use crate::events::{Asset, BurnEvent, NativeMint};
use base64::engine::general_purpose::STANDARD as BASE64;
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_PAGE_LIMIT: usize = 200;

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct OperationsPage {
    #[serde(rename = "_embedded")]
    pub embedded: EmbeddedRecords,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedRecords {
    pub records: Vec<OperationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationRecord {
    pub paging_token: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub transaction_hash: String,
    /// Ledger close time
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
    /// Present when requested with join=transactions
    #[serde(default)]
    pub transaction: Option<JoinedTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinedTransaction {
    pub memo_type: String,
    #[serde(default)]
    pub memo: Option<String>,
}

// ============================================================================
// ACCOUNT HISTORY
// ============================================================================

/// Mints and burns of one issued asset, in ledger order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountHistory {
    pub mints: Vec<NativeMint>,
    pub burns: Vec<BurnEvent>,
}

impl AccountHistory {
    /// Sort the records of one page into mints and burns
    pub fn absorb(&mut self, asset: Asset, account: &str, records: &[OperationRecord]) -> Result<()> {
        for record in records {
            if record.kind != "payment" || record.asset_issuer.as_deref() != Some(account) {
                continue;
            }
            let context = format!(
                "{} operation {} tx {}",
                account, record.paging_token, record.transaction_hash
            );
            let field = |value: &Option<String>, name: &str| {
                value.clone().ok_or_else(|| {
                    ReconcileError::decode(asset.ledger(), context.clone(), format!("payment without {}", name))
                })
            };

            let to = field(&record.to, "to")?;
            let from = field(&record.from, "from")?;
            let amount = parse_native_amount(&field(&record.amount, "amount")?)
                .map_err(|e| e.located(asset.ledger(), context.clone()))?;

            if to == account {
                self.burns.push(BurnEvent {
                    id: record.transaction_hash.clone(),
                    timestamp: record.created_at,
                    counterparty: from,
                    amount,
                });
                continue;
            }

            let mut memo = String::new();
            if let Some(tx) = &record.transaction {
                if tx.memo_type != "hash" {
                    continue;
                }
                let raw = BASE64
                    .decode(tx.memo.as_deref().unwrap_or_default())
                    .map_err(|e| ReconcileError::decode(asset.ledger(), context.clone(), e))?;
                memo = hex::encode(raw);
            }

            self.mints.push(NativeMint {
                id: record.transaction_hash.clone(),
                timestamp: record.created_at,
                recipient: to,
                amount,
                memo,
            });
        }
        Ok(())
    }
}

// ============================================================================
// PAGING
// ============================================================================

/// OperationsSource - one page of an account's operations, oldest first,
/// starting after `cursor` ("" = from the beginning)
#[async_trait]
pub trait OperationsSource: Send + Sync {
    async fn operations_page(
        &self,
        asset: Asset,
        account: &str,
        cursor: &str,
        limit: usize,
    ) -> Result<Vec<OperationRecord>>;
}

/// Walk the full operation history of `account` (the issuer of `asset`).
/// The next cursor is the last record's paging token; an empty page or one
/// shorter than `page_limit` ends the walk.
pub async fn fetch_account_history<S: OperationsSource + ?Sized>(
    source: &S,
    asset: Asset,
    account: &str,
    page_limit: usize,
) -> Result<AccountHistory> {
    info!("✨ Fetching {} payments for issuer {}", asset, account);

    let page_limit = page_limit.max(1);
    let mut history = AccountHistory::default();
    let mut cursor = String::new();
    let mut pages = 0usize;

    loop {
        let records = source.operations_page(asset, account, &cursor, page_limit).await?;
        let Some(last) = records.last() else {
            break;
        };
        cursor = last.paging_token.clone();
        pages += 1;

        history.absorb(asset, account, &records)?;
        debug!("{} page {}: {} records, cursor {}", asset, pages, records.len(), cursor);

        if records.len() < page_limit {
            break;
        }
    }

    info!(
        "✓ {}: {} mints, {} burns over {} pages",
        asset,
        history.mints.len(),
        history.burns.len(),
        pages
    );
    Ok(history)
}

// ============================================================================
// HORIZON CLIENT
// ============================================================================

pub struct HorizonClient {
    client: Client,
    base_url: String,
    page_limit: usize,
}

impl HorizonClient {
    pub fn new(base_url: impl Into<String>, page_limit: usize) -> Self {
        HorizonClient {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_limit: page_limit.max(1),
        }
    }

    pub async fn account_history(&self, asset: Asset, account: &str) -> Result<AccountHistory> {
        fetch_account_history(self, asset, account, self.page_limit).await
    }
}

#[async_trait]
impl OperationsSource for HorizonClient {
    async fn operations_page(
        &self,
        asset: Asset,
        account: &str,
        cursor: &str,
        limit: usize,
    ) -> Result<Vec<OperationRecord>> {
        let url = format!("{}/accounts/{}/operations", self.base_url, account);
        let context = format!("account {} cursor {:?}", account, cursor);
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("cursor", cursor),
                ("limit", limit.as_str()),
                ("join", "transactions"),
                ("order", "asc"),
            ])
            .send()
            .await
            .map_err(|e| ReconcileError::transport(asset.ledger(), context.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReconcileError::transport(
                asset.ledger(),
                context,
                format!("unexpected status {}", status),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ReconcileError::transport(asset.ledger(), context.clone(), e))?;
        let page: OperationsPage = serde_json::from_slice(&body)
            .map_err(|e| ReconcileError::decode(asset.ledger(), context, e))?;
        Ok(page.embedded.records)
    }
}

// ============================================================================
// TESTS
// ============================================================================
