// ⛓️ Rivine Explorer Source - block-by-height fetch from the tfchain explorer
//
// GET {explorer}/explorer                 → chain height
// GET {explorer}/explorer/blocks/{height} → block with its transactions

use super::decoder::TxVersionRegistry;
use crate::error::{ReconcileError, Result};
use crate::events::{NativeMint, SourceLedger};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const LEDGER: SourceLedger = SourceLedger::Rivine;

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerState {
    pub height: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerBlockResponse {
    pub block: ExplorerBlock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerBlock {
    #[serde(default)]
    pub height: u64,
    pub rawblock: RawBlock,
    #[serde(default)]
    pub transactions: Option<Vec<ExplorerTransaction>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    /// Unix seconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerTransaction {
    pub id: String,
    pub rawtransaction: RawTransaction,
    /// One unlock hash per coin output, same order
    #[serde(default)]
    pub coinoutputunlockhashes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    pub version: u8,
    pub data: TransactionData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionData {
    #[serde(default)]
    pub coinoutputs: Option<Vec<CoinOutput>>,
    /// Base64 encoded
    #[serde(default)]
    pub arbitrarydata: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinOutput {
    /// Decimal string at 9-digit precision
    pub value: String,
}

// ============================================================================
// BLOCK SOURCE
// ============================================================================

/// Anything that can hand out explorer blocks by height
#[async_trait]
pub trait BlockSource: Send + Sync {
    async fn block(&self, height: u64) -> Result<ExplorerBlock>;
}

#[derive(Clone)]
pub struct ExplorerClient {
    client: Client,
    base_url: String,
}

impl ExplorerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        ExplorerClient {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, context: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ReconcileError::transport(LEDGER, context, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReconcileError::transport(
                LEDGER,
                context,
                format!("unexpected status {}", status),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ReconcileError::transport(LEDGER, context, e))?;
        serde_json::from_slice(&body).map_err(|e| ReconcileError::decode(LEDGER, context, e))
    }

    /// Current chain height
    pub async fn chain_height(&self) -> Result<u64> {
        let state: ExplorerState = self.get_json("/explorer", "chain state").await?;
        Ok(state.height)
    }
}

#[async_trait]
impl BlockSource for ExplorerClient {
    async fn block(&self, height: u64) -> Result<ExplorerBlock> {
        let path = format!("/explorer/blocks/{}", height);
        let context = format!("block {}", height);
        let response: ExplorerBlockResponse = self.get_json(&path, &context).await?;
        Ok(response.block)
    }
}

// ============================================================================
// BLOCK EXTRACTION
// ============================================================================

/// Everything ingestion needs from one block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockEvents {
    pub mints: Vec<NativeMint>,
    /// Unlock hash of every coin output, mint or not
    pub addresses: Vec<String>,
}

/// Pull mints and address observations out of a block.
/// One mint is produced per coin output of a mint transaction.
pub fn extract_block(
    height: u64,
    block: &ExplorerBlock,
    registry: &TxVersionRegistry,
) -> Result<BlockEvents> {
    let mut events = BlockEvents::default();
    let timestamp = DateTime::<Utc>::from_timestamp(block.rawblock.timestamp, 0).ok_or_else(|| {
        ReconcileError::decode(
            LEDGER,
            format!("block {}", height),
            format!("invalid timestamp {}", block.rawblock.timestamp),
        )
    })?;

    for tx in block.transactions.iter().flatten() {
        let context = format!("block {}, tx {}", height, tx.id);
        let version = tx.rawtransaction.version;
        let kind = registry.kind(version).ok_or_else(|| {
            ReconcileError::decode(LEDGER, context.clone(), format!("unknown transaction version {}", version))
        })?;

        let outputs = tx.rawtransaction.data.coinoutputs.as_deref().unwrap_or_default();
        let unlock_hashes = tx.coinoutputunlockhashes.as_deref().unwrap_or_default();
        if outputs.len() != unlock_hashes.len() {
            return Err(ReconcileError::decode(
                LEDGER,
                context,
                format!(
                    "{} coin outputs but {} unlock hashes",
                    outputs.len(),
                    unlock_hashes.len()
                ),
            ));
        }

        events.addresses.extend(unlock_hashes.iter().cloned());

        if !kind.is_mint() {
            continue;
        }

        let memo = match tx.rawtransaction.data.arbitrarydata.as_deref() {
            Some(data) if !data.is_empty() => {
                let raw = BASE64
                    .decode(data)
                    .map_err(|e| ReconcileError::decode(LEDGER, context.clone(), e))?;
                hex::encode(raw)
            }
            _ => String::new(),
        };

        for (output, recipient) in outputs.iter().zip(unlock_hashes) {
            let amount: u64 = output.value.parse().map_err(|e| {
                ReconcileError::decode(
                    LEDGER,
                    context.clone(),
                    format!("coin output value {:?}: {}", output.value, e),
                )
            })?;
            events.mints.push(NativeMint {
                id: tx.id.clone(),
                timestamp,
                recipient: recipient.clone(),
                amount,
                memo: memo.clone(),
            });
        }
    }

    Ok(events)
}

// ============================================================================
// TESTS
// ============================================================================
