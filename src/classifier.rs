// 🏷️ Classifier - organic payout, one-time migration, or cross-ledger conversion
//
// Fixed priority, per mint:
//   1. Conversion: memo names a pending burn in the opposite asset's pool
//   2. Migration:  memo is a recognized deauthorization hash (oracle)
//   3. Organic:    everything else, normalized to canonical precision
//
// Burn amounts are compared at native precision, so classification runs on
// NativeMint and only organic mints get normalized.

use crate::amount::normalize_mint;
use crate::burn_index::BurnMatchIndex;
use crate::error::Result;
use crate::events::{Asset, ConversionRecord, MigrationRecord, NativeMint, NormalizedEvent};
use crate::oracle::DeauthOracle;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

// ============================================================================
// CLASSIFICATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Conversion(ConversionRecord),
    Migration(MigrationRecord),
    Organic(NormalizedEvent),
}

/// ClassifiedMints - one asset's mints split by category, input order kept
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifiedMints {
    pub organic: Vec<NormalizedEvent>,
    pub migrations: Vec<MigrationRecord>,
    pub conversions: Vec<ConversionRecord>,
}

impl ClassifiedMints {
    fn push(&mut self, classification: Classification) {
        match classification {
            Classification::Conversion(c) => self.conversions.push(c),
            Classification::Migration(m) => self.migrations.push(m),
            Classification::Organic(e) => self.organic.push(e),
        }
    }

    pub fn total(&self) -> usize {
        self.organic.len() + self.migrations.len() + self.conversions.len()
    }
}

/// Outcome of the burn-matching phase, before any oracle call
enum Pending {
    Done(Classification),
    AskOracle(NativeMint),
}

// ============================================================================
// CLASSIFIER
// ============================================================================

pub struct Classifier<'a, O: ?Sized> {
    oracle: &'a O,
    /// Maximum number of oracle lookups in flight
    concurrency: usize,
}

impl<'a, O: DeauthOracle + ?Sized> Classifier<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Classifier {
            oracle,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(oracle: &'a O, concurrency: usize) -> Self {
        Classifier {
            oracle,
            concurrency: concurrency.max(1),
        }
    }

    /// Classify every mint of `asset`.
    ///
    /// `conversion_pool` is the opposite asset's burn index, if conversions
    /// into `asset` exist. It is only ever touched from this sequential
    /// matching phase, so each burn matches at most one mint. Oracle lookups
    /// happen afterwards, once per distinct memo, and any failure aborts.
    pub async fn classify(
        &self,
        asset: Asset,
        mints: Vec<NativeMint>,
        mut conversion_pool: Option<&mut BurnMatchIndex>,
    ) -> Result<ClassifiedMints> {
        info!("🔎 Classifying {} {} mints", mints.len(), asset);

        // Phase 1: burn matching (single mutator)
        let mut pending = Vec::with_capacity(mints.len());
        for mint in mints {
            let matched = match conversion_pool.as_deref_mut() {
                Some(pool) if !mint.memo.is_empty() => pool.try_consume(&mint.memo),
                _ => None,
            };

            let step = match matched {
                Some(burn) => {
                    debug!("{} mint {} converts burn {}", asset, mint.id, burn.id);
                    Pending::Done(Classification::Conversion(ConversionRecord {
                        account: burn.counterparty,
                        amount: burn.amount,
                        burn_timestamp: burn.timestamp,
                        mint_timestamp: mint.timestamp,
                        burn_token: burn.id,
                    }))
                }
                // No memo: cannot be a deauth hash
                None if mint.memo.is_empty() => Pending::Done(Classification::Organic(
                    normalize_mint(mint, asset.ledger())?,
                )),
                None => Pending::AskOracle(mint),
            };
            pending.push(step);
        }

        // Phase 2: one oracle lookup per distinct memo
        let verdicts = self.lookup_memos(&pending).await?;

        // Phase 3: assemble in input order
        let mut classified = ClassifiedMints::default();
        for step in pending {
            let classification = match step {
                Pending::Done(c) => c,
                Pending::AskOracle(mint) => {
                    if verdicts.get(&mint.memo).copied().unwrap_or(false) {
                        Classification::Migration(MigrationRecord {
                            source_asset: asset,
                            timestamp: mint.timestamp,
                            amount: mint.amount,
                            recipient: mint.recipient,
                            correlation_token: mint.memo,
                        })
                    } else {
                        Classification::Organic(normalize_mint(mint, asset.ledger())?)
                    }
                }
            };
            classified.push(classification);
        }

        info!(
            "✓ {}: {} organic, {} migrations, {} conversions",
            asset,
            classified.organic.len(),
            classified.migrations.len(),
            classified.conversions.len()
        );

        Ok(classified)
    }

    async fn lookup_memos(&self, pending: &[Pending]) -> Result<HashMap<String, bool>> {
        let mut seen = HashSet::new();
        let memos: Vec<&str> = pending
            .iter()
            .filter_map(|p| match p {
                Pending::AskOracle(mint) => Some(mint.memo.as_str()),
                Pending::Done(_) => None,
            })
            .filter(|memo| seen.insert(*memo))
            .collect();

        if memos.is_empty() {
            return Ok(HashMap::new());
        }
        debug!("querying deauth oracle for {} distinct memos", memos.len());

        let oracle = self.oracle;
        stream::iter(memos)
            .map(|memo| async move {
                oracle
                    .is_deauth_hash(memo)
                    .await
                    .map(|known| (memo.to_string(), known))
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }
}

// ============================================================================
// TESTS
// ============================================================================
