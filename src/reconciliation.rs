// ⚖️ Reconciliation Engine - one audited history from two ledgers
//
// Pipeline:
//   TFTA mints ──► classify (oracle)                 ──┐
//   TFT mints  ──► classify (TFTA burns, oracle)     ──┼─► organic ─► sort ─► clusters
//   Rivine mints ─► normalize ─────────────────────────┘
//
// Leftover TFTA and TFT burns are reported as unmatched. Any error aborts the
// whole pass; there is no partial report.

use crate::amount::normalize_mint;
use crate::burn_index::BurnMatchIndex;
use crate::classifier::Classifier;
use crate::clustering::{cluster_payouts, default_cluster_cutoff, PayoutCluster};
use crate::error::Result;
use crate::events::{
    Asset, ConversionRecord, MigrationRecord, NormalizedEvent, SourceLedger, UnmatchedBurn,
};
use crate::oracle::{CachingOracle, DeauthOracle};
use crate::sources::{AccountHistory, RivineHistory};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// INPUT: everything ingested from the ledgers
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub rivine: RivineHistory,
    pub tft: AccountHistory,
    pub tfta: AccountHistory,
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Organic mints of every ledger, canonical precision, timestamp order
    pub all_mints: Vec<NormalizedEvent>,
    pub migrations: Vec<MigrationRecord>,
    pub conversions: Vec<ConversionRecord>,
    pub unmatched_burns: Vec<UnmatchedBurn>,
    pub clusters: Vec<PayoutCluster>,
    /// Every address seen on the UTXO chain
    pub addresses: Vec<String>,
    pub reconciled_at: DateTime<Utc>,
}

impl ReconciliationReport {
    pub fn summary(&self) -> String {
        format!(
            "Reconciliation: {} organic mints in {} payout clusters, {} migrations, {} conversions, {} unmatched burns, {} addresses",
            self.all_mints.len(),
            self.clusters.len(),
            self.migrations.len(),
            self.conversions.len(),
            self.unmatched_burns.len(),
            self.addresses.len()
        )
    }

    /// Total organic issuance at canonical precision
    pub fn organic_total(&self) -> u64 {
        self.all_mints.iter().map(|m| m.amount).sum()
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine {
    /// Maximum gap between consecutive mints of one payout cluster (default: 172h)
    pub cluster_cutoff: Duration,

    /// Oracle lookups in flight at once (default: 1)
    pub oracle_concurrency: usize,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine {
            cluster_cutoff: default_cluster_cutoff(),
            oracle_concurrency: 1,
        }
    }

    pub fn with_settings(cluster_cutoff: Duration, oracle_concurrency: usize) -> Self {
        ReconciliationEngine {
            cluster_cutoff,
            oracle_concurrency: oracle_concurrency.max(1),
        }
    }

    /// Classify, normalize, merge and cluster one snapshot.
    ///
    /// `oracle` is queried at most once per distinct memo across both assets.
    pub async fn reconcile<O: DeauthOracle + ?Sized>(
        &self,
        snapshot: LedgerSnapshot,
        oracle: &O,
    ) -> Result<ReconciliationReport> {
        let LedgerSnapshot { rivine, tft, tfta } = snapshot;
        let oracle = CachingOracle::new(oracle);
        let classifier = Classifier::with_concurrency(&oracle, self.oracle_concurrency);

        let mut tfta_burns: BurnMatchIndex = tfta.burns.into_iter().collect();
        let tft_burns: BurnMatchIndex = tft.burns.into_iter().collect();

        // TFTA mints: migrations only, nothing converts into TFTA
        let tfta_out = classifier.classify(Asset::Tfta, tfta.mints, None).await?;
        // TFT mints: may convert a TFTA burn
        let tft_out = classifier
            .classify(Asset::Tft, tft.mints, Some(&mut tfta_burns))
            .await?;

        let mut all_mints = Vec::with_capacity(
            rivine.mints.len() + tfta_out.organic.len() + tft_out.organic.len(),
        );
        for mint in rivine.mints {
            all_mints.push(normalize_mint(mint, SourceLedger::Rivine)?);
        }
        all_mints.extend(tfta_out.organic);
        all_mints.extend(tft_out.organic);

        // Stable: same-instant mints keep ledger order
        all_mints.sort_by_key(|m| m.timestamp);

        let clusters = cluster_payouts(&all_mints, self.cluster_cutoff);

        let mut migrations = tfta_out.migrations;
        migrations.extend(tft_out.migrations);

        let unmatched_burns = tfta_burns
            .into_unmatched()
            .into_iter()
            .map(|burn| UnmatchedBurn { asset: Asset::Tfta, burn })
            .chain(
                tft_burns
                    .into_unmatched()
                    .into_iter()
                    .map(|burn| UnmatchedBurn { asset: Asset::Tft, burn }),
            )
            .collect();

        let report = ReconciliationReport {
            all_mints,
            migrations,
            conversions: tft_out.conversions,
            unmatched_burns,
            clusters,
            addresses: rivine.addresses,
            reconciled_at: Utc::now(),
        };

        info!("⚖️  {}", report.summary());
        Ok(report)
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;
    use crate::events::{BurnEvent, NativeMint};
    use crate::oracle::tests::FakeOracle;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
    }

    fn mint(id: &str, hours: i64, to: &str, amount: u64, memo: &str) -> NativeMint {
        NativeMint {
            id: id.to_string(),
            timestamp: t0() + Duration::hours(hours),
            recipient: to.to_string(),
            amount,
            memo: memo.to_string(),
        }
    }

    fn burn(id: &str, hours: i64, from: &str, amount: u64) -> BurnEvent {
        BurnEvent {
            id: id.to_string(),
            timestamp: t0() + Duration::hours(hours),
            counterparty: from.to_string(),
            amount,
        }
    }

    fn snapshot() -> LedgerSnapshot {
        LedgerSnapshot {
            rivine: RivineHistory {
                mints: vec![
                    mint("r1", 0, "01alice", 1_000_000_000, ""),
                    mint("r2", 2, "01bob", 2_000_000_000, ""),
                ],
                addresses: vec!["01alice".to_string(), "01bob".to_string()],
            },
            tfta: AccountHistory {
                mints: vec![
                    mint("a1", 1, "GALICE", 10_000_000, "aa"),
                    mint("a2", 400, "GCAROL", 50_000_000, "deauth-a"),
                ],
                burns: vec![
                    burn("tfta-burn-1", 300, "GDAVE", 70_000_000),
                    burn("tfta-burn-2", 301, "GERIN", 80_000_000),
                ],
            },
            tft: AccountHistory {
                mints: vec![
                    mint("t1", 302, "GDAVE", 70_000_000, "tfta-burn-1"),
                    mint("t2", 401, "GFRED", 30_000_000, "deauth-t"),
                    mint("t3", 402, "GALICE", 20_000_000, "bb"),
                ],
                burns: vec![burn("tft-burn-1", 10, "GHANK", 5_000_000)],
            },
        }
    }

    #[tokio::test]
    async fn test_full_reconciliation() {
        let oracle = FakeOracle::new(&["deauth-a", "deauth-t"]);
        let engine = ReconciliationEngine::new();

        let report = engine.reconcile(snapshot(), &oracle).await.unwrap();

        // Organic: r1, a1, r2 (first period) and t3 (second period)
        let ids: Vec<&str> = report.all_mints.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "a1", "r2", "t3"]);
        assert_eq!(report.all_mints[1].amount, 1_000_000_000); // 1 TFTA at 9 digits
        assert_eq!(report.organic_total(), 6_000_000_000);

        assert_eq!(report.clusters.len(), 2);
        assert_eq!(report.clusters[0].transaction_count, 3);
        assert_eq!(report.clusters[0].amount, 4_000_000_000);
        assert_eq!(report.clusters[1].transaction_count, 1);

        assert_eq!(report.migrations.len(), 2);
        assert_eq!(report.migrations[0].source_asset, Asset::Tfta);
        assert_eq!(report.migrations[1].source_asset, Asset::Tft);

        assert_eq!(report.conversions.len(), 1);
        assert_eq!(report.conversions[0].account, "GDAVE");
        assert_eq!(report.conversions[0].burn_token, "tfta-burn-1");

        // Unmatched: TFTA first, then TFT, untouched
        assert_eq!(report.unmatched_burns.len(), 2);
        assert_eq!(report.unmatched_burns[0].asset, Asset::Tfta);
        assert_eq!(report.unmatched_burns[0].burn, burn("tfta-burn-2", 301, "GERIN", 80_000_000));
        assert_eq!(report.unmatched_burns[1].asset, Asset::Tft);
        assert_eq!(report.unmatched_burns[1].burn.amount, 5_000_000);

        assert_eq!(report.addresses.len(), 2);

        println!("✅ {}", report.summary());
    }

    #[tokio::test]
    async fn test_memo_shared_across_assets_is_queried_once() {
        let mut snap = snapshot();
        snap.tfta.mints[0].memo = "shared".to_string();
        snap.tft.mints[2].memo = "shared".to_string();
        let oracle = FakeOracle::new(&["deauth-a", "deauth-t"]);

        let report = ReconciliationEngine::new().reconcile(snap, &oracle).await.unwrap();

        // shared, deauth-a, deauth-t; tfta-burn-1 is a conversion
        assert_eq!(oracle.call_count(), 3);
        assert_eq!(report.all_mints.len(), 4);
    }

    #[tokio::test]
    async fn test_oracle_failure_aborts_pass() {
        let oracle = FakeOracle::new(&[]).failing_on("bb");
        let err = ReconciliationEngine::new()
            .reconcile(snapshot(), &oracle)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::OracleUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_custom_cutoff_changes_clusters() {
        let oracle = FakeOracle::new(&["deauth-a", "deauth-t"]);
        let engine = ReconciliationEngine::with_settings(Duration::minutes(30), 4);

        let report = engine.reconcile(snapshot(), &oracle).await.unwrap();
        // r1@0h, a1@1h, r2@2h, t3@402h all more than 30 minutes apart
        assert_eq!(report.clusters.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_snapshot() {
        let oracle = FakeOracle::new(&[]);
        let report = ReconciliationEngine::default()
            .reconcile(LedgerSnapshot::default(), &oracle)
            .await
            .unwrap();
        assert!(report.all_mints.is_empty());
        assert!(report.clusters.is_empty());
        assert_eq!(oracle.call_count(), 0);
    }
}
