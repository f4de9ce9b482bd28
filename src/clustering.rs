// 📅 Payout Cluster Builder - single-pass temporal clustering of organic mints
//
// An event joins the open cluster iff its timestamp is at most `cutoff` after
// the cluster's current end (boundary inclusive). Otherwise the open cluster is
// sealed and a new one starts. Input must be sorted by timestamp; unsorted
// input is not detected and yields overlapping clusters.

use crate::amount::{format_fixed, CANONICAL_PRECISION};
use crate::events::NormalizedEvent;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 7 days 4 hours. Separates the known payout periods while still covering
/// one observed late payout.
pub const DEFAULT_CLUSTER_CUTOFF_HOURS: i64 = 172;

pub fn default_cluster_cutoff() -> Duration {
    Duration::hours(DEFAULT_CLUSTER_CUTOFF_HOURS)
}

// ============================================================================
// PAYOUT CLUSTER
// ============================================================================

/// Mints that resulted from the same payout period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutCluster {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub transaction_count: u64,
    pub recipients: BTreeSet<String>,
    /// Canonical precision
    pub amount: u64,
}

impl PayoutCluster {
    fn seed(event: &NormalizedEvent) -> Self {
        PayoutCluster {
            start: event.timestamp,
            end: event.timestamp,
            transaction_count: 1,
            recipients: BTreeSet::from([event.recipient.clone()]),
            amount: event.amount,
        }
    }

    /// Add `event` if it is within `cutoff` of the current end.
    /// Returns false (cluster untouched) when it does not fit. A limit past
    /// the end of representable time admits everything.
    fn try_extend(&mut self, event: &NormalizedEvent, cutoff: Duration) -> bool {
        if let Some(limit) = self.end.checked_add_signed(cutoff) {
            if event.timestamp > limit {
                return false;
            }
        }
        self.end = event.timestamp;
        self.transaction_count += 1;
        self.recipients.insert(event.recipient.clone());
        self.amount += event.amount;
        true
    }

    pub fn unique_recipients(&self) -> usize {
        self.recipients.len()
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time <= self.end
    }

    pub fn amount_string(&self) -> String {
        format_fixed(self.amount, CANONICAL_PRECISION)
    }
}

// ============================================================================
// CLUSTER BUILDER
// ============================================================================

pub struct ClusterBuilder {
    cutoff: Duration,
    sealed: Vec<PayoutCluster>,
    open: Option<PayoutCluster>,
}

impl ClusterBuilder {
    pub fn new(cutoff: Duration) -> Self {
        ClusterBuilder {
            cutoff,
            sealed: Vec::new(),
            open: None,
        }
    }

    pub fn push(&mut self, event: &NormalizedEvent) {
        if let Some(open) = self.open.as_mut() {
            if open.try_extend(event, self.cutoff) {
                return;
            }
        }
        if let Some(done) = self.open.replace(PayoutCluster::seed(event)) {
            self.sealed.push(done);
        }
    }

    /// Seal the open cluster and return every cluster in creation order
    pub fn finish(mut self) -> Vec<PayoutCluster> {
        if let Some(open) = self.open.take() {
            self.sealed.push(open);
        }
        self.sealed
    }
}

impl Default for ClusterBuilder {
    fn default() -> Self {
        Self::new(default_cluster_cutoff())
    }
}

/// Cluster a timestamp-sorted organic mint stream
pub fn cluster_payouts(events: &[NormalizedEvent], cutoff: Duration) -> Vec<PayoutCluster> {
    let mut builder = ClusterBuilder::new(cutoff);
    for event in events {
        builder.push(event);
    }
    builder.finish()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn t_a() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap()
    }

    fn event_at(time: DateTime<Utc>, recipient: &str, amount: u64) -> NormalizedEvent {
        NormalizedEvent {
            id: format!("tx-{}", time.timestamp_nanos_opt().unwrap_or_default()),
            timestamp: time,
            recipient: recipient.to_string(),
            amount,
            memo: String::new(),
        }
    }

    #[test]
    fn test_two_cluster_scenario() {
        let events = vec![
            event_at(t_a(), "alice", 10),
            event_at(t_a() + Duration::hours(1), "bob", 5),
            event_at(t_a() + Duration::hours(200), "alice", 3),
        ];

        let clusters = cluster_payouts(&events, default_cluster_cutoff());

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].start, t_a());
        assert_eq!(clusters[0].end, t_a() + Duration::hours(1));
        assert_eq!(clusters[0].transaction_count, 2);
        assert_eq!(clusters[0].amount, 15);
        assert_eq!(clusters[0].unique_recipients(), 2);

        assert_eq!(clusters[1].start, t_a() + Duration::hours(200));
        assert_eq!(clusters[1].end, t_a() + Duration::hours(200));
        assert_eq!(clusters[1].transaction_count, 1);
        assert_eq!(clusters[1].amount, 3);

        println!("✅ Two-cluster scenario passed");
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let cutoff = default_cluster_cutoff();

        let same = cluster_payouts(
            &[event_at(t_a(), "a", 1), event_at(t_a() + cutoff, "a", 1)],
            cutoff,
        );
        assert_eq!(same.len(), 1);

        let split = cluster_payouts(
            &[
                event_at(t_a(), "a", 1),
                event_at(t_a() + cutoff + Duration::nanoseconds(1), "a", 1),
            ],
            cutoff,
        );
        assert_eq!(split.len(), 2);
    }

    #[test]
    fn test_gap_measured_from_current_end() {
        // Each hop is within the cutoff, total span is far beyond it
        let cutoff = Duration::hours(10);
        let events: Vec<_> = (0..5)
            .map(|i| event_at(t_a() + Duration::hours(9 * i), "r", 1))
            .collect();

        let clusters = cluster_payouts(&events, cutoff);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].end - clusters[0].start, Duration::hours(36));
    }

    #[test]
    fn test_members_lie_within_their_cluster() {
        let cutoff = Duration::hours(24);
        let offsets = [0i64, 2, 5, 40, 41, 100, 123, 124, 300];
        let events: Vec<_> = offsets
            .iter()
            .map(|h| event_at(t_a() + Duration::hours(*h), "r", 7))
            .collect();

        let clusters = cluster_payouts(&events, cutoff);
        let total: u64 = clusters.iter().map(|c| c.transaction_count).sum();
        assert_eq!(total as usize, events.len());

        let mut idx = 0;
        for cluster in &clusters {
            assert!(cluster.start <= cluster.end);
            for _ in 0..cluster.transaction_count {
                assert!(cluster.contains(events[idx].timestamp));
                idx += 1;
            }
        }
        assert_eq!(clusters.len(), 4);
    }

    #[test]
    fn test_huge_cutoff_does_not_overflow() {
        // end + cutoff lies beyond chrono's representable range
        let cutoff = Duration::days(100_000_000);
        let events = vec![
            event_at(t_a(), "a", 1),
            event_at(t_a() + Duration::days(1000), "b", 1),
        ];
        let clusters = cluster_payouts(&events, cutoff);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].transaction_count, 2);
    }

    proptest! {
        #[test]
        fn prop_sorted_stream_partitions_into_clusters(
            mut offsets in prop::collection::vec(0i64..2_000, 0..60),
            cutoff_hours in 0i64..200,
        ) {
            offsets.sort_unstable();
            let cutoff = Duration::hours(cutoff_hours);
            let events: Vec<_> = offsets
                .iter()
                .map(|h| event_at(t_a() + Duration::hours(*h), "r", 1))
                .collect();

            let clusters = cluster_payouts(&events, cutoff);
            let total: u64 = clusters.iter().map(|c| c.transaction_count).sum();
            prop_assert_eq!(total as usize, events.len());

            let mut members = events.iter();
            for (i, cluster) in clusters.iter().enumerate() {
                prop_assert!(cluster.start <= cluster.end);
                let mut previous = cluster.start;
                for _ in 0..cluster.transaction_count {
                    let event = members.next().unwrap();
                    prop_assert!(cluster.contains(event.timestamp));
                    prop_assert!(event.timestamp - previous <= cutoff);
                    previous = event.timestamp;
                }
                // Consecutive clusters are separated by more than the cutoff
                if let Some(next) = clusters.get(i + 1) {
                    prop_assert!(next.start - cluster.end > cutoff);
                }
            }
        }
    }

    #[test]
    fn test_recipients_deduplicated() {
        let events = vec![
            event_at(t_a(), "alice", 1),
            event_at(t_a() + Duration::minutes(1), "alice", 1),
            event_at(t_a() + Duration::minutes(2), "carol", 1),
        ];
        let clusters = cluster_payouts(&events, default_cluster_cutoff());
        assert_eq!(clusters[0].transaction_count, 3);
        assert_eq!(clusters[0].unique_recipients(), 2);
        assert_eq!(clusters[0].amount_string(), "0.000000003");
    }

    #[test]
    fn test_empty_stream() {
        assert!(cluster_payouts(&[], default_cluster_cutoff()).is_empty());
        assert!(ClusterBuilder::default().finish().is_empty());
    }
}
