// 🚚 Rivine Ingestion - sharded fan-out over block heights, fan-in to one aggregator
//
// Worker k fetches heights start+k, start+k+N, start+k+2N, ... with its own
// client. Mints and address observations travel on two unbounded channels.
// The aggregator drains both until every worker has finished; the first
// worker error aborts the rest. Arrival order is arbitrary, so mints are
// stable-sorted by timestamp before anyone looks at them.

use super::decoder::TxVersionRegistry;
use super::explorer::{extract_block, BlockSource};
use crate::error::{ReconcileError, Result};
use crate::events::NativeMint;
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Log progress every this many blocks per worker
const PROGRESS_INTERVAL: u64 = 1000;

/// Rivine mints (timestamp-sorted) and every address seen in coin outputs (sorted, unique)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RivineHistory {
    pub mints: Vec<NativeMint>,
    pub addresses: Vec<String>,
}

/// Heights `[start, end)` to scan with `workers` concurrent fetchers
#[derive(Debug, Clone)]
pub struct IngestPlan {
    pub heights: Range<u64>,
    pub workers: usize,
}

impl IngestPlan {
    pub fn new(heights: Range<u64>, workers: usize) -> Self {
        IngestPlan {
            heights,
            workers: workers.max(1),
        }
    }

    /// Heights owned by worker `k` (0-based)
    pub fn shard(&self, k: usize) -> impl Iterator<Item = u64> {
        let first = self.heights.start.saturating_add(k as u64);
        (first..self.heights.end).step_by(self.workers)
    }
}

async fn run_worker<S: BlockSource>(
    worker: usize,
    source: S,
    registry: Arc<TxVersionRegistry>,
    heights: impl Iterator<Item = u64>,
    mints: UnboundedSender<NativeMint>,
    addresses: UnboundedSender<String>,
) -> Result<()> {
    let mut processed = 0u64;
    for height in heights {
        let block = source.block(height).await?;
        let events = extract_block(height, &block, &registry)?;

        for address in events.addresses {
            addresses
                .send(address)
                .map_err(|_| ReconcileError::Worker(format!("worker {}: address channel closed", worker)))?;
        }
        for mint in events.mints {
            mints
                .send(mint)
                .map_err(|_| ReconcileError::Worker(format!("worker {}: mint channel closed", worker)))?;
        }

        processed += 1;
        if processed % PROGRESS_INTERVAL == 0 {
            debug!("worker {} at block {} ({} blocks)", worker, height, processed);
        }
    }
    Ok(())
}

/// Scan the planned heights. `make_source` is called once per worker so each
/// worker owns its client.
pub async fn ingest_rivine<S, F>(
    plan: &IngestPlan,
    registry: Arc<TxVersionRegistry>,
    make_source: F,
) -> Result<RivineHistory>
where
    S: BlockSource + 'static,
    F: Fn() -> S,
{
    info!(
        "⛓️  Scanning blocks {}..{} with {} workers",
        plan.heights.start, plan.heights.end, plan.workers
    );

    let (mint_tx, mut mint_rx) = unbounded_channel();
    let (addr_tx, mut addr_rx) = unbounded_channel();
    let mut workers = JoinSet::new();

    for k in 0..plan.workers {
        let heights: Vec<u64> = plan.shard(k).collect();
        workers.spawn(run_worker(
            k,
            make_source(),
            Arc::clone(&registry),
            heights.into_iter(),
            mint_tx.clone(),
            addr_tx.clone(),
        ));
    }
    // Channels close once every worker has dropped its senders
    drop(mint_tx);
    drop(addr_tx);

    let mut mints = Vec::new();
    let mut addresses = BTreeSet::new();

    loop {
        tokio::select! {
            Some(mint) = mint_rx.recv() => mints.push(mint),
            Some(address) = addr_rx.recv() => {
                addresses.insert(address);
            }
            joined = workers.join_next(), if !workers.is_empty() => match joined {
                Some(Ok(Ok(()))) | None => {}
                Some(Ok(Err(err))) => {
                    warn!("ingestion worker failed, aborting: {}", err);
                    workers.abort_all();
                    return Err(err);
                }
                Some(Err(join_err)) => {
                    workers.abort_all();
                    return Err(ReconcileError::Worker(join_err.to_string()));
                }
            },
            else => break,
        }
    }

    // Workers interleave arbitrarily
    mints.sort_by_key(|m: &NativeMint| m.timestamp);

    info!(
        "✓ Rivine: {} mints, {} unique addresses",
        mints.len(),
        addresses.len()
    );

    Ok(RivineHistory {
        mints,
        addresses: addresses.into_iter().collect(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
