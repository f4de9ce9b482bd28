// Mint Reconciliation - Core Library
// Cross-ledger mint/burn reconciliation and payout clustering

pub mod error;
pub mod config;
pub mod events;         // Mint / burn / classification records
pub mod amount;         // Amount Normalizer
pub mod burn_index;     // Burn-Match Index
pub mod oracle;         // Deauth Oracle
pub mod classifier;     // Organic / migration / conversion
pub mod clustering;     // Payout Cluster Builder
pub mod sources;        // Explorer + Horizon ingestion
pub mod reconciliation; // Reconciliation Engine
pub mod report;         // CSV reports

// Re-export commonly used types
pub use error::{ReconcileError, Result};
pub use config::Config;
pub use events::{
    Asset, BurnEvent, ConversionRecord, MigrationRecord, NativeMint, NormalizedEvent,
    SourceLedger, UnmatchedBurn,
};
pub use amount::{
    denormalize, format_fixed, normalize, parse_native_amount,
    ACCOUNT_LEDGER_PRECISION, CANONICAL_PRECISION,
};
pub use burn_index::BurnMatchIndex;
pub use oracle::{verdict, CachingOracle, DeauthOracle, ExplorerDeauthOracle};
pub use classifier::{Classification, ClassifiedMints, Classifier};
pub use clustering::{
    cluster_payouts, default_cluster_cutoff, ClusterBuilder, PayoutCluster,
    DEFAULT_CLUSTER_CUTOFF_HOURS,
};
pub use sources::{
    fetch_account_history, ingest_rivine, AccountHistory, BlockSource, ExplorerClient,
    HorizonClient, IngestPlan, OperationsSource, RivineHistory, TxVersionRegistry,
};
pub use reconciliation::{LedgerSnapshot, ReconciliationEngine, ReconciliationReport};
pub use report::write_reports;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
