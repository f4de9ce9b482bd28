use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mint_reconciliation::{
    ingest_rivine, write_reports, Asset, Config, ExplorerClient,
    ExplorerDeauthOracle, HorizonClient, IngestPlan, LedgerSnapshot, ReconciliationEngine,
    TxVersionRegistry,
};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "info,mint_reconciliation=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let config = Config::from_env().context("Failed to load configuration")?;

    match args.get(1).map(String::as_str) {
        None | Some("reconcile") => run_reconcile(&config).await?,
        Some("config") => print_config(&config)?,
        Some(other) => {
            eprintln!("❌ Unknown command: {}", other);
            eprintln!("   Usage: mint-reconciliation [reconcile|config]");
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_config(config: &Config) -> Result<()> {
    let rendered = serde_json::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}

async fn run_reconcile(config: &Config) -> Result<()> {
    info!("🚀 Mint reconciliation v{}", mint_reconciliation::VERSION);

    // 1. Transaction decoding setup, once, before any ingestion
    let registry = Arc::new(TxVersionRegistry::standard());
    info!("🧩 Registered {} transaction versions", registry.len());

    // 2. Ingest all three ledgers
    let snapshot = fetch_snapshot(config, registry)
        .await
        .context("Ledger ingestion failed")?;

    // 3. Reconcile
    let oracle = ExplorerDeauthOracle::new(&config.explorer_url);
    let engine = ReconciliationEngine::with_settings(config.cluster_cutoff()?, config.oracle_concurrency);
    let report = engine
        .reconcile(snapshot, &oracle)
        .await
        .context("Reconciliation failed")?;

    // 4. Reports, only once the whole pass succeeded
    let written = write_reports(&config.output_dir, &report).context("Failed to write reports")?;
    for path in &written {
        info!("✓ {}", path.display());
    }

    info!("✅ {}", report.summary());
    Ok(())
}

async fn fetch_snapshot(
    config: &Config,
    registry: Arc<TxVersionRegistry>,
) -> mint_reconciliation::Result<LedgerSnapshot> {
    let explorer = ExplorerClient::new(&config.explorer_url);
    let end_height = match config.end_height {
        Some(end) => end,
        None => explorer.chain_height().await? + 1,
    };
    let plan = IngestPlan::new(config.start_height..end_height, config.explorer_workers);

    let horizon = HorizonClient::new(&config.horizon_url, config.page_limit);
    let explorer_url = config.explorer_url.clone();

    let (rivine, tfta, tft) = tokio::try_join!(
        ingest_rivine(&plan, registry, move || ExplorerClient::new(explorer_url.clone())),
        horizon.account_history(Asset::Tfta, &config.tfta_issuer),
        horizon.account_history(Asset::Tft, &config.tft_issuer),
    )?;

    Ok(LedgerSnapshot { rivine, tft, tfta })
}
