// 📝 Report Emitter - one CSV per record kind, stable column order
//
// Canonical amounts are rendered with 9 digits, native account-ledger amounts
// with 7. Times are RFC822-style in UTC.

use crate::amount::{format_fixed, ACCOUNT_LEDGER_PRECISION, CANONICAL_PRECISION};
use crate::clustering::PayoutCluster;
use crate::error::Result;
use crate::events::{ConversionRecord, MigrationRecord, NormalizedEvent, UnmatchedBurn};
use crate::reconciliation::ReconciliationReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const ALL_MINTS_FILE: &str = "all_mints.csv";
pub const MIGRATIONS_FILE: &str = "migrations.csv";
pub const CONVERSIONS_FILE: &str = "conversions.csv";
pub const ADDRESSES_FILE: &str = "rivine_addresses.csv";
pub const BURNS_FILE: &str = "stellar_burns.csv";
pub const CLUSTERS_FILE: &str = "cluster_mints.csv";

/// "02 Jan 06 15:04 UTC"
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%d %b %y %H:%M UTC").to_string()
}

// ============================================================================
// ROWS
// ============================================================================

#[derive(Debug, Serialize)]
struct MintRow {
    #[serde(rename = "Transaction ID")]
    id: String,
    #[serde(rename = "Transaction time")]
    time: String,
    #[serde(rename = "Recipient")]
    recipient: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Memo")]
    memo: String,
}

impl From<&NormalizedEvent> for MintRow {
    fn from(mint: &NormalizedEvent) -> Self {
        MintRow {
            id: mint.id.clone(),
            time: format_time(&mint.timestamp),
            recipient: mint.recipient.clone(),
            amount: format_fixed(mint.amount, CANONICAL_PRECISION),
            memo: mint.memo.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MigrationRow {
    #[serde(rename = "Recipient")]
    recipient: String,
    #[serde(rename = "Transaction time")]
    time: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Asset")]
    asset: String,
    #[serde(rename = "Deauth hash")]
    deauth_hash: String,
}

impl From<&MigrationRecord> for MigrationRow {
    fn from(m: &MigrationRecord) -> Self {
        MigrationRow {
            recipient: m.recipient.clone(),
            time: format_time(&m.timestamp),
            amount: format_fixed(m.amount, ACCOUNT_LEDGER_PRECISION),
            asset: m.source_asset.code().to_string(),
            deauth_hash: m.correlation_token.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ConversionRow {
    #[serde(rename = "Account")]
    account: String,
    #[serde(rename = "TFTA burn time")]
    burn_time: String,
    #[serde(rename = "TFT mint time")]
    mint_time: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Burn hash")]
    burn_hash: String,
}

impl From<&ConversionRecord> for ConversionRow {
    fn from(c: &ConversionRecord) -> Self {
        ConversionRow {
            account: c.account.clone(),
            burn_time: format_time(&c.burn_timestamp),
            mint_time: format_time(&c.mint_timestamp),
            amount: format_fixed(c.amount, ACCOUNT_LEDGER_PRECISION),
            burn_hash: c.burn_token.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BurnRow {
    #[serde(rename = "Transaction ID")]
    id: String,
    #[serde(rename = "Transaction time")]
    time: String,
    #[serde(rename = "Asset")]
    asset: String,
    #[serde(rename = "Sender")]
    sender: String,
    #[serde(rename = "Amount")]
    amount: String,
}

impl From<&UnmatchedBurn> for BurnRow {
    fn from(u: &UnmatchedBurn) -> Self {
        BurnRow {
            id: u.burn.id.clone(),
            time: format_time(&u.burn.timestamp),
            asset: u.asset.code().to_string(),
            sender: u.burn.counterparty.clone(),
            amount: format_fixed(u.burn.amount, ACCOUNT_LEDGER_PRECISION),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClusterRow {
    #[serde(rename = "Cluster start")]
    start: String,
    #[serde(rename = "Cluster end")]
    end: String,
    #[serde(rename = "Transaction count")]
    transactions: u64,
    #[serde(rename = "Unique recipients")]
    recipients: usize,
    #[serde(rename = "Amount")]
    amount: String,
}

impl From<&PayoutCluster> for ClusterRow {
    fn from(c: &PayoutCluster) -> Self {
        ClusterRow {
            start: format_time(&c.start),
            end: format_time(&c.end),
            transactions: c.transaction_count,
            recipients: c.unique_recipients(),
            amount: c.amount_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AddressRow<'a> {
    #[serde(rename = "Address")]
    address: &'a str,
}

// ============================================================================
// WRITERS
// ============================================================================

/// Write rows with a header line, even when there are no rows
fn write_rows<W, R, I>(out: W, headers: &[&str], rows: I) -> Result<()>
where
    W: Write,
    R: Serialize,
    I: IntoIterator<Item = R>,
{
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_all_mints<W: Write>(out: W, mints: &[NormalizedEvent]) -> Result<()> {
    write_rows(
        out,
        &["Transaction ID", "Transaction time", "Recipient", "Amount", "Memo"],
        mints.iter().map(MintRow::from),
    )
}

pub fn write_migrations<W: Write>(out: W, migrations: &[MigrationRecord]) -> Result<()> {
    write_rows(
        out,
        &["Recipient", "Transaction time", "Amount", "Asset", "Deauth hash"],
        migrations.iter().map(MigrationRow::from),
    )
}

pub fn write_conversions<W: Write>(out: W, conversions: &[ConversionRecord]) -> Result<()> {
    write_rows(
        out,
        &["Account", "TFTA burn time", "TFT mint time", "Amount", "Burn hash"],
        conversions.iter().map(ConversionRow::from),
    )
}

pub fn write_unmatched_burns<W: Write>(out: W, burns: &[UnmatchedBurn]) -> Result<()> {
    write_rows(
        out,
        &["Transaction ID", "Transaction time", "Asset", "Sender", "Amount"],
        burns.iter().map(BurnRow::from),
    )
}

pub fn write_clusters<W: Write>(out: W, clusters: &[PayoutCluster]) -> Result<()> {
    write_rows(
        out,
        &["Cluster start", "Cluster end", "Transaction count", "Unique recipients", "Amount"],
        clusters.iter().map(ClusterRow::from),
    )
}

pub fn write_addresses<W: Write>(out: W, addresses: &[String]) -> Result<()> {
    write_rows(
        out,
        &["Address"],
        addresses.iter().map(|a| AddressRow { address: a }),
    )
}

/// Write every report into `dir`, returning the paths written
pub fn write_reports(dir: &Path, report: &ReconciliationReport) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let path = |name: &str| dir.join(name);
    let mut written = Vec::new();

    let p = path(ALL_MINTS_FILE);
    write_all_mints(File::create(&p)?, &report.all_mints)?;
    written.push(p);

    let p = path(MIGRATIONS_FILE);
    write_migrations(File::create(&p)?, &report.migrations)?;
    written.push(p);

    let p = path(CONVERSIONS_FILE);
    write_conversions(File::create(&p)?, &report.conversions)?;
    written.push(p);

    let p = path(ADDRESSES_FILE);
    write_addresses(File::create(&p)?, &report.addresses)?;
    written.push(p);

    let p = path(BURNS_FILE);
    write_unmatched_burns(File::create(&p)?, &report.unmatched_burns)?;
    written.push(p);

    let p = path(CLUSTERS_FILE);
    write_clusters(File::create(&p)?, &report.clusters)?;
    written.push(p);

    info!("📝 Wrote {} reports to {}", written.len(), dir.display());
    Ok(written)
}

// ============================================================================
// TESTS
// ============================================================================
