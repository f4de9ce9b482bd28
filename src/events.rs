// 🧾 Event Model - mint/burn records shared by every stage of the pass
//
// Amount precision is part of the type's contract:
//   - NativeMint / BurnEvent / MigrationRecord / ConversionRecord: source ledger precision
//   - NormalizedEvent / PayoutCluster: canonical 9-digit precision

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// SOURCE LEDGERS
// ============================================================================

/// SourceLedger - which ledger (and asset) an event was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceLedger {
    /// UTXO chain (tfchain explorer)
    Rivine,
    /// Account ledger, TFT asset
    Tft,
    /// Account ledger, TFTA asset
    Tfta,
}

impl SourceLedger {
    /// Number of decimal digits in the ledger's native amounts
    pub fn native_precision(&self) -> u32 {
        match self {
            SourceLedger::Rivine => 9,
            SourceLedger::Tft | SourceLedger::Tfta => 7,
        }
    }

    /// Short code used in logs and reports
    pub fn code(&self) -> &'static str {
        match self {
            SourceLedger::Rivine => "RIVINE",
            SourceLedger::Tft => "TFT",
            SourceLedger::Tfta => "TFTA",
        }
    }

    /// The account-ledger asset, if this is one
    pub fn asset(&self) -> Option<Asset> {
        match self {
            SourceLedger::Rivine => None,
            SourceLedger::Tft => Some(Asset::Tft),
            SourceLedger::Tfta => Some(Asset::Tfta),
        }
    }
}

impl fmt::Display for SourceLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Asset - the two tokens issued on the account ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Tft,
    Tfta,
}

impl Asset {
    pub fn code(&self) -> &'static str {
        match self {
            Asset::Tft => "TFT",
            Asset::Tfta => "TFTA",
        }
    }

    pub fn ledger(&self) -> SourceLedger {
        match self {
            Asset::Tft => SourceLedger::Tft,
            Asset::Tfta => SourceLedger::Tfta,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// MINTS
// ============================================================================

/// NativeMint - a mint as read from its ledger, before normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeMint {
    /// Ledger-native transaction identifier (correlation token)
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub recipient: String,
    /// Amount at the source ledger's native precision
    pub amount: u64,
    /// Lowercase hex rendering of the attached memo ("" when none)
    pub memo: String,
}

/// NormalizedEvent - canonical mint representation (9-digit precision)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub recipient: String,
    pub amount: u64,
    pub memo: String,
}

// ============================================================================
// BURNS
// ============================================================================

/// BurnEvent - a payment back to the issuer, at native precision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub counterparty: String,
    pub amount: u64,
}

/// UnmatchedBurn - a burn no mint ever consumed, tagged with its asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedBurn {
    pub asset: Asset,
    pub burn: BurnEvent,
}

// ============================================================================
// CLASSIFICATION OUTPUTS
// ============================================================================

/// MigrationRecord - mint whose memo is a recognized deauthorization hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub source_asset: Asset,
    pub timestamp: DateTime<Utc>,
    /// Native precision
    pub amount: u64,
    pub recipient: String,
    pub correlation_token: String,
}

/// ConversionRecord - mint whose memo names a pending burn on the other asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub account: String,
    /// Native precision (the burned amount)
    pub amount: u64,
    pub burn_timestamp: DateTime<Utc>,
    pub mint_timestamp: DateTime<Utc>,
    pub burn_token: String,
}
