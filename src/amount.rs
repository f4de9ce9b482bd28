// 🔢 Amount Normalizer - fixed-point rescaling into canonical precision
//
// Canonical precision is 9 decimal digits. Each source ledger has a fixed
// scale factor; it is applied exactly once, at normalization time.
// Floating point never touches an amount.

use crate::error::{ReconcileError, Result};
use crate::events::{NativeMint, NormalizedEvent, SourceLedger};

/// Decimal digits of the canonical representation
pub const CANONICAL_PRECISION: u32 = 9;

/// Decimal digits of account-ledger amount strings
pub const ACCOUNT_LEDGER_PRECISION: u32 = 7;

/// Multiplier taking a native amount of `ledger` to canonical precision
pub fn scale_factor(ledger: SourceLedger) -> u64 {
    10u64.pow(CANONICAL_PRECISION - ledger.native_precision())
}

/// Rescale a native amount to canonical precision
pub fn normalize(amount: u64, ledger: SourceLedger) -> Result<u64> {
    amount
        .checked_mul(scale_factor(ledger))
        .ok_or(ReconcileError::Overflow {
            ledger,
            amount,
            token: String::new(),
        })
}

/// Inverse of [`normalize`]; `None` if the canonical amount carries digits
/// the native precision cannot represent
pub fn denormalize(canonical: u64, ledger: SourceLedger) -> Option<u64> {
    let factor = scale_factor(ledger);
    if canonical % factor != 0 {
        return None;
    }
    Some(canonical / factor)
}

/// Normalize a whole mint record
pub fn normalize_mint(mint: NativeMint, ledger: SourceLedger) -> Result<NormalizedEvent> {
    let amount = normalize(mint.amount, ledger).map_err(|err| match err {
        ReconcileError::Overflow { ledger, amount, .. } => ReconcileError::Overflow {
            ledger,
            amount,
            token: mint.id.clone(),
        },
        other => other,
    })?;
    Ok(NormalizedEvent {
        amount,
        id: mint.id,
        timestamp: mint.timestamp,
        recipient: mint.recipient,
        memo: mint.memo,
    })
}

/// Parse an account-ledger decimal string ("<integer>.<fraction>") into an
/// integer at 7-digit native precision.
///
/// Examples:
/// - "123.45"     → 1234500000
/// - "10"         → 100000000
/// - "0.0000001"  → 1
pub fn parse_native_amount(input: &str) -> Result<u64> {
    let (int_part, frac_part) = match input.split_once('.') {
        Some((i, f)) => (i, f),
        None => (input, ""),
    };

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReconcileError::parse(input, "integer part is not numeric"));
    }
    if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReconcileError::parse(input, "fraction part is not numeric"));
    }
    if frac_part.len() > ACCOUNT_LEDGER_PRECISION as usize {
        return Err(ReconcileError::parse(
            input,
            format!("more than {} fraction digits", ACCOUNT_LEDGER_PRECISION),
        ));
    }

    let whole: u64 = int_part
        .parse()
        .map_err(|e| ReconcileError::parse(input, e))?;

    // Right-pad the fraction: "45" at 7 digits is 4500000
    let mut fraction: u64 = 0;
    if !frac_part.is_empty() {
        fraction = frac_part
            .parse()
            .map_err(|e| ReconcileError::parse(input, e))?;
        fraction *= 10u64.pow(ACCOUNT_LEDGER_PRECISION - frac_part.len() as u32);
    }

    whole
        .checked_mul(10u64.pow(ACCOUNT_LEDGER_PRECISION))
        .and_then(|v| v.checked_add(fraction))
        .ok_or_else(|| ReconcileError::parse(input, "amount overflows 64 bits"))
}

/// Render a fixed-point integer with `digits` fraction digits
pub fn format_fixed(amount: u64, digits: u32) -> String {
    let unit = 10u64.pow(digits);
    format!(
        "{}.{:0width$}",
        amount / unit,
        amount % unit,
        width = digits as usize
    )
}

// ============================================================================
// TESTS
// ============================================================================
