// 🚨 Error Taxonomy - every failure aborts the reconciliation pass
//
// There is no partial-success mode: a mint whose classification cannot be
// determined must never be defaulted to "organic" or "migration".

use crate::events::SourceLedger;
use thiserror::Error;

/// Top-level error type for the reconciliation engine
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Network/HTTP failure reaching an external source
    #[error("Transport error on {ledger} ({context}): {reason}")]
    Transport {
        ledger: SourceLedger,
        context: String,
        reason: String,
    },

    /// Response body could not be interpreted
    #[error("Decode error on {ledger} ({context}): {reason}")]
    Decode {
        ledger: SourceLedger,
        context: String,
        reason: String,
    },

    /// Malformed decimal amount string; `ledger`/`context` are filled in by
    /// the source that read it
    #[error("Could not parse amount {input:?}{}: {reason}", origin(.ledger, .context))]
    Parse {
        input: String,
        reason: String,
        ledger: Option<SourceLedger>,
        context: String,
    },

    /// Deauth oracle could not answer for this hash
    #[error("Deauth oracle unavailable for hash {hash}: {reason}")]
    OracleUnavailable { hash: String, reason: String },

    #[error("Amount {amount} of tx {token:?} from {ledger} overflows canonical precision")]
    Overflow {
        ledger: SourceLedger,
        amount: u64,
        /// Transaction id of the offending mint ("" when not known)
        token: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ingestion worker failed: {0}")]
    Worker(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReconcileError {
    pub fn transport(ledger: SourceLedger, context: impl Into<String>, reason: impl ToString) -> Self {
        ReconcileError::Transport {
            ledger,
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(ledger: SourceLedger, context: impl Into<String>, reason: impl ToString) -> Self {
        ReconcileError::Decode {
            ledger,
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(input: &str, reason: impl ToString) -> Self {
        ReconcileError::Parse {
            input: input.to_string(),
            reason: reason.to_string(),
            ledger: None,
            context: String::new(),
        }
    }

    /// Attach the ledger and location an amount was read from.
    /// Other variants already carry their context and pass through.
    pub fn located(self, at: SourceLedger, location: impl Into<String>) -> Self {
        match self {
            ReconcileError::Parse { input, reason, .. } => ReconcileError::Parse {
                input,
                reason,
                ledger: Some(at),
                context: location.into(),
            },
            other => other,
        }
    }
}

fn origin(ledger: &Option<SourceLedger>, context: &str) -> String {
    match ledger {
        Some(ledger) => format!(" on {} ({})", ledger, context),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_carry_context() {
        let err = ReconcileError::transport(SourceLedger::Tfta, "cursor 12345", "connection reset");
        let msg = err.to_string();
        assert!(msg.contains("TFTA"));
        assert!(msg.contains("cursor 12345"));
        assert!(msg.contains("connection reset"));

        let err = ReconcileError::OracleUnavailable {
            hash: "ab01".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(err.to_string().contains("ab01"));

        println!("✅ Error context test passed");
    }

    #[test]
    fn test_parse_error_location() {
        let bare = ReconcileError::parse("12,5", "integer part is not numeric");
        assert_eq!(
            bare.to_string(),
            "Could not parse amount \"12,5\": integer part is not numeric"
        );

        let located = bare.located(SourceLedger::Tfta, "operation 777 tx txh");
        let msg = located.to_string();
        assert!(msg.contains("TFTA"));
        assert!(msg.contains("777"));
        assert!(msg.contains("txh"));
        assert!(matches!(located, ReconcileError::Parse { ledger: Some(SourceLedger::Tfta), .. }));

        // Non-parse errors are left alone
        let err = ReconcileError::Config("x".to_string()).located(SourceLedger::Tft, "ignored");
        assert!(!err.to_string().contains("ignored"));
    }
}
