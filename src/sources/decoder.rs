// 🧩 Transaction Version Registry - which tfchain transaction versions we understand
//
// Built once before ingestion and shared (Arc) with every explorer worker.
// A transaction with a version tag missing from the registry cannot be
// interpreted, which fails the pass instead of silently skipping it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version tag of coin creation (mint) transactions
pub const MINT_TRANSACTION_VERSION: u8 = 129;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    LegacyStandard,
    Standard,
    MinterDefinition,
    CoinCreation,
    BotRegistration,
    BotRecordUpdate,
    BotNameTransfer,
    Erc20Conversion,
    Erc20CoinCreation,
    Erc20AddressRegistration,
}

impl TxKind {
    /// Does this kind define token supply?
    pub fn is_mint(&self) -> bool {
        matches!(self, TxKind::CoinCreation)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TxVersionRegistry {
    kinds: HashMap<u8, TxKind>,
}

impl TxVersionRegistry {
    /// Empty registry; every version is unknown until registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard tfchain transaction versions
    pub fn standard() -> Self {
        let mut registry = TxVersionRegistry::new();
        registry.register(0, TxKind::LegacyStandard);
        registry.register(1, TxKind::Standard);
        registry.register(128, TxKind::MinterDefinition);
        registry.register(MINT_TRANSACTION_VERSION, TxKind::CoinCreation);
        registry.register(144, TxKind::BotRegistration);
        registry.register(145, TxKind::BotRecordUpdate);
        registry.register(146, TxKind::BotNameTransfer);
        registry.register(208, TxKind::Erc20Conversion);
        registry.register(209, TxKind::Erc20CoinCreation);
        registry.register(210, TxKind::Erc20AddressRegistration);
        registry
    }

    pub fn register(&mut self, version: u8, kind: TxKind) {
        self.kinds.insert(version, kind);
    }

    pub fn kind(&self, version: u8) -> Option<TxKind> {
        self.kinds.get(&version).copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry() {
        let registry = TxVersionRegistry::standard();
        assert_eq!(registry.kind(MINT_TRANSACTION_VERSION), Some(TxKind::CoinCreation));
        assert!(registry.kind(MINT_TRANSACTION_VERSION).unwrap().is_mint());
        assert!(!registry.kind(1).unwrap().is_mint());
        assert!(!registry.kind(128).unwrap().is_mint());
        assert_eq!(registry.kind(77), None);
    }

    #[test]
    fn test_empty_registry_knows_nothing() {
        let registry = TxVersionRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.kind(1), None);
    }
}
