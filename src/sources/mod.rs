// Ledger Event Sources - explorer (UTXO chain) and Horizon (account ledger)

pub mod decoder;
pub mod explorer;
pub mod horizon;
pub mod ingest;

pub use decoder::{TxKind, TxVersionRegistry, MINT_TRANSACTION_VERSION};
pub use explorer::{extract_block, BlockEvents, BlockSource, ExplorerBlock, ExplorerClient};
pub use horizon::{fetch_account_history, AccountHistory, HorizonClient, OperationsSource, DEFAULT_PAGE_LIMIT};
pub use ingest::{ingest_rivine, IngestPlan, RivineHistory};
